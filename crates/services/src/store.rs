use hrsaas_model::{NewNotification, Notification};
use parking_lot::RwLock;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::debug;

/// Which source the unread counter currently follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CountMode {
    /// Counter equals the number of unread items in the list.
    #[default]
    Derived,
    /// Counter was set from outside the list (count endpoint, push bump) and
    /// may disagree with it until the next `replace_all`, `merge_fetched` or
    /// `clear`.
    Overridden,
}

/// Published after every mutation that changed something.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StoreSummary {
    pub unread_count: usize,
    pub total: usize,
    pub mode: CountMode,
}

#[derive(Default)]
struct StoreState {
    /// Most recent first.
    items: Vec<Notification>,
    unread_count: usize,
    mode: CountMode,
}

impl StoreState {
    fn summary(&self) -> StoreSummary {
        StoreSummary {
            unread_count: self.unread_count,
            total: self.items.len(),
            mode: self.mode,
        }
    }

    fn remove_at(&mut self, index: usize) -> Notification {
        let removed = self.items.remove(index);
        if !removed.is_read {
            self.unread_count = self.unread_count.saturating_sub(1);
        }
        removed
    }
}

/// In-memory notification list plus unread counter.
///
/// Cheap to clone; all clones share one state. Every operation is total:
/// unknown ids are no-ops and nothing returns an error.
#[derive(Clone)]
pub struct NotificationStore {
    state: Arc<RwLock<StoreState>>,
    changes: Arc<watch::Sender<StoreSummary>>,
}

impl NotificationStore {
    pub fn new() -> Self {
        let (changes, _) = watch::channel(StoreSummary::default());
        Self {
            state: Arc::new(RwLock::new(StoreState::default())),
            changes: Arc::new(changes),
        }
    }

    /// Prepends a notification. A missing id, read flag or timestamp is
    /// filled in. If the id is already present the older entry is dropped
    /// first so ids stay unique.
    pub fn add(&self, notification: impl Into<NewNotification>) -> Notification {
        let notification = notification.into().into_notification();
        self.mutate(|state| {
            if let Some(index) = state.items.iter().position(|n| n.id == notification.id) {
                debug!(id = %notification.id, "Replacing notification with duplicate id");
                state.remove_at(index);
            }
            if !notification.is_read {
                state.unread_count += 1;
            }
            state.items.insert(0, notification.clone());
            true
        });
        notification
    }

    pub fn mark_read(&self, id: &str) {
        self.mutate(|state| {
            let Some(item) = state.items.iter_mut().find(|n| n.id == id) else {
                return false;
            };
            if item.is_read {
                return false;
            }
            item.is_read = true;
            state.unread_count = state.unread_count.saturating_sub(1);
            true
        });
    }

    pub fn mark_all_read(&self) {
        self.mutate(|state| {
            let changed = state.unread_count != 0 || state.items.iter().any(|n| !n.is_read);
            for item in state.items.iter_mut() {
                item.is_read = true;
            }
            state.unread_count = 0;
            changed
        });
    }

    pub fn remove(&self, id: &str) {
        self.mutate(|state| match state.items.iter().position(|n| n.id == id) {
            Some(index) => {
                state.remove_at(index);
                true
            }
            None => false,
        });
    }

    pub fn clear(&self) {
        self.mutate(|state| {
            *state = StoreState::default();
            true
        });
    }

    /// Replaces the whole list and recounts unread items from it. The
    /// counter is list-derived again afterwards.
    pub fn replace_all(&self, notifications: Vec<Notification>) {
        self.mutate(|state| {
            state.unread_count = notifications.iter().filter(|n| !n.is_read).count();
            state.items = notifications;
            state.mode = CountMode::Derived;
            true
        });
    }

    /// Like [`replace_all`](Self::replace_all), but items whose ids are
    /// neither in `known` (the ids held when the fetch started) nor in
    /// `fetched` arrived while the fetch was in flight. They are kept ahead
    /// of the fetched page.
    pub fn merge_fetched(&self, fetched: Vec<Notification>, known: &HashSet<String>) {
        self.mutate(|state| {
            let fetched_ids: HashSet<&str> = fetched.iter().map(|n| n.id.as_str()).collect();
            let mut items: Vec<Notification> = state
                .items
                .iter()
                .filter(|n| !known.contains(&n.id) && !fetched_ids.contains(n.id.as_str()))
                .cloned()
                .collect();
            if !items.is_empty() {
                debug!(kept = items.len(), "Keeping notifications that arrived during fetch");
            }
            items.extend(fetched);
            state.unread_count = items.iter().filter(|n| !n.is_read).count();
            state.items = items;
            state.mode = CountMode::Derived;
            true
        });
    }

    /// Overrides the counter without touching the list.
    pub fn set_unread_count(&self, count: usize) {
        self.mutate(|state| {
            let changed = state.unread_count != count || state.mode != CountMode::Overridden;
            state.unread_count = count;
            state.mode = CountMode::Overridden;
            changed
        });
    }

    /// Bumps the counter for an item the list does not hold yet.
    pub fn increment_unread_count(&self) {
        self.mutate(|state| {
            state.unread_count += 1;
            state.mode = CountMode::Overridden;
            true
        });
    }

    pub fn unread_count(&self) -> usize {
        self.state.read().unread_count
    }

    pub fn count_mode(&self) -> CountMode {
        self.state.read().mode
    }

    pub fn summary(&self) -> StoreSummary {
        self.state.read().summary()
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.state.read().items.clone()
    }

    /// The first `limit` notifications, most recent first.
    pub fn recent(&self, limit: usize) -> Vec<Notification> {
        self.state.read().items.iter().take(limit).cloned().collect()
    }

    pub fn get(&self, id: &str) -> Option<Notification> {
        self.state.read().items.iter().find(|n| n.id == id).cloned()
    }

    pub fn len(&self) -> usize {
        self.state.read().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.read().items.is_empty()
    }

    /// Receives a summary after every effective mutation.
    pub fn subscribe(&self) -> watch::Receiver<StoreSummary> {
        self.changes.subscribe()
    }

    fn mutate(&self, f: impl FnOnce(&mut StoreState) -> bool) {
        let summary = {
            let mut state = self.state.write();
            if !f(&mut state) {
                return;
            }
            state.summary()
        };
        self.changes.send_replace(summary);
    }
}

impl Default for NotificationStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Text for the bell badge: nothing at zero, capped at "99+".
pub fn badge_label(count: usize) -> Option<String> {
    match count {
        0 => None,
        1..=99 => Some(count.to_string()),
        _ => Some("99+".to_string()),
    }
}
