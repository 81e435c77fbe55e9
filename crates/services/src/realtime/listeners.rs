use parking_lot::RwLock;
use std::collections::HashMap;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use tracing::error;

use super::events::{EventKind, RealtimeEvent};

pub type Callback = Arc<dyn Fn(&RealtimeEvent) + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Callbacks keyed by event kind, kept in registration order.
#[derive(Default)]
pub(crate) struct ListenerRegistry {
    next_id: AtomicU64,
    listeners: RwLock<HashMap<EventKind, Vec<(ListenerId, Callback)>>>,
}

impl ListenerRegistry {
    pub fn register(&self, kind: EventKind, callback: Callback) -> ListenerId {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.listeners
            .write()
            .entry(kind)
            .or_default()
            .push((id, callback));
        id
    }

    pub fn remove(&self, kind: EventKind, id: ListenerId) {
        let mut listeners = self.listeners.write();
        if let Some(entries) = listeners.get_mut(&kind) {
            entries.retain(|(entry_id, _)| *entry_id != id);
            if entries.is_empty() {
                listeners.remove(&kind);
            }
        }
    }

    pub fn remove_all(&self, kind: EventKind) {
        self.listeners.write().remove(&kind);
    }

    pub fn count(&self, kind: EventKind) -> usize {
        self.listeners.read().get(&kind).map_or(0, Vec::len)
    }

    /// Invokes every listener for the event's kind. The list is copied
    /// first so callbacks may register or unregister listeners. A panicking
    /// callback is logged and skipped.
    pub fn emit(&self, event: &RealtimeEvent) {
        let kind = event.kind();
        let callbacks: Vec<Callback> = self
            .listeners
            .read()
            .get(&kind)
            .map(|entries| entries.iter().map(|(_, cb)| Arc::clone(cb)).collect())
            .unwrap_or_default();

        for callback in callbacks {
            if let Err(panic) = catch_unwind(AssertUnwindSafe(|| callback(event))) {
                let message = panic
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| panic.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                error!(event = kind.as_str(), %message, "Realtime listener panicked");
            }
        }
    }
}

/// Handle returned by `RealtimeClient::on`. Dropping it keeps the listener
/// registered; call [`Subscription::unsubscribe`] to remove it.
pub struct Subscription {
    kind: EventKind,
    id: ListenerId,
    registry: Weak<ListenerRegistry>,
    active: AtomicBool,
}

impl Subscription {
    pub(crate) fn new(kind: EventKind, id: ListenerId, registry: &Arc<ListenerRegistry>) -> Self {
        Self {
            kind,
            id,
            registry: Arc::downgrade(registry),
            active: AtomicBool::new(true),
        }
    }

    pub fn id(&self) -> ListenerId {
        self.id
    }

    pub fn kind(&self) -> EventKind {
        self.kind
    }

    /// Removes exactly this listener. Further calls do nothing.
    pub fn unsubscribe(&self) {
        if !self.active.swap(false, Ordering::AcqRel) {
            return;
        }
        if let Some(registry) = self.registry.upgrade() {
            registry.remove(self.kind, self.id);
        }
    }
}
