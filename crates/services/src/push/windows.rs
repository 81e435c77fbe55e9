use dashmap::DashMap;
use hrsaas_model::ClientMessage;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::mpsc;
use tracing::debug;
use uuid::Uuid;

pub type WindowId = Uuid;

struct WindowEntry {
    url: String,
    opened_seq: u64,
    focused: bool,
    sender: mpsc::UnboundedSender<ClientMessage>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowInfo {
    pub id: WindowId,
    pub url: String,
    pub focused: bool,
}

/// Open application windows of this origin, as seen by the push worker.
///
/// Each window owns the receiving end of its channel; the worker only ever
/// reaches a window by posting a [`ClientMessage`].
#[derive(Clone, Default)]
pub struct WindowRegistry {
    windows: Arc<DashMap<WindowId, WindowEntry>>,
    seq: Arc<AtomicU64>,
}

impl WindowRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        &self,
        url: impl Into<String>,
    ) -> (WindowId, mpsc::UnboundedReceiver<ClientMessage>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        let id = Uuid::new_v4();
        self.windows.insert(
            id,
            WindowEntry {
                url: url.into(),
                opened_seq: self.seq.fetch_add(1, Ordering::Relaxed),
                focused: false,
                sender,
            },
        );
        (id, receiver)
    }

    pub fn unregister(&self, id: &WindowId) {
        self.windows.remove(id);
    }

    pub fn set_url(&self, id: &WindowId, url: impl Into<String>) {
        if let Some(mut entry) = self.windows.get_mut(id) {
            entry.url = url.into();
        }
    }

    /// Live windows in the order they were opened. Windows whose receiver
    /// was dropped are pruned first.
    pub fn windows(&self) -> Vec<WindowInfo> {
        self.windows.retain(|_, entry| !entry.sender.is_closed());
        let mut entries: Vec<(u64, WindowInfo)> = self
            .windows
            .iter()
            .map(|r| {
                (
                    r.opened_seq,
                    WindowInfo {
                        id: *r.key(),
                        url: r.url.clone(),
                        focused: r.focused,
                    },
                )
            })
            .collect();
        entries.sort_by_key(|(seq, _)| *seq);
        entries.into_iter().map(|(_, info)| info).collect()
    }

    /// Marks `id` as the focused window. Returns false if it is gone.
    pub fn focus(&self, id: &WindowId) -> bool {
        if !self.windows.contains_key(id) {
            return false;
        }
        for mut entry in self.windows.iter_mut() {
            entry.focused = entry.key() == id;
        }
        true
    }

    pub fn post(&self, id: &WindowId, message: ClientMessage) -> bool {
        let delivered = self
            .windows
            .get(id)
            .map(|entry| entry.sender.send(message).is_ok())
            .unwrap_or(false);
        if !delivered {
            debug!(window = %id, "Window gone, dropping message");
            self.windows.remove(id);
        }
        delivered
    }

    pub fn len(&self) -> usize {
        self.windows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }
}
