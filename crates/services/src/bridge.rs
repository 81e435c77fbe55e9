use hrsaas_model::ClientMessage;
use parking_lot::Mutex;
use std::collections::HashSet;
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::api::{ApiResult, NotificationApi};
use crate::background::best_effort;
use crate::realtime::{RealtimeClient, Subscription};
use crate::store::NotificationStore;

/// Number of notifications pulled when the stream (re)opens.
pub const RECONCILE_PAGE_SIZE: u32 = 20;

/// Feeds realtime events into a [`NotificationStore`].
pub struct NotificationBridge {
    subscriptions: Mutex<Vec<Subscription>>,
}

impl NotificationBridge {
    /// Wires the client's notification events into `store`. With an API
    /// client, every `connect` also pulls the latest page and unread count
    /// so the store catches up on anything pushed while offline.
    pub fn attach(
        client: &RealtimeClient,
        store: NotificationStore,
        api: Option<NotificationApi>,
    ) -> Self {
        let mut subscriptions = Vec::with_capacity(4);

        let s = store.clone();
        subscriptions.push(client.on_notification(move |notification| {
            s.add(notification.clone());
        }));

        let s = store.clone();
        subscriptions.push(client.on_notification_read(move |id| s.mark_read(id)));

        let s = store.clone();
        subscriptions.push(client.on_notification_count(move |count| s.set_unread_count(count)));

        if let Some(api) = api {
            subscriptions.push(client.on_connect(move || {
                // Taken before the stream delivers its first frame.
                let known: HashSet<String> =
                    store.notifications().into_iter().map(|n| n.id).collect();
                let api = api.clone();
                let store = store.clone();
                best_effort("reconcile notifications", reconcile(api, store, known));
            }));
        }

        info!(listeners = subscriptions.len(), "Notification bridge attached");
        Self {
            subscriptions: Mutex::new(subscriptions),
        }
    }

    pub fn detach(&self) {
        let subscriptions = std::mem::take(&mut *self.subscriptions.lock());
        for subscription in &subscriptions {
            subscription.unsubscribe();
        }
        debug!(listeners = subscriptions.len(), "Notification bridge detached");
    }
}

impl Drop for NotificationBridge {
    fn drop(&mut self) {
        self.detach();
    }
}

async fn reconcile(
    api: NotificationApi,
    store: NotificationStore,
    known: HashSet<String>,
) -> ApiResult<()> {
    let page = api.list(0, RECONCILE_PAGE_SIZE).await?;
    store.merge_fetched(page.content, &known);

    let count = api.unread_count().await?;
    if count != store.unread_count() {
        debug!(count, derived = store.unread_count(), "Adopting server unread count");
        store.set_unread_count(count);
    }
    Ok(())
}

/// Drains messages the push worker posts to one window. A click marks the
/// notification read and hands its url to `navigate`. Returns when the
/// worker side drops the channel.
pub async fn route_client_messages<F>(
    mut messages: mpsc::UnboundedReceiver<ClientMessage>,
    store: NotificationStore,
    navigate: F,
) where
    F: Fn(&str),
{
    while let Some(message) = messages.recv().await {
        match message {
            ClientMessage::NotificationClick {
                url,
                notification_id,
            } => {
                if let Some(id) = notification_id {
                    store.mark_read(&id);
                }
                debug!(%url, "Navigating from notification click");
                navigate(&url);
            }
        }
    }
}
