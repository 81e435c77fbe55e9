use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use hrsaas_config::PushSettings;
use hrsaas_model::{
    ClientMessage, DisplayNotification, NotificationAction, PushSubscription, SubscriptionOptions,
};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::normalize::normalize_payload;
use super::windows::WindowRegistry;
use crate::api::NotificationApi;
use crate::background::best_effort;

/// Platform services the worker needs: system notifications, windows and
/// the push manager. Window discovery and messaging go through
/// [`WindowRegistry`] instead.
#[async_trait]
pub trait WorkerHost: Send + Sync + 'static {
    async fn show_notification(&self, notification: &DisplayNotification) -> anyhow::Result<()>;

    async fn close_notification(&self, tag: &str);

    async fn open_window(&self, url: &str) -> anyhow::Result<()>;

    /// Activate the new worker without waiting for the next page load.
    async fn skip_waiting(&self);

    /// Take control of already-open pages.
    async fn claim_clients(&self);

    async fn subscribe_push(&self, options: &SubscriptionOptions)
    -> anyhow::Result<PushSubscription>;
}

#[derive(Debug, Clone)]
pub enum WorkerEvent {
    Install,
    Activate,
    Push(Option<Vec<u8>>),
    NotificationClick {
        notification: DisplayNotification,
        action: Option<String>,
    },
    NotificationClose {
        notification: DisplayNotification,
    },
    PushSubscriptionChange {
        old: Option<PushSubscription>,
        new: Option<PushSubscription>,
    },
}

/// Background agent handling push delivery. Runs in its own task and talks
/// to application windows only through the [`WindowRegistry`].
pub struct PushWorker {
    host: Arc<dyn WorkerHost>,
    windows: WindowRegistry,
    api: Option<NotificationApi>,
    settings: PushSettings,
}

impl PushWorker {
    pub fn new(
        host: Arc<dyn WorkerHost>,
        windows: WindowRegistry,
        api: Option<NotificationApi>,
        settings: PushSettings,
    ) -> Self {
        Self {
            host,
            windows,
            api,
            settings,
        }
    }

    /// Processes events until every sender is dropped.
    pub async fn run(self, mut events: mpsc::Receiver<WorkerEvent>) {
        info!("Push worker started");
        while let Some(event) = events.recv().await {
            self.handle(event).await;
        }
        debug!("Push worker stopped");
    }

    pub async fn handle(&self, event: WorkerEvent) {
        match event {
            WorkerEvent::Install => {
                debug!("Push worker installed");
                self.host.skip_waiting().await;
            }
            WorkerEvent::Activate => {
                debug!("Push worker activated");
                self.host.claim_clients().await;
            }
            WorkerEvent::Push(data) => self.on_push(data.as_deref()).await,
            WorkerEvent::NotificationClick {
                notification,
                action,
            } => self.on_click(notification, action.as_deref()).await,
            WorkerEvent::NotificationClose { notification } => self.on_close(notification).await,
            WorkerEvent::PushSubscriptionChange { old, new } => {
                self.on_subscription_change(old, new).await
            }
        }
    }

    async fn on_push(&self, data: Option<&[u8]>) {
        let notification = normalize_payload(data, &self.settings);
        debug!(tag = %notification.tag, title = %notification.title, "Push received");
        if let Err(e) = self.host.show_notification(&notification).await {
            warn!(tag = %notification.tag, %e, "Failed to show push notification");
        }
    }

    async fn on_click(&self, notification: DisplayNotification, action: Option<&str>) {
        self.host.close_notification(&notification.tag).await;
        if action == Some(NotificationAction::CLOSE) {
            debug!(tag = %notification.tag, "Notification closed from action");
            return;
        }

        let url = notification.data.url;
        let message = ClientMessage::NotificationClick {
            url: url.clone(),
            notification_id: notification.data.id,
        };

        for window in self.windows.windows() {
            self.windows.focus(&window.id);
            if self.windows.post(&window.id, message.clone()) {
                debug!(window = %window.id, %url, "Routed notification click to open window");
                return;
            }
        }

        if let Err(e) = self.host.open_window(&url).await {
            warn!(%url, %e, "Failed to open window for notification click");
        }
    }

    async fn on_close(&self, notification: DisplayNotification) {
        let (Some(api), Some(id)) = (self.api.clone(), notification.data.id) else {
            return;
        };
        let task = best_effort("dismiss telemetry", async move {
            api.report_dismissed(&id).await
        });
        let _ = task.await;
    }

    async fn on_subscription_change(
        &self,
        old: Option<PushSubscription>,
        new: Option<PushSubscription>,
    ) {
        let subscription = match new {
            Some(subscription) => subscription,
            None => {
                let options = old
                    .as_ref()
                    .and_then(|s| s.options.clone())
                    .unwrap_or_else(|| self.default_options());
                match self.host.subscribe_push(&options).await {
                    Ok(subscription) => subscription,
                    Err(e) => {
                        warn!(%e, "Push resubscribe failed");
                        return;
                    }
                }
            }
        };
        info!(endpoint = %subscription.endpoint, "Push subscription renewed");

        let Some(api) = self.api.clone() else {
            return;
        };
        let old_endpoint = old.map(|s| s.endpoint);
        let task = best_effort("resubscribe report", async move {
            api.resubscribe(old_endpoint.as_deref(), &subscription).await
        });
        let _ = task.await;
    }

    fn default_options(&self) -> SubscriptionOptions {
        let application_server_key = self.settings.vapid_public_key.as_deref().and_then(|key| {
            match URL_SAFE_NO_PAD.decode(key.trim_end_matches('=')) {
                Ok(bytes) => Some(bytes),
                Err(e) => {
                    warn!(%e, "Configured VAPID key is not URL-safe base64");
                    None
                }
            }
        });
        SubscriptionOptions {
            user_visible_only: true,
            application_server_key,
        }
    }
}
