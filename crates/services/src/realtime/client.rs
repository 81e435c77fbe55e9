use futures::StreamExt;
use hrsaas_config::Settings;
use hrsaas_model::{ApprovalRequestEvent, ApprovalStatusEvent, AttendanceEvent, Notification};
use parking_lot::{Mutex, ReentrantMutex};
use reqwest::header::{ACCEPT, CACHE_CONTROL};
use std::sync::Arc;
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::events::{EventKind, RealtimeEvent, decode_frame};
use super::listeners::{ListenerId, ListenerRegistry, Subscription};
use super::sse::SseDecoder;
use crate::auth::TokenProvider;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Unexpected status: {0}")]
    Status(u16),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

struct Transport {
    generation: u64,
    task: JoinHandle<()>,
}

struct ClientState {
    status: ConnectionState,
    /// Set once the stream is open. Decides whether a teardown announces
    /// a `disconnect` event.
    connected: bool,
    transport: Option<Transport>,
    generation: u64,
}

struct Inner {
    http: reqwest::Client,
    subscribe_url: String,
    token_param: String,
    tokens: Arc<dyn TokenProvider>,
    state: Mutex<ClientState>,
    /// Held by the transport from its generation check through the emit,
    /// and by `disconnect` before it returns. Reentrant so a listener may
    /// disconnect from inside a callback.
    delivery: ReentrantMutex<()>,
    listeners: Arc<ListenerRegistry>,
}

/// Server-push client for the notification stream.
///
/// At most one transport is live at a time. There is no automatic
/// reconnection; callers re-invoke [`RealtimeClient::connect`] and reconcile
/// through a pull if they need to.
#[derive(Clone)]
pub struct RealtimeClient {
    inner: Arc<Inner>,
}

impl RealtimeClient {
    pub fn new(settings: &Settings, tokens: Arc<dyn TokenProvider>) -> Self {
        Self::with_url(
            settings.realtime.subscribe_url(&settings.api),
            settings.realtime.token_param.clone(),
            tokens,
        )
    }

    pub fn with_url(
        subscribe_url: impl Into<String>,
        token_param: impl Into<String>,
        tokens: Arc<dyn TokenProvider>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                http: reqwest::Client::new(),
                subscribe_url: subscribe_url.into(),
                token_param: token_param.into(),
                tokens,
                state: Mutex::new(ClientState {
                    status: ConnectionState::Disconnected,
                    connected: false,
                    transport: None,
                    generation: 0,
                }),
                delivery: ReentrantMutex::new(()),
                listeners: Arc::new(ListenerRegistry::default()),
            }),
        }
    }

    /// Opens the stream. Does nothing while a transport already exists or
    /// when no access token is available. Must be called inside a Tokio
    /// runtime.
    pub fn connect(&self) {
        let mut state = self.inner.state.lock();
        if state.transport.is_some() {
            debug!("Realtime transport already open");
            return;
        }
        let Some(token) = self.inner.tokens.access_token() else {
            warn!("Realtime connect skipped: no access token available");
            return;
        };

        state.generation += 1;
        let generation = state.generation;
        state.status = ConnectionState::Connecting;

        let inner = Arc::clone(&self.inner);
        let task = tokio::spawn(async move { inner.run_transport(generation, token).await });
        state.transport = Some(Transport { generation, task });
        info!(url = %self.inner.subscribe_url, generation, "Realtime connecting");
    }

    /// Tears the transport down. A `disconnect` event carrying `reason` is
    /// emitted only if the stream had been open. A frame already being
    /// dispatched completes before this returns; no frame is delivered
    /// afterwards.
    pub fn disconnect(&self, reason: &str) {
        let was_connected = {
            let mut state = self.inner.state.lock();
            let Some(transport) = state.transport.take() else {
                return;
            };
            transport.task.abort();
            state.status = ConnectionState::Disconnected;
            std::mem::replace(&mut state.connected, false)
        };
        let _delivery = self.inner.delivery.lock();

        info!(reason, "Realtime disconnected");
        if was_connected {
            self.inner
                .listeners
                .emit(&RealtimeEvent::Disconnect(reason.to_string()));
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.inner.state.lock().status
    }

    pub fn is_connected(&self) -> bool {
        self.inner.state.lock().connected
    }

    pub fn on<F>(&self, kind: EventKind, callback: F) -> Subscription
    where
        F: Fn(&RealtimeEvent) + Send + Sync + 'static,
    {
        let id = self.inner.listeners.register(kind, Arc::new(callback));
        Subscription::new(kind, id, &self.inner.listeners)
    }

    /// Removes one listener, or every listener of `kind` when `listener`
    /// is `None`.
    pub fn off(&self, kind: EventKind, listener: Option<ListenerId>) {
        match listener {
            Some(id) => self.inner.listeners.remove(kind, id),
            None => self.inner.listeners.remove_all(kind),
        }
    }

    pub fn listener_count(&self, kind: EventKind) -> usize {
        self.inner.listeners.count(kind)
    }

    /// Delivers a locally produced event to listeners as if it had arrived
    /// on the stream.
    pub fn dispatch(&self, event: &RealtimeEvent) {
        self.inner.listeners.emit(event);
    }

    pub fn on_connect<F>(&self, f: F) -> Subscription
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.on(EventKind::Connect, move |_| f())
    }

    pub fn on_disconnect<F>(&self, f: F) -> Subscription
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.on(EventKind::Disconnect, move |event| {
            if let RealtimeEvent::Disconnect(reason) = event {
                f(reason);
            }
        })
    }

    pub fn on_error<F>(&self, f: F) -> Subscription
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.on(EventKind::Error, move |event| {
            if let RealtimeEvent::Error(message) = event {
                f(message);
            }
        })
    }

    pub fn on_notification<F>(&self, f: F) -> Subscription
    where
        F: Fn(&Notification) + Send + Sync + 'static,
    {
        self.on(EventKind::NotificationNew, move |event| {
            if let RealtimeEvent::NotificationNew(notification) = event {
                f(notification);
            }
        })
    }

    pub fn on_notification_read<F>(&self, f: F) -> Subscription
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.on(EventKind::NotificationRead, move |event| {
            if let RealtimeEvent::NotificationRead(id) = event {
                f(id);
            }
        })
    }

    pub fn on_notification_count<F>(&self, f: F) -> Subscription
    where
        F: Fn(usize) + Send + Sync + 'static,
    {
        self.on(EventKind::NotificationCount, move |event| {
            if let RealtimeEvent::NotificationCount(count) = event {
                f(*count);
            }
        })
    }

    pub fn on_approval_status_changed<F>(&self, f: F) -> Subscription
    where
        F: Fn(&ApprovalStatusEvent) + Send + Sync + 'static,
    {
        self.on(EventKind::ApprovalStatusChanged, move |event| {
            if let RealtimeEvent::ApprovalStatusChanged(payload) = event {
                f(payload);
            }
        })
    }

    pub fn on_approval_new_request<F>(&self, f: F) -> Subscription
    where
        F: Fn(&ApprovalRequestEvent) + Send + Sync + 'static,
    {
        self.on(EventKind::ApprovalNewRequest, move |event| {
            if let RealtimeEvent::ApprovalNewRequest(payload) = event {
                f(payload);
            }
        })
    }

    /// Check-in and check-out share one callback; the flag is `true` for
    /// check-in.
    pub fn on_attendance<F>(&self, f: F) -> (Subscription, Subscription)
    where
        F: Fn(&AttendanceEvent, bool) + Send + Sync + 'static,
    {
        let f = Arc::new(f);
        let check_in = Arc::clone(&f);
        let a = self.on(EventKind::AttendanceCheckedIn, move |event| {
            if let RealtimeEvent::AttendanceCheckedIn(payload) = event {
                check_in(payload, true);
            }
        });
        let b = self.on(EventKind::AttendanceCheckedOut, move |event| {
            if let RealtimeEvent::AttendanceCheckedOut(payload) = event {
                f(payload, false);
            }
        });
        (a, b)
    }
}

impl Inner {
    async fn run_transport(self: Arc<Self>, generation: u64, token: String) {
        let response = match self.open(&token).await {
            Ok(response) => response,
            Err(e) => {
                self.fail(generation, e);
                return;
            }
        };

        {
            let _delivery = self.delivery.lock();
            if !self.mark_connected(generation) {
                return;
            }
            info!(generation, "Realtime connected");
            self.listeners.emit(&RealtimeEvent::Connect);
        }

        let mut decoder = SseDecoder::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let bytes = match chunk {
                Ok(bytes) => bytes,
                Err(e) => {
                    self.fail(generation, e.into());
                    return;
                }
            };
            for frame in decoder.feed(&bytes) {
                let _delivery = self.delivery.lock();
                if !self.is_current(generation) {
                    return;
                }
                debug!(event = %frame.event, "Realtime frame");
                if let Some(event) = decode_frame(&frame) {
                    self.listeners.emit(&event);
                }
            }
        }

        self.teardown(generation, "server closed stream");
    }

    async fn open(&self, token: &str) -> Result<reqwest::Response, TransportError> {
        let response = self
            .http
            .get(&self.subscribe_url)
            .query(&[(self.token_param.as_str(), token)])
            .header(ACCEPT, "text/event-stream")
            .header(CACHE_CONTROL, "no-cache")
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(TransportError::Status(response.status().as_u16()));
        }
        Ok(response)
    }

    fn is_current(&self, generation: u64) -> bool {
        self.state
            .lock()
            .transport
            .as_ref()
            .is_some_and(|t| t.generation == generation)
    }

    fn mark_connected(&self, generation: u64) -> bool {
        let mut state = self.state.lock();
        if !state.transport.as_ref().is_some_and(|t| t.generation == generation) {
            return false;
        }
        state.status = ConnectionState::Connected;
        state.connected = true;
        true
    }

    /// Reports a transport failure once, then tears down.
    fn fail(&self, generation: u64, error: TransportError) {
        let _delivery = self.delivery.lock();
        if !self.is_current(generation) {
            return;
        }
        warn!(generation, %error, "Realtime transport error");
        self.listeners.emit(&RealtimeEvent::Error(error.to_string()));
        self.teardown(generation, "transport error");
    }

    /// Called from the transport task itself, so the handle is dropped
    /// rather than aborted.
    fn teardown(&self, generation: u64, reason: &str) {
        let _delivery = self.delivery.lock();
        let was_connected = {
            let mut state = self.state.lock();
            if !state.transport.as_ref().is_some_and(|t| t.generation == generation) {
                return;
            }
            state.transport = None;
            state.status = ConnectionState::Disconnected;
            std::mem::replace(&mut state.connected, false)
        };

        info!(generation, reason, "Realtime transport closed");
        if was_connected {
            self.listeners
                .emit(&RealtimeEvent::Disconnect(reason.to_string()));
        }
    }
}
