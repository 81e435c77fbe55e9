use hrsaas_model::{
    ApprovalRequestEvent, ApprovalStatusEvent, AttendanceEvent, NewNotification, Notification,
    NotificationFrame,
};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use super::sse::SseFrame;

/// Everything the realtime client can deliver to listeners.
#[derive(Debug, Clone, PartialEq)]
pub enum RealtimeEvent {
    Connect,
    Disconnect(String),
    Error(String),
    NotificationNew(Notification),
    NotificationRead(String),
    NotificationCount(usize),
    ApprovalStatusChanged(ApprovalStatusEvent),
    ApprovalNewRequest(ApprovalRequestEvent),
    AttendanceCheckedIn(AttendanceEvent),
    AttendanceCheckedOut(AttendanceEvent),
}

/// Tag of a [`RealtimeEvent`], used as the registration key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Connect,
    Disconnect,
    Error,
    NotificationNew,
    NotificationRead,
    NotificationCount,
    ApprovalStatusChanged,
    ApprovalNewRequest,
    AttendanceCheckedIn,
    AttendanceCheckedOut,
}

impl RealtimeEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            Self::Connect => EventKind::Connect,
            Self::Disconnect(_) => EventKind::Disconnect,
            Self::Error(_) => EventKind::Error,
            Self::NotificationNew(_) => EventKind::NotificationNew,
            Self::NotificationRead(_) => EventKind::NotificationRead,
            Self::NotificationCount(_) => EventKind::NotificationCount,
            Self::ApprovalStatusChanged(_) => EventKind::ApprovalStatusChanged,
            Self::ApprovalNewRequest(_) => EventKind::ApprovalNewRequest,
            Self::AttendanceCheckedIn(_) => EventKind::AttendanceCheckedIn,
            Self::AttendanceCheckedOut(_) => EventKind::AttendanceCheckedOut,
        }
    }
}

impl EventKind {
    /// Name of the event on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Connect => "connect",
            Self::Disconnect => "disconnect",
            Self::Error => "error",
            Self::NotificationNew => "notification:new",
            Self::NotificationRead => "notification:read",
            Self::NotificationCount => "notification:count",
            Self::ApprovalStatusChanged => "approval:status_changed",
            Self::ApprovalNewRequest => "approval:new_request",
            Self::AttendanceCheckedIn => "attendance:checked_in",
            Self::AttendanceCheckedOut => "attendance:checked_out",
        }
    }
}

/// Maps a decoded frame to a typed event. Unknown names and payloads that
/// fail to decode yield `None`; the caller drops them.
pub fn decode_frame(frame: &SseFrame) -> Option<RealtimeEvent> {
    let event = match frame.event.as_str() {
        "notification" | "notification:new" => {
            let payload: NotificationFrame = parse(frame)?;
            RealtimeEvent::NotificationNew(NewNotification::from(payload).into_notification())
        }
        "notification:read" => RealtimeEvent::NotificationRead(parse_id(frame)?),
        "notification:count" => RealtimeEvent::NotificationCount(parse_count(frame)?),
        "approval:status_changed" => RealtimeEvent::ApprovalStatusChanged(parse(frame)?),
        "approval:new_request" => RealtimeEvent::ApprovalNewRequest(parse(frame)?),
        "attendance:checked_in" => RealtimeEvent::AttendanceCheckedIn(parse(frame)?),
        "attendance:checked_out" => RealtimeEvent::AttendanceCheckedOut(parse(frame)?),
        other => {
            debug!(event = other, "Ignoring unknown realtime event");
            return None;
        }
    };
    Some(event)
}

fn parse<T: DeserializeOwned>(frame: &SseFrame) -> Option<T> {
    match serde_json::from_str(&frame.data) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(event = %frame.event, %e, "Dropping malformed realtime frame");
            None
        }
    }
}

/// `notification:read` carries either a bare id (JSON string or raw text)
/// or an object with an `id` field.
fn parse_id(frame: &SseFrame) -> Option<String> {
    match serde_json::from_str::<serde_json::Value>(&frame.data) {
        Ok(serde_json::Value::String(id)) => Some(id),
        Ok(serde_json::Value::Object(obj)) => obj
            .get("id")
            .or_else(|| obj.get("notificationId"))
            .and_then(|v| v.as_str())
            .map(str::to_string),
        Ok(_) => None,
        Err(_) => {
            let raw = frame.data.trim();
            (!raw.is_empty()).then(|| raw.to_string())
        }
    }
}

/// `notification:count` carries a bare number or `{ "count": n }`.
fn parse_count(frame: &SseFrame) -> Option<usize> {
    let value: serde_json::Value = parse(frame)?;
    let count = match &value {
        serde_json::Value::Object(obj) => obj.get("count").and_then(|v| v.as_u64()),
        other => other.as_u64(),
    };
    if count.is_none() {
        warn!(data = %frame.data, "Dropping notification count frame without a count");
    }
    count.map(|c| c as usize)
}
