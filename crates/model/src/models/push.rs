use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Push payload as the server defines it. Every field is optional and
/// consumed defensively.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PushPayload {
    pub title: Option<String>,
    pub body: Option<String>,
    pub message: Option<String>,
    pub icon: Option<String>,
    pub badge: Option<String>,
    pub tag: Option<String>,
    pub id: Option<String>,
    pub link: Option<String>,
    pub url: Option<String>,
    #[serde(rename = "type")]
    pub notification_type: Option<String>,
}

impl PushPayload {
    /// Lenient extraction from an arbitrary JSON value. Strings are taken
    /// as-is, numbers and booleans are stringified, anything else is treated
    /// as absent. Returns `None` when the value is not an object.
    pub fn from_json(value: &Value) -> Option<Self> {
        let obj = value.as_object()?;
        let field = |key: &str| -> Option<String> {
            match obj.get(key)? {
                Value::String(s) => Some(s.clone()),
                Value::Number(n) => Some(n.to_string()),
                Value::Bool(b) => Some(b.to_string()),
                _ => None,
            }
        };

        Some(Self {
            title: field("title"),
            body: field("body"),
            message: field("message"),
            icon: field("icon"),
            badge: field("badge"),
            tag: field("tag"),
            id: field("id"),
            link: field("link"),
            url: field("url"),
            notification_type: field("type"),
        })
    }
}

/// What the worker asks the platform to display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayNotification {
    pub title: String,
    pub body: String,
    pub icon: String,
    pub badge: String,
    pub tag: String,
    pub data: NotificationData,
    pub actions: Vec<NotificationAction>,
    /// Keep the notification on screen until the user dismisses it.
    pub require_interaction: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationData {
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationAction {
    pub action: String,
    pub title: String,
}

impl NotificationAction {
    pub const OPEN: &'static str = "open";
    pub const CLOSE: &'static str = "close";

    pub fn new(action: &str, title: &str) -> Self {
        Self {
            action: action.to_string(),
            title: title.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PushSubscription {
    pub endpoint: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiration_time: Option<i64>,
    pub keys: PushSubscriptionKeys,
    /// Options the subscription was created with, when the platform
    /// reports them. Not part of the wire format.
    #[serde(skip)]
    pub options: Option<SubscriptionOptions>,
}

/// Backend acknowledgement of a push registration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PushRegistration {
    pub subscription_id: String,
    pub endpoint: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PushSubscriptionKeys {
    pub p256dh: String,
    pub auth: String,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SubscriptionOptions {
    pub user_visible_only: bool,
    pub application_server_key: Option<Vec<u8>>,
}

/// Messages the push worker posts to open application windows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClientMessage {
    #[serde(rename_all = "camelCase")]
    NotificationClick {
        url: String,
        notification_id: Option<String>,
    },
}
