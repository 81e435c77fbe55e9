use serde::{Deserialize, Serialize};

use super::notification::{NewNotification, NotificationType};

/// Payload of a `notification` frame on the server-push stream. Every field
/// is optional and may be `null`. The server has sent both `message` and
/// `content` for the body and both `linkUrl` and `link` for the target;
/// `message` and `linkUrl` win when both are present.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationFrame {
    pub id: Option<String>,
    #[serde(rename = "type")]
    pub notification_type: Option<String>,
    pub title: Option<String>,
    pub message: Option<String>,
    pub content: Option<String>,
    pub link_url: Option<String>,
    pub link: Option<String>,
    pub is_read: Option<bool>,
    pub created_at: Option<String>,
    pub data: Option<serde_json::Value>,
}

impl From<NotificationFrame> for NewNotification {
    fn from(frame: NotificationFrame) -> Self {
        Self {
            id: frame.id,
            notification_type: frame
                .notification_type
                .map(NotificationType::from)
                .unwrap_or_default(),
            title: frame.title.unwrap_or_default(),
            content: frame.message.or(frame.content).unwrap_or_default(),
            is_read: frame.is_read,
            link_url: frame.link_url.or(frame.link),
            created_at: frame.created_at,
            data: frame.data,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApprovalStatusEvent {
    pub approval_id: String,
    pub document_number: String,
    pub title: String,
    pub status: String,
    pub approver_name: String,
    pub processed_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApprovalRequestEvent {
    pub approval_id: String,
    pub document_number: String,
    pub title: String,
    pub requester_name: String,
    #[serde(rename = "type")]
    pub request_type: String,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceEvent {
    pub employee_id: String,
    pub employee_name: String,
    pub time: String,
    pub date: String,
}
