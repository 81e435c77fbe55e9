use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: String,
    #[serde(rename = "type", default)]
    pub notification_type: NotificationType,
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub is_read: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link_url: Option<String>,
    pub created_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

/// A notification as handed to the store, before `id`, `isRead` and
/// `createdAt` are filled in.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewNotification {
    pub id: Option<String>,
    #[serde(rename = "type", default)]
    pub notification_type: NotificationType,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    pub is_read: Option<bool>,
    pub link_url: Option<String>,
    pub created_at: Option<String>,
    pub data: Option<serde_json::Value>,
}

/// Per-user delivery preferences: channels first, then categories.
/// Missing keys decode as enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationSettings {
    pub email: bool,
    pub push: bool,
    pub approval: bool,
    pub attendance: bool,
    pub system: bool,
    pub announcement: bool,
    pub leave: bool,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            email: true,
            push: true,
            approval: true,
            attendance: true,
            system: true,
            announcement: true,
            leave: true,
        }
    }
}

/// Closed set of notification kinds. Anything the server sends outside
/// this set decodes to `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum NotificationType {
    ApprovalRequested,
    ApprovalApproved,
    ApprovalRejected,
    LeaveRequested,
    LeaveApproved,
    LeaveRejected,
    EmployeeJoined,
    EmployeeResigned,
    System,
    Announcement,
    #[default]
    Other,
}

/// Coarse grouping used to pick an icon in bell and list views.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationCategory {
    Approval,
    Leave,
    Employee,
    System,
    Announcement,
    Other,
}

impl NotificationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ApprovalRequested => "APPROVAL_REQUESTED",
            Self::ApprovalApproved => "APPROVAL_APPROVED",
            Self::ApprovalRejected => "APPROVAL_REJECTED",
            Self::LeaveRequested => "LEAVE_REQUESTED",
            Self::LeaveApproved => "LEAVE_APPROVED",
            Self::LeaveRejected => "LEAVE_REJECTED",
            Self::EmployeeJoined => "EMPLOYEE_JOINED",
            Self::EmployeeResigned => "EMPLOYEE_RESIGNED",
            Self::System => "SYSTEM",
            Self::Announcement => "ANNOUNCEMENT",
            Self::Other => "OTHER",
        }
    }

    pub fn category(&self) -> NotificationCategory {
        match self {
            Self::ApprovalRequested | Self::ApprovalApproved | Self::ApprovalRejected => {
                NotificationCategory::Approval
            }
            Self::LeaveRequested | Self::LeaveApproved | Self::LeaveRejected => {
                NotificationCategory::Leave
            }
            Self::EmployeeJoined | Self::EmployeeResigned => NotificationCategory::Employee,
            Self::System => NotificationCategory::System,
            Self::Announcement => NotificationCategory::Announcement,
            Self::Other => NotificationCategory::Other,
        }
    }
}

impl From<&str> for NotificationType {
    fn from(value: &str) -> Self {
        match value {
            "APPROVAL_REQUESTED" => Self::ApprovalRequested,
            "APPROVAL_APPROVED" => Self::ApprovalApproved,
            "APPROVAL_REJECTED" => Self::ApprovalRejected,
            "LEAVE_REQUESTED" => Self::LeaveRequested,
            "LEAVE_APPROVED" => Self::LeaveApproved,
            "LEAVE_REJECTED" => Self::LeaveRejected,
            "EMPLOYEE_JOINED" => Self::EmployeeJoined,
            "EMPLOYEE_RESIGNED" => Self::EmployeeResigned,
            "SYSTEM" => Self::System,
            "ANNOUNCEMENT" => Self::Announcement,
            _ => Self::Other,
        }
    }
}

impl From<String> for NotificationType {
    fn from(value: String) -> Self {
        Self::from(value.as_str())
    }
}

impl From<NotificationType> for String {
    fn from(value: NotificationType) -> Self {
        value.as_str().to_string()
    }
}

impl NewNotification {
    pub fn new(
        notification_type: NotificationType,
        title: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            notification_type,
            title: title.into(),
            content: content.into(),
            ..Default::default()
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_link(mut self, link_url: impl Into<String>) -> Self {
        self.link_url = Some(link_url.into());
        self
    }

    pub fn read(mut self, is_read: bool) -> Self {
        self.is_read = Some(is_read);
        self
    }

    /// Fills in the missing fields: a fresh v4 id, unread, and the
    /// current time as an RFC 3339 UTC timestamp.
    pub fn into_notification(self) -> Notification {
        Notification {
            id: self
                .id
                .unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
            notification_type: self.notification_type,
            title: self.title,
            content: self.content,
            is_read: self.is_read.unwrap_or(false),
            link_url: self.link_url,
            created_at: self
                .created_at
                .unwrap_or_else(|| Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)),
            data: self.data,
        }
    }
}

impl From<Notification> for NewNotification {
    fn from(n: Notification) -> Self {
        Self {
            id: Some(n.id),
            notification_type: n.notification_type,
            title: n.title,
            content: n.content,
            is_read: Some(n.is_read),
            link_url: n.link_url,
            created_at: Some(n.created_at),
            data: n.data,
        }
    }
}
