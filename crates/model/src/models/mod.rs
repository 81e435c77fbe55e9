pub mod department;
pub mod envelope;
pub mod notification;
pub mod push;
pub mod realtime;

pub use department::DepartmentNode;
pub use envelope::{ApiResponse, Page};
pub use notification::{
    NewNotification, Notification, NotificationCategory, NotificationSettings, NotificationType,
};
pub use push::{
    ClientMessage, DisplayNotification, NotificationAction, NotificationData, PushPayload,
    PushRegistration, PushSubscription, PushSubscriptionKeys, SubscriptionOptions,
};
pub use realtime::{ApprovalRequestEvent, ApprovalStatusEvent, AttendanceEvent, NotificationFrame};
