pub mod api;
pub mod auth;
pub mod background;
pub mod bridge;
pub mod org_tree;
pub mod push;
pub mod realtime;
pub mod store;

pub use api::{ApiError, ApiResult, NotificationApi};
pub use auth::{StaticToken, TokenProvider};
pub use background::best_effort;
pub use bridge::{NotificationBridge, route_client_messages};
pub use org_tree::{count_nodes, filter_tree, find_department};
pub use push::{PushWorker, WindowRegistry, WorkerEvent, WorkerHost, normalize_payload};
pub use realtime::{ConnectionState, EventKind, RealtimeClient, RealtimeEvent, Subscription};
pub use store::{CountMode, NotificationStore, StoreSummary, badge_label};
