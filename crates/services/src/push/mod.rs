pub mod normalize;
pub mod windows;
pub mod worker;

pub use normalize::normalize_payload;
pub use windows::{WindowId, WindowInfo, WindowRegistry};
pub use worker::{PushWorker, WorkerEvent, WorkerHost};
