pub mod client;
pub mod events;
pub mod listeners;
pub mod sse;

pub use client::{ConnectionState, RealtimeClient, TransportError};
pub use events::{EventKind, RealtimeEvent};
pub use listeners::{ListenerId, Subscription};
