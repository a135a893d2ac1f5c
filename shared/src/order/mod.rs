//! Order status, actor, and event contracts

mod event;
mod status;

pub use event::{EventPayload, OrderEvent, OrderEventType, RealtimeEvent};
pub use status::{ActorRole, OrderStatus};
