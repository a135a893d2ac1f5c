//! Shared types for the Okamochi marketplace
//!
//! Common types used across crates: error codes and categories, order
//! status and event types, money helpers, and client-facing view payloads.

pub mod error;
pub mod money;
pub mod order;
pub mod util;
pub mod view;

// Re-exports
pub use http;
pub use serde::{Deserialize, Serialize};

// Error re-exports (for convenient access)
pub use error::{AppError, AppResult, ErrorCategory, ErrorCode};

// Order re-exports (event fan-out and status checks)
pub use order::{ActorRole, EventPayload, OrderEvent, OrderEventType, OrderStatus, RealtimeEvent};
