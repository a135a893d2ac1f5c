//! Okamochi core - marketplace order lifecycle and settlement engine
//!
//! # Architecture
//!
//! Domain core for a three-sided delivery marketplace (customers,
//! restaurants, drivers). Transports stay outside this crate; everything
//! here is plain async Rust over a storage trait:
//!
//! - **Orders** (`orders`): creation, the status state machine, pickup PIN
//!   handoff, tracking views, and per-party stats
//! - **Pricing** (`pricing`): whole-yen quote maths and the three-way split
//! - **Coupons** (`coupons`): validation windows, usage caps, discounts
//! - **Settlement** (`settlement`): payout claims, transfers, refunds
//! - **Events** (`events`): routing from the order broadcast to the
//!   settlement worker and realtime subscribers
//! - **Payments** (`payments`): processor trait plus a mock for tests
//! - **Storage** (`storage`): guarded-write storage trait plus an in-memory
//!   implementation
//!
//! # Module structure
//!
//! ```text
//! okamochi-core/src/
//! ├── config.rs      # rates, timeouts, buffers
//! ├── models/        # restaurants, customers, drivers, menus, orders
//! ├── orders/        # lifecycle operations and read views
//! ├── pricing.rs     # quote computation
//! ├── coupons.rs     # coupon validation and discounts
//! ├── events.rs      # event router
//! ├── settlement/    # payout engine and worker
//! ├── payments/      # payment processor seam
//! ├── storage/       # storage trait + memory backend
//! ├── tasks.rs       # background task registry
//! └── engine.rs      # composition root
//! ```

pub mod config;
pub mod coupons;
pub mod engine;
pub mod events;
pub mod models;
pub mod orders;
pub mod payments;
pub mod pricing;
pub mod settlement;
pub mod storage;
pub mod tasks;

// Re-export public entry points
pub use config::Config;
pub use engine::Engine;
pub use events::{EventChannels, EventRouter};
pub use orders::OrderService;
pub use payments::{MockProcessor, PaymentProcessor};
pub use settlement::{SettlementEngine, SettlementWorker};
pub use storage::{MemoryStorage, Precondition, Storage};
pub use tasks::{BackgroundTasks, TaskKind};

// Re-export unified error and event types from shared
pub use shared::{AppError, AppResult, ErrorCategory, ErrorCode};
pub use shared::{ActorRole, OrderEvent, OrderEventType, OrderStatus, RealtimeEvent};
