//! Payout settlement
//!
//! Settlement runs strictly after fulfilment: the worker consumes terminal
//! events from the router and the engine moves the money. A delivery is
//! never blocked or reversed by a payout problem; failed legs are logged and
//! left for manual reconciliation.
//!
//! - **engine**: claim-then-transfer settlement and cancellation unwinding
//! - **worker**: the channel consumer driving the engine

mod engine;
mod worker;

pub use engine::SettlementEngine;
pub use worker::SettlementWorker;
