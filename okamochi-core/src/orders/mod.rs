//! Order lifecycle and fulfilment
//!
//! This module owns the order from intake to handoff:
//!
//! - **lifecycle**: the transition table every status change is checked against
//! - **number**: business-day order numbering
//! - **pin**: pickup PIN generation
//! - **create**: intake (catalog snapshot, pricing, coupon redemption)
//! - **transitions**: actor-driven status changes and their side effects
//! - **queue**: delivery queue positions within a driver's batch
//! - **tracking**: customer tracking views and per-role listings
//!
//! # Write discipline
//!
//! Every status change goes through a guarded storage write (compare status,
//! then swap) and its event is published only after the write has committed.
//! Consumers therefore never observe an event for state that was rolled back.

mod create;
mod lifecycle;
mod number;
mod pin;
mod queue;
mod tracking;
mod transitions;

#[cfg(test)]
pub(crate) mod testutil;

pub use lifecycle::check_transition;
pub use number::{day_prefix, next_order_number};
pub use pin::generate_pickup_pin;
pub use queue::resolve_queue;

use crate::config::Config;
use crate::models::{Driver, Order, Restaurant};
use crate::storage::Storage;
use shared::error::{AppError, AppResult, ErrorCode};
use shared::order::{EventPayload, OrderEvent};
use std::sync::Arc;
use tokio::sync::broadcast;
use uuid::Uuid;

/// Order service: validates commands, applies them through guarded storage
/// writes, and publishes domain events for downstream consumers
pub struct OrderService {
    storage: Arc<dyn Storage>,
    config: Config,
    event_tx: broadcast::Sender<OrderEvent>,
}

impl std::fmt::Debug for OrderService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrderService")
            .field("storage", &"<dyn Storage>")
            .field("event_tx", &"<broadcast::Sender>")
            .finish()
    }
}

impl OrderService {
    pub fn new(storage: Arc<dyn Storage>, config: Config) -> Self {
        let (event_tx, _) = broadcast::channel(config.event_channel_capacity);
        Self {
            storage,
            config,
            event_tx,
        }
    }

    /// Subscribe to domain events
    pub fn subscribe(&self) -> broadcast::Receiver<OrderEvent> {
        self.event_tx.subscribe()
    }

    pub fn storage(&self) -> &Arc<dyn Storage> {
        &self.storage
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Publish a domain event; called only after the backing write committed
    pub(crate) fn emit(&self, payload: EventPayload) {
        let event = OrderEvent::new(payload);
        if let Err(err) = self.event_tx.send(event) {
            // send fails only when nobody is subscribed
            tracing::debug!(event_type = %err.0.event_type, "event dropped, no subscribers");
        }
    }

    // ── Scoped loads ────────────────────────────────────────────────
    //
    // Every accessor scopes the row to the calling party. A row that exists
    // but belongs to someone else reads as missing, so callers cannot learn
    // about other tenants' orders through error messages.

    pub(crate) async fn load_order(&self, order_id: Uuid) -> AppResult<Order> {
        self.storage
            .get_order(order_id)
            .await?
            .ok_or_else(|| AppError::new(ErrorCode::OrderNotFound))
    }

    pub(crate) async fn load_restaurant(&self, restaurant_id: Uuid) -> AppResult<Restaurant> {
        self.storage
            .get_restaurant(restaurant_id)
            .await?
            .ok_or_else(|| AppError::new(ErrorCode::RestaurantNotFound))
    }

    pub(crate) async fn load_driver(&self, driver_id: Uuid) -> AppResult<Driver> {
        self.storage
            .get_driver(driver_id)
            .await?
            .ok_or_else(|| AppError::new(ErrorCode::DriverNotFound))
    }

    /// Order scoped to the restaurant it was placed with
    pub(crate) async fn restaurant_order(
        &self,
        restaurant_id: Uuid,
        order_id: Uuid,
    ) -> AppResult<Order> {
        let order = self.load_order(order_id).await?;
        if order.restaurant_id != restaurant_id {
            return Err(AppError::new(ErrorCode::OrderNotFound));
        }
        Ok(order)
    }

    /// Order scoped to the customer who placed it
    pub(crate) async fn customer_order(
        &self,
        customer_id: Uuid,
        order_id: Uuid,
    ) -> AppResult<Order> {
        let order = self.load_order(order_id).await?;
        if order.customer_id != customer_id {
            return Err(AppError::new(ErrorCode::OrderNotFound));
        }
        Ok(order)
    }

    /// Order scoped to its assigned driver
    pub(crate) async fn driver_order(&self, driver_id: Uuid, order_id: Uuid) -> AppResult<Order> {
        let order = self.load_order(order_id).await?;
        if !order.is_assigned_to(driver_id) {
            return Err(AppError::new(ErrorCode::OrderNotFound));
        }
        Ok(order)
    }
}
