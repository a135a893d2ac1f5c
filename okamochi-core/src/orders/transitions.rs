//! Actor-driven status transitions
//!
//! Each method loads the order scoped to the calling party, checks the
//! transition table, applies side effects to the in-memory row, and commits
//! through a guarded storage write. Events go out only after the commit.

use super::lifecycle::check_transition;
use super::{pin, OrderService};
use crate::models::{Driver, Order};
use crate::storage::Precondition;
use chrono::Utc;
use shared::error::{AppError, AppResult, ErrorCode};
use shared::order::{ActorRole, EventPayload, OrderStatus};
use shared::view::GeoPoint;
use uuid::Uuid;

/// Error for a guarded write that lost to a concurrent writer
fn stale_error(precondition: Precondition) -> AppError {
    match precondition {
        Precondition::StatusIsAndUnassigned(_) => AppError::new(ErrorCode::OrderAlreadyAssigned),
        Precondition::StatusIsAndNoOtherDelivering(_) => {
            AppError::new(ErrorCode::DeliveryInProgress)
        }
        Precondition::StatusIs(expected) => AppError::with_message(
            ErrorCode::InvalidTransition,
            format!("order is no longer {expected}"),
        ),
        Precondition::None => AppError::internal("unconditional update reported a failed guard"),
    }
}

impl OrderService {
    /// Guarded write plus the STATUS_CHANGED event
    async fn commit_transition(
        &self,
        order: &Order,
        from: OrderStatus,
        actor: ActorRole,
        precondition: Precondition,
    ) -> AppResult<()> {
        let updated = self.storage.update_order(order, precondition).await?;
        if !updated {
            return Err(stale_error(precondition));
        }
        tracing::info!(
            order_id = %order.id,
            order_number = %order.order_number,
            from = %from,
            to = %order.status,
            actor = %actor,
            "order status changed"
        );
        self.emit(EventPayload::StatusChanged {
            order_id: order.id,
            order_number: order.order_number.clone(),
            from,
            to: order.status,
            actor,
            driver_id: order.driver_id,
        });
        Ok(())
    }

    // ── Restaurant ──────────────────────────────────────────────────

    /// Restaurant commits to fulfil a pending order
    ///
    /// Requires the restaurant to be payable; an order accepted by a
    /// restaurant that cannot receive its payout would strand the money at
    /// settlement time.
    pub async fn accept_order(&self, restaurant_id: Uuid, order_id: Uuid) -> AppResult<Order> {
        let mut order = self.restaurant_order(restaurant_id, order_id).await?;
        check_transition(order.status, OrderStatus::Accepted, ActorRole::Restaurant)?;

        let restaurant = self.load_restaurant(restaurant_id).await?;
        if !restaurant.payouts_enabled {
            return Err(AppError::new(ErrorCode::PayoutAccountMissing)
                .with_detail("restaurant_id", restaurant_id.to_string()));
        }

        let from = order.status;
        order.status = OrderStatus::Accepted;
        order.accepted_at = Some(Utc::now());
        self.commit_transition(&order, from, ActorRole::Restaurant, Precondition::StatusIs(from))
            .await?;
        Ok(order)
    }

    /// Restaurant declines a pending order; the reason replaces the
    /// special instructions so the customer sees why
    pub async fn reject_order(
        &self,
        restaurant_id: Uuid,
        order_id: Uuid,
        reason: String,
    ) -> AppResult<Order> {
        let mut order = self.restaurant_order(restaurant_id, order_id).await?;
        check_transition(order.status, OrderStatus::Cancelled, ActorRole::Restaurant)?;

        let from = order.status;
        order.status = OrderStatus::Cancelled;
        order.cancelled_by = Some(ActorRole::Restaurant);
        order.cancelled_at = Some(Utc::now());
        order.special_instructions = Some(reason);
        self.commit_transition(&order, from, ActorRole::Restaurant, Precondition::StatusIs(from))
            .await?;
        self.emit(EventPayload::OrderCancelled {
            order_id: order.id,
            cancelled_by: ActorRole::Restaurant,
        });
        Ok(order)
    }

    /// Kitchen starts working on an accepted order
    pub async fn start_preparing(&self, restaurant_id: Uuid, order_id: Uuid) -> AppResult<Order> {
        let mut order = self.restaurant_order(restaurant_id, order_id).await?;
        check_transition(order.status, OrderStatus::Preparing, ActorRole::Restaurant)?;

        let from = order.status;
        order.status = OrderStatus::Preparing;
        self.commit_transition(&order, from, ActorRole::Restaurant, Precondition::StatusIs(from))
            .await?;
        Ok(order)
    }

    /// Order is packed and waiting for a driver; mints the pickup PIN
    pub async fn mark_ready(&self, restaurant_id: Uuid, order_id: Uuid) -> AppResult<Order> {
        let mut order = self.restaurant_order(restaurant_id, order_id).await?;
        check_transition(order.status, OrderStatus::Ready, ActorRole::Restaurant)?;

        let from = order.status;
        order.status = OrderStatus::Ready;
        order.ready_at = Some(Utc::now());
        if order.pickup_pin.is_none() {
            order.pickup_pin = Some(pin::generate_pickup_pin());
        }
        self.commit_transition(&order, from, ActorRole::Restaurant, Precondition::StatusIs(from))
            .await?;
        Ok(order)
    }

    // ── Customer ────────────────────────────────────────────────────

    /// Customer cancels an order that the restaurant has not yet accepted
    pub async fn cancel_order(&self, customer_id: Uuid, order_id: Uuid) -> AppResult<Order> {
        let mut order = self.customer_order(customer_id, order_id).await?;
        check_transition(order.status, OrderStatus::Cancelled, ActorRole::Customer)?;

        let from = order.status;
        order.status = OrderStatus::Cancelled;
        order.cancelled_by = Some(ActorRole::Customer);
        order.cancelled_at = Some(Utc::now());
        self.commit_transition(&order, from, ActorRole::Customer, Precondition::StatusIs(from))
            .await?;
        self.emit(EventPayload::OrderCancelled {
            order_id: order.id,
            cancelled_by: ActorRole::Customer,
        });
        Ok(order)
    }

    // ── Driver ──────────────────────────────────────────────────────

    /// Driver claims a ready order
    ///
    /// First claim wins: the write is guarded on the order still being ready
    /// and unassigned, so two drivers racing for the same order produce
    /// exactly one assignment. The order joins the back of the driver's
    /// delivery batch.
    pub async fn accept_delivery(&self, driver_id: Uuid, order_id: Uuid) -> AppResult<Order> {
        self.load_driver(driver_id).await?;
        let mut order = self.load_order(order_id).await?;
        check_transition(order.status, OrderStatus::PickedUp, ActorRole::Driver)?;
        if order.driver_id.is_some() {
            return Err(AppError::new(ErrorCode::OrderAlreadyAssigned));
        }

        let active = self.storage.list_driver_active_orders(driver_id).await?;
        let from = order.status;
        order.status = OrderStatus::PickedUp;
        order.driver_id = Some(driver_id);
        order.picked_up_at = Some(Utc::now());
        order.delivery_sequence = Some(active.len() as u32 + 1);
        self.commit_transition(
            &order,
            from,
            ActorRole::Driver,
            Precondition::StatusIsAndUnassigned(from),
        )
        .await?;
        Ok(order)
    }

    /// Driver proves physical possession by reading back the pickup PIN
    ///
    /// Re-verifying an already verified order is a no-op; a mismatch answers
    /// `PinIncorrect` and nothing else.
    pub async fn verify_pickup_pin(
        &self,
        driver_id: Uuid,
        order_id: Uuid,
        pin: &str,
    ) -> AppResult<Order> {
        let mut order = self.driver_order(driver_id, order_id).await?;
        if order.status != OrderStatus::PickedUp {
            return Err(AppError::with_message(
                ErrorCode::InvalidRequest,
                format!(
                    "pickup PIN is verified while picked_up, order is {}",
                    order.status
                ),
            ));
        }
        if order.pin_verified_at.is_some() {
            return Ok(order);
        }

        let expected = order
            .pickup_pin
            .as_deref()
            .ok_or_else(|| AppError::internal("picked up order has no pickup PIN"))?;
        if pin != expected {
            return Err(AppError::new(ErrorCode::PinIncorrect));
        }

        order.pin_verified_at = Some(Utc::now());
        let updated = self
            .storage
            .update_order(&order, Precondition::StatusIs(OrderStatus::PickedUp))
            .await?;
        if !updated {
            return Err(stale_error(Precondition::StatusIs(OrderStatus::PickedUp)));
        }
        self.emit(EventPayload::PinVerified {
            order_id: order.id,
            driver_id,
        });
        Ok(order)
    }

    /// Driver departs for this order's customer
    ///
    /// Requires a verified PIN, and a driver delivers one order at a time:
    /// the write is guarded on no other order of theirs being out for
    /// delivery.
    pub async fn start_delivering(&self, driver_id: Uuid, order_id: Uuid) -> AppResult<Order> {
        let mut order = self.driver_order(driver_id, order_id).await?;
        check_transition(order.status, OrderStatus::Delivering, ActorRole::Driver)?;
        if order.pin_verified_at.is_none() {
            return Err(AppError::new(ErrorCode::PinNotVerified));
        }

        let from = order.status;
        order.status = OrderStatus::Delivering;
        self.commit_transition(
            &order,
            from,
            ActorRole::Driver,
            Precondition::StatusIsAndNoOtherDelivering(from),
        )
        .await?;
        Ok(order)
    }

    /// Driver hands the order to the customer
    ///
    /// Terminal. The completed event triggers payout settlement; settlement
    /// runs out of band and its outcome never affects this transition.
    pub async fn complete_delivery(&self, driver_id: Uuid, order_id: Uuid) -> AppResult<Order> {
        let mut order = self.driver_order(driver_id, order_id).await?;
        check_transition(order.status, OrderStatus::Delivered, ActorRole::Driver)?;

        let from = order.status;
        order.status = OrderStatus::Delivered;
        order.delivered_at = Some(Utc::now());
        self.commit_transition(&order, from, ActorRole::Driver, Precondition::StatusIs(from))
            .await?;
        self.emit(EventPayload::DeliveryCompleted { order_id: order.id });
        Ok(order)
    }

    /// Driver goes online or offline
    pub async fn set_driver_availability(
        &self,
        driver_id: Uuid,
        is_online: bool,
    ) -> AppResult<Driver> {
        let mut driver = self.load_driver(driver_id).await?;
        driver.is_online = is_online;
        self.storage.update_driver(&driver).await?;
        tracing::info!(driver_id = %driver_id, is_online, "driver availability changed");
        Ok(driver)
    }

    /// Record a driver position sample and push it to tracking consumers
    pub async fn update_driver_location(
        &self,
        driver_id: Uuid,
        latitude: f64,
        longitude: f64,
    ) -> AppResult<Driver> {
        if !(-90.0..=90.0).contains(&latitude) || !(-180.0..=180.0).contains(&longitude) {
            return Err(AppError::validation("coordinates out of range")
                .with_detail("latitude", latitude)
                .with_detail("longitude", longitude));
        }

        let mut driver = self.load_driver(driver_id).await?;
        let now = Utc::now();
        driver.last_location = Some(GeoPoint {
            latitude,
            longitude,
        });
        driver.location_updated_at = Some(now);
        self.storage.update_driver(&driver).await?;

        self.emit(EventPayload::DriverLocationChanged {
            driver_id,
            latitude,
            longitude,
            timestamp: now,
        });
        Ok(driver)
    }
}

#[cfg(test)]
mod tests {
    use super::super::testutil::{cart, order_at, world};
    use crate::storage::Storage;
    use shared::error::ErrorCode;
    use shared::order::{ActorRole, EventPayload, OrderEventType, OrderStatus};
    use uuid::Uuid;

    #[tokio::test]
    async fn test_full_lifecycle_stamps_timestamps() {
        let w = world().await;
        let order = order_at(&w, OrderStatus::Delivered).await;

        assert_eq!(order.status, OrderStatus::Delivered);
        assert!(order.accepted_at.is_some());
        assert!(order.ready_at.is_some());
        assert!(order.picked_up_at.is_some());
        assert!(order.pin_verified_at.is_some());
        assert!(order.delivered_at.is_some());
        assert_eq!(order.driver_id, Some(w.driver_id));
        assert_eq!(order.delivery_sequence, Some(1));
    }

    #[tokio::test]
    async fn test_accept_requires_payable_restaurant() {
        let w = world().await;
        let mut restaurant = w.restaurant();
        restaurant.payouts_enabled = false;
        w.storage.seed_restaurant(restaurant);

        let order = w.service.create_order(cart(&w, 1)).await.unwrap();
        let err = w
            .service
            .accept_order(w.restaurant_id, order.id)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::PayoutAccountMissing);

        // the order is untouched and can still be cancelled
        let stored = w.storage.get_order(order.id).await.unwrap().unwrap();
        assert_eq!(stored.status, OrderStatus::Pending);
    }

    #[tokio::test]
    async fn test_accept_twice_is_invalid_transition() {
        let w = world().await;
        let order = order_at(&w, OrderStatus::Accepted).await;
        let err = w
            .service
            .accept_order(w.restaurant_id, order.id)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidTransition);
    }

    #[tokio::test]
    async fn test_foreign_restaurant_sees_not_found() {
        let w = world().await;
        let order = order_at(&w, OrderStatus::Pending).await;
        let err = w
            .service
            .accept_order(Uuid::new_v4(), order.id)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::OrderNotFound);
    }

    #[tokio::test]
    async fn test_reject_records_reason() {
        let w = world().await;
        let order = order_at(&w, OrderStatus::Pending).await;
        let rejected = w
            .service
            .reject_order(w.restaurant_id, order.id, "out of chashu".to_string())
            .await
            .unwrap();

        assert_eq!(rejected.status, OrderStatus::Cancelled);
        assert_eq!(rejected.cancelled_by, Some(ActorRole::Restaurant));
        assert_eq!(
            rejected.special_instructions.as_deref(),
            Some("out of chashu")
        );
        assert!(rejected.cancelled_at.is_some());
    }

    #[tokio::test]
    async fn test_customer_cannot_cancel_after_acceptance() {
        let w = world().await;
        let order = order_at(&w, OrderStatus::Accepted).await;
        let err = w
            .service
            .cancel_order(w.customer_id, order.id)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidTransition);
    }

    #[tokio::test]
    async fn test_mark_ready_mints_pin() {
        let w = world().await;
        let order = order_at(&w, OrderStatus::Ready).await;
        let pin = order.pickup_pin.unwrap();
        assert_eq!(pin.len(), 4);
        assert!(!pin.starts_with('0'));
        assert!(order.ready_at.is_some());
    }

    #[tokio::test]
    async fn test_second_driver_cannot_claim() {
        let w = world().await;
        let order = order_at(&w, OrderStatus::PickedUp).await;

        let mut rival = w.driver();
        rival.id = Uuid::new_v4();
        w.storage.seed_driver(rival.clone());

        let err = w
            .service
            .accept_delivery(rival.id, order.id)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidTransition);
    }

    #[tokio::test]
    async fn test_wrong_pin_rejected_without_leak() {
        let w = world().await;
        let order = order_at(&w, OrderStatus::PickedUp).await;
        let real_pin = order.pickup_pin.clone().unwrap();
        let wrong = if real_pin == "9999" { "1000" } else { "9999" };

        let err = w
            .service
            .verify_pickup_pin(w.driver_id, order.id, wrong)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::PinIncorrect);
        assert!(!err.message.contains(&real_pin));

        let stored = w.storage.get_order(order.id).await.unwrap().unwrap();
        assert!(stored.pin_verified_at.is_none());
    }

    #[tokio::test]
    async fn test_pin_verification_is_idempotent() {
        let w = world().await;
        let order = order_at(&w, OrderStatus::PickedUp).await;
        let pin = order.pickup_pin.clone().unwrap();

        let first = w
            .service
            .verify_pickup_pin(w.driver_id, order.id, &pin)
            .await
            .unwrap();
        let verified_at = first.pin_verified_at.unwrap();

        // even a wrong pin is accepted once verification stands
        let second = w
            .service
            .verify_pickup_pin(w.driver_id, order.id, "0000")
            .await
            .unwrap();
        assert_eq!(second.pin_verified_at, Some(verified_at));
    }

    #[tokio::test]
    async fn test_departure_requires_verified_pin() {
        let w = world().await;
        let order = order_at(&w, OrderStatus::PickedUp).await;
        let err = w
            .service
            .start_delivering(w.driver_id, order.id)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::PinNotVerified);
    }

    #[tokio::test]
    async fn test_one_delivery_at_a_time() {
        let w = world().await;
        let first = order_at(&w, OrderStatus::Delivering).await;

        // pick up a second order and verify its pin
        let second = order_at(&w, OrderStatus::PickedUp).await;
        let pin = second.pickup_pin.clone().unwrap();
        w.service
            .verify_pickup_pin(w.driver_id, second.id, &pin)
            .await
            .unwrap();

        let err = w
            .service
            .start_delivering(w.driver_id, second.id)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::DeliveryInProgress);

        // delivering the first frees the driver for the second
        w.service
            .complete_delivery(w.driver_id, first.id)
            .await
            .unwrap();
        let moving = w
            .service
            .start_delivering(w.driver_id, second.id)
            .await
            .unwrap();
        assert_eq!(moving.status, OrderStatus::Delivering);
    }

    #[tokio::test]
    async fn test_delivery_sequence_increments() {
        let w = world().await;
        let first = order_at(&w, OrderStatus::PickedUp).await;
        let second = order_at(&w, OrderStatus::PickedUp).await;
        assert_eq!(first.delivery_sequence, Some(1));
        assert_eq!(second.delivery_sequence, Some(2));
    }

    #[tokio::test]
    async fn test_completion_emits_terminal_event() {
        let w = world().await;
        let order = order_at(&w, OrderStatus::Delivering).await;

        let mut rx = w.service.subscribe();
        w.service
            .complete_delivery(w.driver_id, order.id)
            .await
            .unwrap();

        let status_changed = rx.recv().await.unwrap();
        assert_eq!(status_changed.event_type, OrderEventType::StatusChanged);

        let completed = rx.recv().await.unwrap();
        match completed.payload {
            EventPayload::DeliveryCompleted { order_id } => assert_eq!(order_id, order.id),
            other => panic!("unexpected payload: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_cancellation_emits_terminal_event() {
        let w = world().await;
        let order = order_at(&w, OrderStatus::Pending).await;

        let mut rx = w.service.subscribe();
        w.service
            .cancel_order(w.customer_id, order.id)
            .await
            .unwrap();

        let status_changed = rx.recv().await.unwrap();
        assert_eq!(status_changed.event_type, OrderEventType::StatusChanged);

        let cancelled = rx.recv().await.unwrap();
        match cancelled.payload {
            EventPayload::OrderCancelled {
                order_id,
                cancelled_by,
            } => {
                assert_eq!(order_id, order.id);
                assert_eq!(cancelled_by, ActorRole::Customer);
            }
            other => panic!("unexpected payload: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_location_update_validates_range() {
        let w = world().await;
        let err = w
            .service
            .update_driver_location(w.driver_id, 91.0, 139.7)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationFailed);

        let driver = w
            .service
            .update_driver_location(w.driver_id, 35.65, 139.71)
            .await
            .unwrap();
        assert!(driver.last_location.is_some());
        assert!(driver.location_updated_at.is_some());
    }

    #[tokio::test]
    async fn test_availability_toggle_persists() {
        let w = world().await;
        w.service
            .set_driver_availability(w.driver_id, false)
            .await
            .unwrap();
        let stored = w.storage.get_driver(w.driver_id).await.unwrap().unwrap();
        assert!(!stored.is_online);
    }
}
