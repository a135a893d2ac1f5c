//! Storage layer for orders, parties, catalog and coupons
//!
//! The [`Storage`] trait is the narrow persistence contract the engine runs
//! against. Production embeddings implement it over a real database; tests
//! use [`MemoryStorage`]. Every guarded write models a conditional SQL
//! update: the precondition is evaluated against the stored row inside the
//! backend's own atomicity boundary, never by the caller.

mod memory;

pub use memory::MemoryStorage;

use crate::models::{
    Coupon, CouponUsage, Customer, CustomerAddress, Driver, MenuItem, Order, Restaurant,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use shared::error::{AppError, ErrorCode};
use shared::order::OrderStatus;
use thiserror::Error;
use uuid::Uuid;

/// Storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("order not found: {0}")]
    OrderNotFound(Uuid),

    #[error("driver not found: {0}")]
    DriverNotFound(Uuid),

    #[error("duplicate order number: {0}")]
    DuplicateOrderNumber(String),

    #[error("coupon usage limit reached: {0}")]
    CouponGlobalLimit(Uuid),

    #[error("coupon per-user limit reached: {0}")]
    CouponUserLimit(Uuid),

    #[error("storage backend error: {0}")]
    Backend(String),
}

pub type StorageResult<T> = Result<T, StorageError>;

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::OrderNotFound(_) => AppError::new(ErrorCode::OrderNotFound),
            StorageError::DriverNotFound(_) => AppError::new(ErrorCode::DriverNotFound),
            StorageError::DuplicateOrderNumber(n) => {
                AppError::new(ErrorCode::OrderNumberExists).with_detail("order_number", n)
            }
            StorageError::CouponGlobalLimit(_) => AppError::new(ErrorCode::CouponUsageLimitReached),
            StorageError::CouponUserLimit(_) => AppError::new(ErrorCode::CouponUserLimitReached),
            StorageError::Backend(msg) => AppError::database(msg),
        }
    }
}

/// Guard evaluated against the stored order row before a write is applied
///
/// Models `UPDATE ... WHERE id = ? AND <guard>`; a failed guard means a
/// concurrent writer got there first and the update is not applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Precondition {
    /// Unconditional replace
    None,
    /// Stored status must match
    StatusIs(OrderStatus),
    /// Stored status must match and no driver may be assigned yet
    StatusIsAndUnassigned(OrderStatus),
    /// Stored status must match and the assigned driver must have no other
    /// order currently in `delivering`
    StatusIsAndNoOtherDelivering(OrderStatus),
}

/// Persistence contract for the marketplace engine
#[async_trait]
pub trait Storage: Send + Sync {
    // ── Parties ─────────────────────────────────────────────────────

    async fn get_restaurant(&self, id: Uuid) -> StorageResult<Option<Restaurant>>;
    async fn get_driver(&self, id: Uuid) -> StorageResult<Option<Driver>>;
    async fn get_customer(&self, id: Uuid) -> StorageResult<Option<Customer>>;
    async fn get_customer_address(&self, id: Uuid) -> StorageResult<Option<CustomerAddress>>;

    /// Replace a driver row (availability and location are last-write-wins)
    async fn update_driver(&self, driver: &Driver) -> StorageResult<()>;

    // ── Catalog ─────────────────────────────────────────────────────

    async fn get_menu_item(&self, id: Uuid) -> StorageResult<Option<MenuItem>>;

    // ── Coupons ─────────────────────────────────────────────────────

    /// Case-insensitive code lookup
    async fn find_coupon_by_code(&self, code: &str) -> StorageResult<Option<Coupon>>;
    async fn list_active_coupons(&self) -> StorageResult<Vec<Coupon>>;
    async fn count_coupon_usage(&self, coupon_id: Uuid) -> StorageResult<u64>;
    async fn count_coupon_usage_for_customer(
        &self,
        coupon_id: Uuid,
        customer_id: Uuid,
    ) -> StorageResult<u64>;

    // ── Orders ──────────────────────────────────────────────────────

    /// Persist a new order, its items and the optional coupon redemption in
    /// one transaction. Fails whole if the order number already exists or a
    /// coupon limit would be exceeded; on failure nothing is written.
    async fn insert_order(&self, order: &Order, usage: Option<&CouponUsage>) -> StorageResult<()>;

    async fn get_order(&self, id: Uuid) -> StorageResult<Option<Order>>;

    /// Guarded replace. Returns false when the precondition did not hold;
    /// the row is untouched in that case.
    async fn update_order(&self, order: &Order, precondition: Precondition)
        -> StorageResult<bool>;

    /// Atomically flip `payout_completed` false -> true. Returns false when
    /// the payout was already claimed.
    async fn claim_payout(&self, order_id: Uuid) -> StorageResult<bool>;

    /// Record issued transfer references on a settled order
    async fn record_transfers(
        &self,
        order_id: Uuid,
        restaurant_transfer_id: Option<&str>,
        driver_transfer_id: Option<&str>,
    ) -> StorageResult<()>;

    /// Orders already numbered for the given day prefix ("ORD-20250815")
    async fn count_orders_for_day(&self, date_prefix: &str) -> StorageResult<u64>;

    /// Ready, unassigned orders, oldest first
    async fn list_available_orders(&self) -> StorageResult<Vec<Order>>;

    /// A driver's picked_up/delivering orders in delivery-sequence order
    /// (ties broken by creation time)
    async fn list_driver_active_orders(&self, driver_id: Uuid) -> StorageResult<Vec<Order>>;

    /// A driver's delivered orders within a time window
    async fn list_driver_delivered_orders(
        &self,
        driver_id: Uuid,
        since: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> StorageResult<Vec<Order>>;

    /// A restaurant's orders, newest first, optionally filtered by status
    async fn list_restaurant_orders(
        &self,
        restaurant_id: Uuid,
        status: Option<OrderStatus>,
    ) -> StorageResult<Vec<Order>>;
}
