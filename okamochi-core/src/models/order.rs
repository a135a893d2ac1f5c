//! Order Model
//!
//! Orders snapshot everything they touch at creation time. Item names and
//! prices, the delivery address, and the commission rate are copied onto the
//! order so later catalog or account edits never change a placed order.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared::order::{ActorRole, OrderStatus};
use shared::view::GeoPoint;
use uuid::Uuid;
use validator::Validate;

// =============================================================================
// Order (aggregate root)
// =============================================================================

/// How the customer pays
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Paid through the processor; settled by payout transfers
    Card,
    /// Paid on handoff; settlement skips cash orders
    Cash,
}

/// Order entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: Uuid,
    /// Human-facing number, unique per business day (ORD-YYYYMMDD-NNNN)
    pub order_number: String,
    pub customer_id: Uuid,
    pub restaurant_id: Uuid,
    pub driver_id: Option<Uuid>,
    pub status: OrderStatus,
    pub items: Vec<OrderItem>,
    pub delivery_address: DeliveryAddress,
    pub coupon_code: Option<String>,
    /// Free-text handoff notes; overwritten with the reason on restaurant reject
    pub special_instructions: Option<String>,

    // Pricing snapshot, all amounts in whole yen
    pub subtotal: Decimal,
    pub delivery_fee: Decimal,
    pub service_fee: Decimal,
    pub discount: Decimal,
    pub tax: Decimal,
    pub total: Decimal,

    // Settlement snapshot
    /// Commission rate in effect when the order was placed
    pub commission_rate: Decimal,
    pub restaurant_payout: Decimal,
    pub driver_payout: Decimal,
    pub platform_revenue: Decimal,
    pub payment_method: PaymentMethod,
    /// Processor payment intent backing a card order
    pub payment_intent_id: Option<String>,
    /// Set once by the settlement worker; guards against double payout
    pub payout_completed: bool,
    pub restaurant_transfer_id: Option<String>,
    pub driver_transfer_id: Option<String>,

    // Delivery
    /// Four digit handoff code, generated when the order becomes ready
    pub pickup_pin: Option<String>,
    pub pin_verified_at: Option<DateTime<Utc>>,
    /// Position within the driver's delivery batch, assigned at pickup
    pub delivery_sequence: Option<u32>,

    // Cancellation
    pub cancelled_by: Option<ActorRole>,

    // Lifecycle timestamps
    pub created_at: DateTime<Utc>,
    pub accepted_at: Option<DateTime<Utc>>,
    pub ready_at: Option<DateTime<Utc>>,
    pub picked_up_at: Option<DateTime<Utc>>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
}

impl Order {
    /// Whether the given driver is assigned to this order
    pub fn is_assigned_to(&self, driver_id: Uuid) -> bool {
        self.driver_id == Some(driver_id)
    }
}

// =============================================================================
// Order Item (embedded)
// =============================================================================

/// Line item with snapshotted name and pricing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItem {
    pub menu_item_id: Uuid,
    pub name: String,
    pub unit_price: Decimal,
    pub quantity: u32,
    #[serde(default)]
    pub options: Vec<OrderItemOption>,
    /// (unit_price + option deltas) * quantity
    pub line_total: Decimal,
}

/// Selected option with its snapshotted price delta
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItemOption {
    pub option_id: Uuid,
    pub name: String,
    pub price_delta: Decimal,
}

/// Delivery destination snapshotted from the customer's saved address
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryAddress {
    pub address: String,
    pub location: GeoPoint,
    pub notes: Option<String>,
}

// =============================================================================
// API Request Types
// =============================================================================

/// Create order payload
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateOrderRequest {
    pub customer_id: Uuid,
    pub restaurant_id: Uuid,
    #[validate(length(min = 1, message = "order must contain at least one item"), nested)]
    pub items: Vec<OrderItemRequest>,
    /// Saved address to deliver to, must belong to the customer
    pub address_id: Uuid,
    pub coupon_code: Option<String>,
    pub special_instructions: Option<String>,
    pub payment_method: PaymentMethod,
    /// Authorized payment intent; required for card orders
    #[validate(length(min = 1, message = "payment_intent_id must not be empty"))]
    pub payment_intent_id: Option<String>,
}

/// One requested line item
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct OrderItemRequest {
    pub menu_item_id: Uuid,
    #[validate(range(min = 1, max = 99, message = "quantity must be between 1 and 99"))]
    pub quantity: u32,
    #[serde(default)]
    pub option_ids: Vec<Uuid>,
}
