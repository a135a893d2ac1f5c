//! Client-facing view payloads
//!
//! Wire shapes consumed by tracking and dashboard clients. Field casing is
//! camelCase because that is what those clients already parse; `None` for
//! the privacy-gated driver fields serializes as an explicit `null`.

use crate::order::OrderStatus;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Geographic point
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

/// Driver identity revealed to a tracking view (privacy-gated)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriverContact {
    pub full_name: String,
    pub phone: String,
}

/// Driver live position with its last-update time
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriverPosition {
    pub latitude: f64,
    pub longitude: f64,
    pub updated_at: DateTime<Utc>,
}

/// Lifecycle timestamps on the tracking payload
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackingTimestamps {
    pub created_at: DateTime<Utc>,
    pub accepted_at: Option<DateTime<Utc>>,
    pub picked_up_at: Option<DateTime<Utc>>,
    pub delivered_at: Option<DateTime<Utc>>,
}

/// Customer-facing order tracking view
///
/// The driver fields obey the delivery-queue privacy rule: they are
/// populated only while this order is the driver's current delivery.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackingView {
    pub order_number: String,
    pub status: OrderStatus,
    pub is_driver_assigned: bool,
    pub restaurant_name: String,
    pub restaurant_location: GeoPoint,
    pub delivery_location: GeoPoint,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delivery_sequence: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remaining_deliveries: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_orders_in_batch: Option<u32>,
    pub driver_location: Option<DriverPosition>,
    pub driver_info: Option<DriverContact>,
    pub timestamps: TrackingTimestamps,
}

/// One entry in a driver's active delivery queue
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueEntry {
    pub order_id: Uuid,
    pub order_number: String,
    pub status: OrderStatus,
    /// 1-indexed position in the delivery batch
    pub position: u32,
    /// Deliveries ahead of this one
    pub remaining_ahead: u32,
    /// Whether this order is the one currently being delivered
    pub is_current: bool,
}

/// Result of validating a coupon against a cart subtotal
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CouponQuote {
    pub code: String,
    pub discount: Decimal,
    pub final_amount: Decimal,
}

/// Restaurant dashboard statistics (cancelled orders excluded)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RestaurantStats {
    pub total_orders: u64,
    pub total_revenue: Decimal,
    pub average_order_value: Decimal,
    pub status_counts: HashMap<OrderStatus, u64>,
}

/// Driver delivery statistics over a period
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriverStats {
    pub total_deliveries: u64,
    pub total_earnings: Decimal,
}
