//! Coupon Model

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// How a coupon discounts the subtotal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscountType {
    /// `value` is a percentage of the subtotal (0-100)
    Percent,
    /// `value` is a flat yen amount
    Fixed,
}

fn default_per_user_limit() -> u32 {
    1
}

/// Coupon entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Coupon {
    pub id: Uuid,
    /// Redemption code, stored uppercase, matched case-insensitively
    pub code: String,
    pub discount_type: DiscountType,
    pub value: Decimal,
    /// Subtotal must reach this amount before the coupon applies
    pub min_order_amount: Decimal,
    /// Cap for percent discounts, ignored for fixed
    pub max_discount: Option<Decimal>,
    /// Validity window, either end may be open
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    /// Total redemptions allowed across all customers
    pub usage_limit: Option<u32>,
    /// Redemptions allowed per customer
    #[serde(default = "default_per_user_limit")]
    pub per_user_limit: u32,
    pub is_active: bool,
}

/// One redemption, recorded atomically with the order that used it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CouponUsage {
    pub id: Uuid,
    pub coupon_id: Uuid,
    pub customer_id: Uuid,
    pub order_id: Uuid,
    pub used_at: DateTime<Utc>,
}
