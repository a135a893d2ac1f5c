//! Restaurant Model

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared::view::GeoPoint;
use uuid::Uuid;

/// Restaurant entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Restaurant {
    pub id: Uuid,
    pub name: String,
    pub phone: String,
    pub address: String,
    pub location: GeoPoint,
    /// Flat delivery fee for orders from this restaurant
    pub delivery_fee: Decimal,
    /// Per-restaurant commission, falls back to the configured default when unset
    pub commission_rate: Option<Decimal>,
    /// Processor account receiving the restaurant payout transfer
    pub payout_account_id: Option<String>,
    /// Payout onboarding finished; gates order acceptance
    pub payouts_enabled: bool,
    /// Whether the restaurant is currently taking orders
    pub is_open: bool,
    pub created_at: DateTime<Utc>,
}

impl Restaurant {
    /// Commission rate snapshotted onto new orders
    pub fn effective_commission(&self, default_rate: Decimal) -> Decimal {
        self.commission_rate.unwrap_or(default_rate)
    }
}
