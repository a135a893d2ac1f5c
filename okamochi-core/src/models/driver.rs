//! Driver Model

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared::view::GeoPoint;
use uuid::Uuid;

/// Delivery vehicle category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VehicleType {
    Bicycle,
    Motorbike,
    Car,
}

/// Driver entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Driver {
    pub id: Uuid,
    pub full_name: String,
    pub phone: String,
    pub vehicle_type: VehicleType,
    /// Processor account receiving the delivery fee transfer
    pub payout_account_id: Option<String>,
    /// Payout onboarding finished
    pub payouts_enabled: bool,
    /// Profile field shown to drivers; actual earnings are the delivery fee
    pub base_payout_per_delivery: Option<Decimal>,
    /// Whether the driver is on shift and taking assignments
    pub is_online: bool,
    /// Last reported position, absent until the first location update
    pub last_location: Option<GeoPoint>,
    pub location_updated_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}
