//! Customer Model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared::view::GeoPoint;
use uuid::Uuid;

/// Customer entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Customer {
    pub id: Uuid,
    pub full_name: String,
    pub phone: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

/// Saved delivery address
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerAddress {
    pub id: Uuid,
    pub customer_id: Uuid,
    /// Short label shown in the address picker ("home", "office")
    pub label: String,
    pub address: String,
    pub location: GeoPoint,
    /// Gate codes, floor numbers, handoff notes
    pub delivery_notes: Option<String>,
}
