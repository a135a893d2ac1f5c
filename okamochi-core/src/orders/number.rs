//! Business-day order numbering
//!
//! Numbers look like `ORD-20250815-0001`. The date part is the local
//! business day in the configured zone and the sequence restarts at 0001
//! each day. Uniqueness is ultimately enforced by the storage layer; a
//! collision under concurrency surfaces as `DuplicateOrderNumber` and the
//! caller regenerates.

use crate::storage::Storage;
use chrono::{DateTime, FixedOffset, Offset, Utc};
use shared::error::AppResult;

/// Offset for the business-day boundary; out-of-range config falls back to
/// UTC rather than failing order creation
fn business_zone(utc_offset_hours: i32) -> FixedOffset {
    FixedOffset::east_opt(utc_offset_hours * 3600).unwrap_or_else(|| Utc.fix())
}

/// Number prefix for the business day containing `now` ("ORD-20250815")
pub fn day_prefix(now: DateTime<Utc>, utc_offset_hours: i32) -> String {
    let local = now.with_timezone(&business_zone(utc_offset_hours));
    format!("ORD-{}", local.format("%Y%m%d"))
}

/// Next order number for the current business day
pub async fn next_order_number(
    storage: &dyn Storage,
    utc_offset_hours: i32,
) -> AppResult<String> {
    let prefix = day_prefix(Utc::now(), utc_offset_hours);
    let count = storage.count_orders_for_day(&prefix).await?;
    Ok(format!("{}-{:04}", prefix, count + 1))
}
