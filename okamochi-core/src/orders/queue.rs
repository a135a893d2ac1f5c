//! Delivery queue positions within a driver's batch
//!
//! A driver may hold several picked-up orders at once but delivers them one
//! at a time. The queue is the driver's active orders in delivery-sequence
//! order; resolution here is pure given that ordered list.

use crate::models::Order;
use shared::order::OrderStatus;
use shared::view::QueueEntry;

/// Queue entries for a driver's active orders
///
/// `active` must already be in delivery order (the storage listing
/// guarantees this). Positions are 1-indexed; the current stop is the order
/// out for delivery, of which there is at most one.
pub fn resolve_queue(active: &[Order]) -> Vec<QueueEntry> {
    active
        .iter()
        .enumerate()
        .map(|(idx, order)| QueueEntry {
            order_id: order.id,
            order_number: order.order_number.clone(),
            status: order.status,
            position: (idx + 1) as u32,
            remaining_ahead: idx as u32,
            is_current: order.status == OrderStatus::Delivering,
        })
        .collect()
}
