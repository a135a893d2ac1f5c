//! Domain events emitted after order state has been committed
//!
//! Events are published on a broadcast channel once the storage write has
//! succeeded; consumers (settlement worker, realtime push) never run inside
//! the transition itself.

use super::status::{ActorRole, OrderStatus};
use crate::util::{now_millis, snowflake_id};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Domain event envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderEvent {
    /// Event unique ID (time-sortable)
    pub event_id: String,
    /// Server timestamp (Unix milliseconds)
    pub timestamp: i64,
    /// Event type (used for routing without inspecting the payload)
    pub event_type: OrderEventType,
    /// Event payload
    pub payload: EventPayload,
}

impl OrderEvent {
    /// Wrap a payload in an envelope, stamping id, time, and type
    pub fn new(payload: EventPayload) -> Self {
        Self {
            event_id: snowflake_id().to_string(),
            timestamp: now_millis(),
            event_type: payload.event_type(),
            payload,
        }
    }
}

/// Event type enumeration
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderEventType {
    OrderCreated,
    StatusChanged,
    PinVerified,
    DeliveryCompleted,
    OrderCancelled,
    DriverLocationChanged,
}

impl std::fmt::Display for OrderEventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::OrderCreated => "ORDER_CREATED",
            Self::StatusChanged => "STATUS_CHANGED",
            Self::PinVerified => "PIN_VERIFIED",
            Self::DeliveryCompleted => "DELIVERY_COMPLETED",
            Self::OrderCancelled => "ORDER_CANCELLED",
            Self::DriverLocationChanged => "DRIVER_LOCATION_CHANGED",
        };
        write!(f, "{name}")
    }
}

/// Event payload variants
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventPayload {
    OrderCreated {
        order_id: Uuid,
        order_number: String,
        customer_id: Uuid,
        restaurant_id: Uuid,
        total: Decimal,
    },
    StatusChanged {
        order_id: Uuid,
        order_number: String,
        from: OrderStatus,
        to: OrderStatus,
        actor: ActorRole,
        /// Present once a driver is assigned; transitions before assignment
        /// carry `None`
        #[serde(skip_serializing_if = "Option::is_none")]
        driver_id: Option<Uuid>,
    },
    PinVerified {
        order_id: Uuid,
        driver_id: Uuid,
    },
    /// Terminal: consumed by the settlement engine to issue payouts
    DeliveryCompleted {
        order_id: Uuid,
    },
    /// Terminal: consumed by the settlement engine to unwind payment
    OrderCancelled {
        order_id: Uuid,
        cancelled_by: ActorRole,
    },
    DriverLocationChanged {
        driver_id: Uuid,
        latitude: f64,
        longitude: f64,
        timestamp: DateTime<Utc>,
    },
}

impl EventPayload {
    /// The routing type for this payload
    pub fn event_type(&self) -> OrderEventType {
        match self {
            Self::OrderCreated { .. } => OrderEventType::OrderCreated,
            Self::StatusChanged { .. } => OrderEventType::StatusChanged,
            Self::PinVerified { .. } => OrderEventType::PinVerified,
            Self::DeliveryCompleted { .. } => OrderEventType::DeliveryCompleted,
            Self::OrderCancelled { .. } => OrderEventType::OrderCancelled,
            Self::DriverLocationChanged { .. } => OrderEventType::DriverLocationChanged,
        }
    }
}

/// Outbound realtime event, the wire contract for the push transport
///
/// Field casing matches what tracking clients already consume; the core
/// produces these, the transport delivers them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "event", content = "data")]
pub enum RealtimeEvent {
    #[serde(rename = "driver:location-changed", rename_all = "camelCase")]
    DriverLocationChanged {
        driver_id: Uuid,
        latitude: f64,
        longitude: f64,
        timestamp: DateTime<Utc>,
    },
    #[serde(rename = "order:status-changed", rename_all = "camelCase")]
    OrderStatusChanged {
        order_id: Uuid,
        order_number: String,
        status: OrderStatus,
    },
}

impl RealtimeEvent {
    /// Transport-level event name
    pub fn event_name(&self) -> &'static str {
        match self {
            Self::DriverLocationChanged { .. } => "driver:location-changed",
            Self::OrderStatusChanged { .. } => "order:status-changed",
        }
    }
}
