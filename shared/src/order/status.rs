//! Order lifecycle status and transition actors

use serde::{Deserialize, Serialize};

/// Order lifecycle status
///
/// Serialized as lowercase snake_case strings, matching the stored data
/// contract (`picked_up`, not `PickedUp`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Placed by the customer, awaiting restaurant decision
    Pending,
    /// Restaurant committed to fulfil
    Accepted,
    /// Kitchen working on the order
    Preparing,
    /// Packed and waiting for a driver
    Ready,
    /// Driver holds the order
    PickedUp,
    /// Driver is en route to this order's customer
    Delivering,
    /// Handed over to the customer (terminal)
    Delivered,
    /// Cancelled before acceptance (terminal)
    Cancelled,
}

impl OrderStatus {
    /// Every status, in lifecycle order
    pub const ALL: [OrderStatus; 8] = [
        Self::Pending,
        Self::Accepted,
        Self::Preparing,
        Self::Ready,
        Self::PickedUp,
        Self::Delivering,
        Self::Delivered,
        Self::Cancelled,
    ];

    /// Stable string form (matches the serde representation)
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Accepted => "accepted",
            Self::Preparing => "preparing",
            Self::Ready => "ready",
            Self::PickedUp => "picked_up",
            Self::Delivering => "delivering",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
        }
    }

    /// Terminal statuses admit no further transitions
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Delivered | Self::Cancelled)
    }

    /// Statuses that count as an active delivery held by a driver
    pub const fn is_active_delivery(&self) -> bool {
        matches!(self, Self::PickedUp | Self::Delivering)
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Closed set of roles that may drive order transitions
///
/// Transition authority is checked against this enum, never against a
/// caller-supplied type string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActorRole {
    Customer,
    Restaurant,
    Driver,
}

impl ActorRole {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Customer => "customer",
            Self::Restaurant => "restaurant",
            Self::Driver => "driver",
        }
    }
}

impl std::fmt::Display for ActorRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
