//! Standardized error codes for the delivery platform

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error code returned when converting an invalid u16 value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("invalid error code: {0}")]
pub struct InvalidErrorCode(pub u16);

/// Standardized error codes
///
/// Codes are grouped by domain range:
/// - 0xxx: General errors
/// - 2xxx: Permission errors
/// - 3xxx: Account errors (restaurants, drivers, customers)
/// - 4xxx: Order errors
/// - 5xxx: Payment errors
/// - 6xxx: Catalog errors
/// - 7xxx: Coupon errors
/// - 9xxx: System errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // ========== General (0xxx) ==========
    /// Operation succeeded
    Success = 0,
    /// Unknown error
    UnknownError = 1,
    /// Request input failed validation
    ValidationFailed = 2,
    /// Resource not found
    NotFound = 3,
    /// Resource already exists
    AlreadyExists = 4,
    /// Request is malformed
    InvalidRequest = 5,

    // ========== Permission (2xxx) ==========
    /// Caller lacks permission for this operation
    PermissionDenied = 2001,
    /// Transition exists but not for this actor role
    ActorNotAllowed = 2002,

    // ========== Account (3xxx) ==========
    /// Restaurant not found
    RestaurantNotFound = 3001,
    /// Restaurant is not accepting orders
    RestaurantClosed = 3002,
    /// Driver not found
    DriverNotFound = 3003,
    /// Customer not found
    CustomerNotFound = 3004,
    /// Delivery address not found or not owned by the customer
    AddressNotFound = 3005,

    // ========== Order (4xxx) ==========
    /// Order not found
    OrderNotFound = 4001,
    /// Requested status transition is not in the transition table
    InvalidTransition = 4002,
    /// Another driver already accepted this order
    OrderAlreadyAssigned = 4003,
    /// Order contains no items
    OrderEmpty = 4004,
    /// Submitted pickup PIN does not match
    PinIncorrect = 4005,
    /// Pickup PIN has not been verified yet
    PinNotVerified = 4006,
    /// Driver already has a delivery in progress
    DeliveryInProgress = 4007,
    /// Generated order number collided with an existing one
    OrderNumberExists = 4008,

    // ========== Payment (5xxx) ==========
    /// Payment processor reported a failure
    PaymentFailed = 5001,
    /// No captured payment reference on the order
    PaymentNotCaptured = 5002,
    /// Payee has no linked payout account
    PayoutAccountMissing = 5003,
    /// Payout transfer failed
    TransferFailed = 5004,
    /// Refund failed
    RefundFailed = 5005,
    /// Payment processor call timed out
    PaymentTimeout = 5006,

    // ========== Catalog (6xxx) ==========
    /// Menu item not found
    MenuItemNotFound = 6001,
    /// Menu item is currently unavailable
    MenuItemUnavailable = 6002,
    /// Menu item belongs to a different restaurant
    MenuItemWrongRestaurant = 6003,

    // ========== Coupon (7xxx) ==========
    /// Coupon code unknown or inactive
    CouponInvalid = 7001,
    /// Coupon validity window has not started
    CouponNotStarted = 7002,
    /// Coupon validity window has ended
    CouponExpired = 7003,
    /// Order subtotal below the coupon minimum
    CouponMinOrderNotMet = 7004,
    /// Coupon global usage limit reached
    CouponUsageLimitReached = 7005,
    /// Customer reached the per-user limit for this coupon
    CouponUserLimitReached = 7006,

    // ========== System (9xxx) ==========
    /// Internal server error
    InternalError = 9001,
    /// Database error
    DatabaseError = 9002,
    /// Configuration error
    ConfigError = 9003,
    /// Event channel closed unexpectedly
    EventChannelClosed = 9004,
}

impl ErrorCode {
    /// Get the numeric code value
    pub const fn code(&self) -> u16 {
        *self as u16
    }

    /// Get the default human-readable message for this code
    pub const fn message(&self) -> &'static str {
        match self {
            Self::Success => "Success",
            Self::UnknownError => "Unknown error",
            Self::ValidationFailed => "Validation failed",
            Self::NotFound => "Resource not found",
            Self::AlreadyExists => "Resource already exists",
            Self::InvalidRequest => "Invalid request",

            Self::PermissionDenied => "Permission denied",
            Self::ActorNotAllowed => "Actor not allowed to perform this transition",

            Self::RestaurantNotFound => "Restaurant not found",
            Self::RestaurantClosed => "Restaurant is not accepting orders",
            Self::DriverNotFound => "Driver not found",
            Self::CustomerNotFound => "Customer not found",
            Self::AddressNotFound => "Delivery address not found",

            Self::OrderNotFound => "Order not found",
            Self::InvalidTransition => "Invalid order status transition",
            Self::OrderAlreadyAssigned => "Order already assigned to another driver",
            Self::OrderEmpty => "Order contains no items",
            Self::PinIncorrect => "Incorrect pickup PIN",
            Self::PinNotVerified => "Pickup PIN has not been verified",
            Self::DeliveryInProgress => "Another delivery is already in progress",
            Self::OrderNumberExists => "Order number already exists",

            Self::PaymentFailed => "Payment processing failed",
            Self::PaymentNotCaptured => "No captured payment found for this order",
            Self::PayoutAccountMissing => "Payout account not linked",
            Self::TransferFailed => "Payout transfer failed",
            Self::RefundFailed => "Refund failed",
            Self::PaymentTimeout => "Payment processor timed out",

            Self::MenuItemNotFound => "Menu item not found",
            Self::MenuItemUnavailable => "Menu item not available",
            Self::MenuItemWrongRestaurant => "Menu item belongs to a different restaurant",

            Self::CouponInvalid => "Invalid coupon code",
            Self::CouponNotStarted => "Coupon is not active yet",
            Self::CouponExpired => "Coupon has expired",
            Self::CouponMinOrderNotMet => "Order amount below coupon minimum",
            Self::CouponUsageLimitReached => "Coupon usage limit reached",
            Self::CouponUserLimitReached => "Coupon already used the maximum number of times",

            Self::InternalError => "Internal server error",
            Self::DatabaseError => "Database error",
            Self::ConfigError => "Configuration error",
            Self::EventChannelClosed => "Event channel closed",
        }
    }
}

impl From<ErrorCode> for u16 {
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

impl TryFrom<u16> for ErrorCode {
    type Error = InvalidErrorCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Success),
            1 => Ok(Self::UnknownError),
            2 => Ok(Self::ValidationFailed),
            3 => Ok(Self::NotFound),
            4 => Ok(Self::AlreadyExists),
            5 => Ok(Self::InvalidRequest),

            2001 => Ok(Self::PermissionDenied),
            2002 => Ok(Self::ActorNotAllowed),

            3001 => Ok(Self::RestaurantNotFound),
            3002 => Ok(Self::RestaurantClosed),
            3003 => Ok(Self::DriverNotFound),
            3004 => Ok(Self::CustomerNotFound),
            3005 => Ok(Self::AddressNotFound),

            4001 => Ok(Self::OrderNotFound),
            4002 => Ok(Self::InvalidTransition),
            4003 => Ok(Self::OrderAlreadyAssigned),
            4004 => Ok(Self::OrderEmpty),
            4005 => Ok(Self::PinIncorrect),
            4006 => Ok(Self::PinNotVerified),
            4007 => Ok(Self::DeliveryInProgress),
            4008 => Ok(Self::OrderNumberExists),

            5001 => Ok(Self::PaymentFailed),
            5002 => Ok(Self::PaymentNotCaptured),
            5003 => Ok(Self::PayoutAccountMissing),
            5004 => Ok(Self::TransferFailed),
            5005 => Ok(Self::RefundFailed),
            5006 => Ok(Self::PaymentTimeout),

            6001 => Ok(Self::MenuItemNotFound),
            6002 => Ok(Self::MenuItemUnavailable),
            6003 => Ok(Self::MenuItemWrongRestaurant),

            7001 => Ok(Self::CouponInvalid),
            7002 => Ok(Self::CouponNotStarted),
            7003 => Ok(Self::CouponExpired),
            7004 => Ok(Self::CouponMinOrderNotMet),
            7005 => Ok(Self::CouponUsageLimitReached),
            7006 => Ok(Self::CouponUserLimitReached),

            9001 => Ok(Self::InternalError),
            9002 => Ok(Self::DatabaseError),
            9003 => Ok(Self::ConfigError),
            9004 => Ok(Self::EventChannelClosed),

            _ => Err(InvalidErrorCode(value)),
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}
