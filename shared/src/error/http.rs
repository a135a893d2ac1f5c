//! HTTP status code mapping for error codes

use super::codes::ErrorCode;
use http::StatusCode;

impl ErrorCode {
    /// Get the appropriate HTTP status code for this error code
    ///
    /// This is the synchronous signal boundary adapters surface to callers;
    /// settlement-side payment errors are logged instead of surfaced, so
    /// their 5xx mappings only matter for operational tooling.
    pub fn http_status(&self) -> StatusCode {
        match self {
            // Success
            Self::Success => StatusCode::OK,

            // 404 Not Found (includes not-owned resources, which are
            // indistinguishable from absent ones for the caller)
            Self::NotFound
            | Self::RestaurantNotFound
            | Self::DriverNotFound
            | Self::CustomerNotFound
            | Self::AddressNotFound
            | Self::OrderNotFound
            | Self::MenuItemNotFound
            | Self::CouponInvalid => StatusCode::NOT_FOUND,

            // 409 Conflict (lost races, uniqueness violations)
            Self::AlreadyExists
            | Self::OrderAlreadyAssigned
            | Self::DeliveryInProgress
            | Self::OrderNumberExists => StatusCode::CONFLICT,

            // 403 Forbidden
            Self::PermissionDenied | Self::ActorNotAllowed => StatusCode::FORBIDDEN,

            // 502 Bad Gateway (upstream payment processor failures)
            Self::PaymentFailed
            | Self::PaymentNotCaptured
            | Self::TransferFailed
            | Self::RefundFailed => StatusCode::BAD_GATEWAY,

            // 503 Service Unavailable (transient, client can retry)
            Self::PaymentTimeout => StatusCode::SERVICE_UNAVAILABLE,

            // 500 Internal Server Error
            Self::InternalError
            | Self::DatabaseError
            | Self::ConfigError
            | Self::EventChannelClosed => StatusCode::INTERNAL_SERVER_ERROR,

            // 400 Bad Request (default for validation/business errors)
            _ => StatusCode::BAD_REQUEST,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_status() {
        assert_eq!(ErrorCode::Success.http_status(), StatusCode::OK);
    }

    #[test]
    fn test_not_found_status() {
        assert_eq!(ErrorCode::OrderNotFound.http_status(), StatusCode::NOT_FOUND);
        assert_eq!(ErrorCode::AddressNotFound.http_status(), StatusCode::NOT_FOUND);
        assert_eq!(ErrorCode::MenuItemNotFound.http_status(), StatusCode::NOT_FOUND);
        assert_eq!(ErrorCode::CouponInvalid.http_status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_conflict_status() {
        assert_eq!(
            ErrorCode::OrderAlreadyAssigned.http_status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ErrorCode::OrderNumberExists.http_status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ErrorCode::DeliveryInProgress.http_status(),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn test_forbidden_status() {
        assert_eq!(
            ErrorCode::PermissionDenied.http_status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            ErrorCode::ActorNotAllowed.http_status(),
            StatusCode::FORBIDDEN
        );
    }

    #[test]
    fn test_payment_status() {
        assert_eq!(ErrorCode::PaymentFailed.http_status(), StatusCode::BAD_GATEWAY);
        assert_eq!(ErrorCode::TransferFailed.http_status(), StatusCode::BAD_GATEWAY);
        assert_eq!(
            ErrorCode::PaymentTimeout.http_status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn test_internal_error_status() {
        assert_eq!(
            ErrorCode::InternalError.http_status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ErrorCode::DatabaseError.http_status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_bad_request_status() {
        // Validation and business rule errors default to 400
        assert_eq!(
            ErrorCode::ValidationFailed.http_status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ErrorCode::InvalidTransition.http_status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(ErrorCode::PinIncorrect.http_status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            ErrorCode::CouponMinOrderNotMet.http_status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ErrorCode::MenuItemUnavailable.http_status(),
            StatusCode::BAD_REQUEST
        );
    }
}
