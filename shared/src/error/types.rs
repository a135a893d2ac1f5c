//! Application error and result types

use super::codes::ErrorCode;
use crate::error::ErrorCategory;
use crate::order::OrderStatus;
use http::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use thiserror::Error;

/// Result type used across the platform
pub type AppResult<T> = Result<T, AppError>;

/// Rich application error carrying a standardized code, a human-readable
/// message, and optional structured details
#[derive(Debug, Clone, Error, Serialize, Deserialize)]
#[error("{message}")]
pub struct AppError {
    /// Standardized error code
    pub code: ErrorCode,
    /// Human-readable message
    pub message: String,
    /// Optional structured details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<HashMap<String, Value>>,
}

impl AppError {
    /// Create an error with the code's default message
    pub fn new(code: ErrorCode) -> Self {
        Self {
            code,
            message: code.message().to_string(),
            details: None,
        }
    }

    /// Create an error with a custom message
    pub fn with_message(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    /// Attach a structured detail entry
    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.details
            .get_or_insert_with(HashMap::new)
            .insert(key.into(), value.into());
        self
    }

    // ========== Convenience constructors ==========

    /// Input validation failure
    pub fn validation(message: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::ValidationFailed, message)
    }

    /// Generic not-found with a resource name
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::NotFound, format!("{} not found", resource.into()))
    }

    /// Permission failure
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::PermissionDenied, message)
    }

    /// Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::InternalError, message)
    }

    /// Storage-layer error
    pub fn database(message: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::DatabaseError, message)
    }

    /// Transition rejected because the (current, requested) pair is not in
    /// the transition table; names both states in message and details
    pub fn invalid_transition(current: OrderStatus, requested: OrderStatus) -> Self {
        Self::with_message(
            ErrorCode::InvalidTransition,
            format!("Cannot transition from {} to {}", current, requested),
        )
        .with_detail("current", current.as_str())
        .with_detail("requested", requested.as_str())
    }

    // ========== Inspection ==========

    /// Error category derived from the code range
    pub fn category(&self) -> ErrorCategory {
        self.code.category()
    }

    /// HTTP status signal for boundary adapters
    pub fn http_status(&self) -> StatusCode {
        self.code.http_status()
    }
}

/// Embeddings bubble arbitrary errors to the boundary; they surface as
/// internal errors
impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self::internal(err.to_string())
    }
}
