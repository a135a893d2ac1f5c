//! Payment processor contract
//!
//! The engine talks to the payment provider through [`PaymentProcessor`],
//! exactly five operations. Live credentials and HTTP plumbing live in the
//! embedding; [`MockProcessor`] backs tests.

mod mock;

pub use mock::MockProcessor;

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared::error::{AppError, ErrorCode};
use thiserror::Error;

/// Payment intent lifecycle states the engine reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentStatus {
    RequiresPaymentMethod,
    RequiresCapture,
    Processing,
    Succeeded,
    Canceled,
}

impl IntentStatus {
    /// Whether the intent can still be cancelled instead of refunded
    pub fn is_cancellable(&self) -> bool {
        matches!(self, Self::RequiresCapture | Self::Processing)
    }
}

/// Payment intent as reported by the processor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentIntent {
    pub id: String,
    /// Whole yen; the processor treats JPY as zero-decimal
    pub amount: Decimal,
    pub status: IntentStatus,
}

/// Issued payout transfer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transfer {
    pub id: String,
    pub amount: Decimal,
    /// Connected account receiving the funds
    pub destination: String,
    /// Correlation key linking an order's transfers (the order number)
    pub transfer_group: String,
}

/// Issued refund
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Refund {
    pub id: String,
    pub payment_intent_id: String,
    pub amount: Decimal,
}

/// Processor boundary errors
#[derive(Debug, Error)]
pub enum ProcessorError {
    #[error("payment intent not found: {0}")]
    IntentNotFound(String),

    #[error("processor rejected the request: {0}")]
    Rejected(String),

    #[error("processor unavailable: {0}")]
    Unavailable(String),
}

pub type ProcessorResult<T> = Result<T, ProcessorError>;

impl From<ProcessorError> for AppError {
    fn from(err: ProcessorError) -> Self {
        match err {
            ProcessorError::IntentNotFound(id) => {
                AppError::new(ErrorCode::PaymentNotCaptured).with_detail("payment_intent_id", id)
            }
            ProcessorError::Rejected(msg) => {
                AppError::with_message(ErrorCode::PaymentFailed, msg)
            }
            ProcessorError::Unavailable(msg) => {
                AppError::with_message(ErrorCode::PaymentFailed, msg)
            }
        }
    }
}

/// Narrow contract to the payment provider
#[async_trait]
pub trait PaymentProcessor: Send + Sync {
    /// Authorize a new payment intent for the given amount
    async fn create_intent(&self, amount: Decimal) -> ProcessorResult<PaymentIntent>;

    /// Current state of an existing intent
    async fn retrieve_intent(&self, intent_id: &str) -> ProcessorResult<PaymentIntent>;

    /// Cancel an intent that has not succeeded yet
    async fn cancel_intent(&self, intent_id: &str) -> ProcessorResult<PaymentIntent>;

    /// Refund a succeeded intent in full
    async fn create_refund(&self, intent_id: &str) -> ProcessorResult<Refund>;

    /// Move funds to a connected payout account
    async fn create_transfer(
        &self,
        amount: Decimal,
        destination: &str,
        transfer_group: &str,
    ) -> ProcessorResult<Transfer>;
}
