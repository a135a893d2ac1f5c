//! Settlement engine
//!
//! Money moves here, and only here. Two entry points: `settle_delivery`
//! pays out a delivered card order, `refund_cancellation` unwinds the
//! payment on a cancelled one. Both are idempotent at the order level and
//! every processor call is bounded by the configured timeout.

use crate::config::Config;
use crate::models::PaymentMethod;
use crate::payments::{IntentStatus, PaymentProcessor, ProcessorResult, Transfer};
use crate::storage::Storage;
use rust_decimal::Decimal;
use shared::error::{AppError, AppResult, ErrorCode};
use shared::money::round_yen;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use uuid::Uuid;

pub struct SettlementEngine {
    storage: Arc<dyn Storage>,
    processor: Arc<dyn PaymentProcessor>,
    config: Config,
}

impl std::fmt::Debug for SettlementEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SettlementEngine")
            .field("storage", &"<dyn Storage>")
            .field("processor", &"<dyn PaymentProcessor>")
            .finish()
    }
}

impl SettlementEngine {
    pub fn new(
        storage: Arc<dyn Storage>,
        processor: Arc<dyn PaymentProcessor>,
        config: Config,
    ) -> Self {
        Self {
            storage,
            processor,
            config,
        }
    }

    /// Pay out a delivered order
    ///
    /// The payout claim is taken before any money moves; once taken it
    /// stands whether or not the individual transfers succeed, so a
    /// redelivered event can never double-pay. A leg that fails is logged
    /// and surfaces in reconciliation as a claimed order missing its
    /// transfer reference.
    pub async fn settle_delivery(&self, order_id: Uuid) -> AppResult<()> {
        let order = self
            .storage
            .get_order(order_id)
            .await?
            .ok_or_else(|| AppError::new(ErrorCode::OrderNotFound))?;

        if !self.storage.claim_payout(order_id).await? {
            tracing::debug!(order_id = %order_id, "payout already claimed, skipping");
            return Ok(());
        }

        if order.payment_method == PaymentMethod::Cash {
            tracing::debug!(order_id = %order_id, "cash order, no transfers to issue");
            return Ok(());
        }
        if order.payment_intent_id.is_none() {
            tracing::error!(
                order_id = %order_id,
                order_number = %order.order_number,
                "card order has no payment intent, cannot settle"
            );
            return Ok(());
        }

        // Both legs group under the order number so they show up together
        // on the processor side
        let group = order.order_number.as_str();
        let mut restaurant_transfer: Option<String> = None;
        let mut driver_transfer: Option<String> = None;

        // Restaurant leg. The payout is recomputed from the stored subtotal
        // and commission rate; the snapshot payout field is display data,
        // not an input to money movement.
        match self.storage.get_restaurant(order.restaurant_id).await? {
            Some(restaurant) => {
                let payable = restaurant.payouts_enabled && restaurant.payout_account_id.is_some();
                if let (true, Some(account)) = (payable, restaurant.payout_account_id.as_deref()) {
                    let payout =
                        round_yen(order.subtotal * (Decimal::ONE - order.commission_rate));
                    match self
                        .bounded("create_transfer", self.processor.create_transfer(
                            payout, account, group,
                        ))
                        .await
                    {
                        Ok(transfer) => {
                            log_transfer("restaurant", order_id, &transfer);
                            restaurant_transfer = Some(transfer.id);
                        }
                        Err(err) => tracing::error!(
                            order_id = %order_id,
                            error = %err,
                            "restaurant transfer failed"
                        ),
                    }
                } else {
                    tracing::warn!(
                        order_id = %order_id,
                        restaurant_id = %order.restaurant_id,
                        "restaurant cannot receive payouts, transfer skipped"
                    );
                }
            }
            None => tracing::error!(
                order_id = %order_id,
                restaurant_id = %order.restaurant_id,
                "restaurant record missing at settlement"
            ),
        }

        // Driver leg is the delivery fee, passed through unchanged
        match order.driver_id {
            Some(driver_id) => match self.storage.get_driver(driver_id).await? {
                Some(driver) => {
                    let payable = driver.payouts_enabled && driver.payout_account_id.is_some();
                    if let (true, Some(account)) = (payable, driver.payout_account_id.as_deref()) {
                        match self
                            .bounded("create_transfer", self.processor.create_transfer(
                                order.delivery_fee,
                                account,
                                group,
                            ))
                            .await
                        {
                            Ok(transfer) => {
                                log_transfer("driver", order_id, &transfer);
                                driver_transfer = Some(transfer.id);
                            }
                            Err(err) => tracing::error!(
                                order_id = %order_id,
                                error = %err,
                                "driver transfer failed"
                            ),
                        }
                    } else {
                        tracing::warn!(
                            order_id = %order_id,
                            driver_id = %driver_id,
                            "driver cannot receive payouts, transfer skipped"
                        );
                    }
                }
                None => tracing::error!(
                    order_id = %order_id,
                    driver_id = %driver_id,
                    "driver record missing at settlement"
                ),
            },
            None => tracing::error!(
                order_id = %order_id,
                "delivered order has no driver assigned"
            ),
        }

        if restaurant_transfer.is_some() || driver_transfer.is_some() {
            self.storage
                .record_transfers(
                    order_id,
                    restaurant_transfer.as_deref(),
                    driver_transfer.as_deref(),
                )
                .await?;
        }

        tracing::info!(
            order_id = %order_id,
            order_number = %order.order_number,
            restaurant_transfer = ?restaurant_transfer,
            driver_transfer = ?driver_transfer,
            "settlement finished"
        );
        Ok(())
    }

    /// Unwind the payment on a cancelled order
    ///
    /// An uncaptured intent is cancelled outright; a captured one is
    /// refunded in full. Cash orders have nothing to unwind.
    pub async fn refund_cancellation(&self, order_id: Uuid) -> AppResult<()> {
        let order = self
            .storage
            .get_order(order_id)
            .await?
            .ok_or_else(|| AppError::new(ErrorCode::OrderNotFound))?;

        if order.payment_method == PaymentMethod::Cash {
            tracing::debug!(order_id = %order_id, "cash order, nothing to unwind");
            return Ok(());
        }
        let Some(intent_id) = order.payment_intent_id.as_deref() else {
            tracing::debug!(order_id = %order_id, "cancelled order has no payment intent");
            return Ok(());
        };

        let intent = self
            .bounded("retrieve_intent", self.processor.retrieve_intent(intent_id))
            .await?;

        if intent.status.is_cancellable() {
            let cancelled = self
                .bounded("cancel_intent", self.processor.cancel_intent(intent_id))
                .await?;
            tracing::info!(
                order_id = %order_id,
                intent_id = %intent_id,
                status = ?cancelled.status,
                "payment intent cancelled"
            );
        } else if intent.status == IntentStatus::Succeeded {
            let refund = self
                .bounded("create_refund", self.processor.create_refund(intent_id))
                .await?;
            tracing::info!(
                order_id = %order_id,
                refund_id = %refund.id,
                amount = %refund.amount,
                "payment refunded"
            );
        } else {
            tracing::debug!(
                order_id = %order_id,
                status = ?intent.status,
                "intent needs no unwinding"
            );
        }
        Ok(())
    }

    /// Processor call bounded by the configured timeout
    async fn bounded<T>(
        &self,
        call_name: &str,
        call: impl Future<Output = ProcessorResult<T>>,
    ) -> AppResult<T> {
        let limit = Duration::from_millis(self.config.processor_timeout_ms);
        match timeout(limit, call).await {
            Ok(result) => Ok(result?),
            Err(_) => {
                tracing::warn!(
                    call = call_name,
                    timeout_ms = self.config.processor_timeout_ms,
                    "processor call timed out"
                );
                Err(AppError::new(ErrorCode::PaymentTimeout).with_detail("call", call_name))
            }
        }
    }
}

fn log_transfer(leg: &str, order_id: Uuid, transfer: &Transfer) {
    tracing::info!(
        order_id = %order_id,
        leg,
        transfer_id = %transfer.id,
        amount = %transfer.amount,
        destination = %transfer.destination,
        "transfer issued"
    );
}
