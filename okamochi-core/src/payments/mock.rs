//! Recording mock of the payment processor
//!
//! Every call is recorded for inspection; failure and latency can be
//! injected per call site. Backs the settlement tests and local runs.

use super::{
    IntentStatus, PaymentIntent, PaymentProcessor, ProcessorError, ProcessorResult, Refund,
    Transfer,
};
use async_trait::async_trait;
use parking_lot::RwLock;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::time::Duration;
use uuid::Uuid;

#[derive(Default)]
struct MockState {
    intents: HashMap<String, PaymentIntent>,
    transfers: Vec<Transfer>,
    refunds: Vec<Refund>,
    fail_transfers: bool,
    fail_refunds: bool,
    transfer_delay: Option<Duration>,
}

/// In-memory processor double
pub struct MockProcessor {
    state: RwLock<MockState>,
}

impl MockProcessor {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(MockState::default()),
        }
    }

    /// Seed an intent in the given state, returning its id
    pub fn seed_intent(&self, status: IntentStatus, amount: Decimal) -> String {
        let id = format!("pi_{}", Uuid::new_v4().simple());
        self.state.write().intents.insert(
            id.clone(),
            PaymentIntent {
                id: id.clone(),
                amount,
                status,
            },
        );
        id
    }

    /// Make every subsequent transfer call fail
    pub fn fail_transfers(&self, fail: bool) {
        self.state.write().fail_transfers = fail;
    }

    /// Make every subsequent refund call fail
    pub fn fail_refunds(&self, fail: bool) {
        self.state.write().fail_refunds = fail;
    }

    /// Delay transfer calls, for exercising the settlement timeout
    pub fn delay_transfers(&self, delay: Duration) {
        self.state.write().transfer_delay = Some(delay);
    }

    /// Transfers issued so far
    pub fn transfers(&self) -> Vec<Transfer> {
        self.state.read().transfers.clone()
    }

    /// Refunds issued so far
    pub fn refunds(&self) -> Vec<Refund> {
        self.state.read().refunds.clone()
    }

    /// Current state of a seeded intent
    pub fn intent(&self, intent_id: &str) -> Option<PaymentIntent> {
        self.state.read().intents.get(intent_id).cloned()
    }
}

impl Default for MockProcessor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PaymentProcessor for MockProcessor {
    async fn create_intent(&self, amount: Decimal) -> ProcessorResult<PaymentIntent> {
        let id = format!("pi_{}", Uuid::new_v4().simple());
        let intent = PaymentIntent {
            id: id.clone(),
            amount,
            status: IntentStatus::RequiresCapture,
        };
        self.state.write().intents.insert(id, intent.clone());
        Ok(intent)
    }

    async fn retrieve_intent(&self, intent_id: &str) -> ProcessorResult<PaymentIntent> {
        self.state
            .read()
            .intents
            .get(intent_id)
            .cloned()
            .ok_or_else(|| ProcessorError::IntentNotFound(intent_id.to_string()))
    }

    async fn cancel_intent(&self, intent_id: &str) -> ProcessorResult<PaymentIntent> {
        let mut state = self.state.write();
        let intent = state
            .intents
            .get_mut(intent_id)
            .ok_or_else(|| ProcessorError::IntentNotFound(intent_id.to_string()))?;
        if !intent.status.is_cancellable() {
            return Err(ProcessorError::Rejected(format!(
                "intent {intent_id} is not in a cancellable state"
            )));
        }
        intent.status = IntentStatus::Canceled;
        Ok(intent.clone())
    }

    async fn create_refund(&self, intent_id: &str) -> ProcessorResult<Refund> {
        let mut state = self.state.write();
        if state.fail_refunds {
            return Err(ProcessorError::Unavailable("refund endpoint down".into()));
        }
        let intent = state
            .intents
            .get(intent_id)
            .cloned()
            .ok_or_else(|| ProcessorError::IntentNotFound(intent_id.to_string()))?;
        let refund = Refund {
            id: format!("re_{}", Uuid::new_v4().simple()),
            payment_intent_id: intent.id,
            amount: intent.amount,
        };
        state.refunds.push(refund.clone());
        Ok(refund)
    }

    async fn create_transfer(
        &self,
        amount: Decimal,
        destination: &str,
        transfer_group: &str,
    ) -> ProcessorResult<Transfer> {
        let delay = self.state.read().transfer_delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let mut state = self.state.write();
        if state.fail_transfers {
            return Err(ProcessorError::Unavailable("transfer endpoint down".into()));
        }
        let transfer = Transfer {
            id: format!("tr_{}", Uuid::new_v4().simple()),
            amount,
            destination: destination.to_string(),
            transfer_group: transfer_group.to_string(),
        };
        state.transfers.push(transfer.clone());
        Ok(transfer)
    }
}
