//! Settlement worker
//!
//! Consumes terminal events from the router and drives the engine. The
//! worker never fails the order that produced an event; an engine error is
//! logged and the order stays flagged for manual reconciliation.

use super::SettlementEngine;
use shared::order::{EventPayload, OrderEvent};
use std::sync::Arc;
use tokio::sync::mpsc;

pub struct SettlementWorker {
    engine: SettlementEngine,
}

impl SettlementWorker {
    pub fn new(engine: SettlementEngine) -> Self {
        Self { engine }
    }

    /// Run until the settlement channel closes
    pub async fn run(self, mut event_rx: mpsc::Receiver<Arc<OrderEvent>>) {
        tracing::info!("settlement worker started");

        while let Some(event) = event_rx.recv().await {
            self.handle(event.as_ref()).await;
        }

        tracing::info!("settlement channel closed, settlement worker stopping");
    }

    async fn handle(&self, event: &OrderEvent) {
        match &event.payload {
            EventPayload::DeliveryCompleted { order_id } => {
                tracing::debug!(order_id = %order_id, "processing delivery settlement");
                if let Err(err) = self.engine.settle_delivery(*order_id).await {
                    tracing::error!(
                        order_id = %order_id,
                        error = %err,
                        "settlement failed, order left for manual reconciliation"
                    );
                }
            }
            EventPayload::OrderCancelled { order_id, .. } => {
                tracing::debug!(order_id = %order_id, "processing cancellation unwind");
                if let Err(err) = self.engine.refund_cancellation(*order_id).await {
                    tracing::error!(
                        order_id = %order_id,
                        error = %err,
                        "refund failed, order left for manual reconciliation"
                    );
                }
            }
            // the router only forwards terminal events; anything else is a
            // routing bug worth seeing in logs
            other => tracing::warn!(
                event_type = %other.event_type(),
                "settlement worker received non-terminal event"
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orders::testutil::{order_at, world};
    use crate::payments::MockProcessor;
    use rust_decimal::Decimal;
    use shared::order::OrderStatus;
    use std::time::Duration;

    #[tokio::test]
    async fn test_worker_settles_from_channel() {
        let w = world().await;
        let processor = Arc::new(MockProcessor::new());
        let engine = SettlementEngine::new(
            w.storage.clone(),
            processor.clone(),
            w.service.config().clone(),
        );

        let order = order_at(&w, OrderStatus::Delivered).await;

        let (tx, rx) = mpsc::channel(4);
        let worker = tokio::spawn(SettlementWorker::new(engine).run(rx));

        tx.send(Arc::new(OrderEvent::new(EventPayload::DeliveryCompleted {
            order_id: order.id,
        })))
        .await
        .unwrap();
        drop(tx);
        worker.await.unwrap();

        let transfers = processor.transfers();
        assert_eq!(transfers.len(), 2);
        assert_eq!(
            transfers.iter().map(|t| t.amount).sum::<Decimal>(),
            Decimal::from(1925)
        );
    }

    #[tokio::test]
    async fn test_engine_error_does_not_stop_worker() {
        let w = world().await;
        let processor = Arc::new(MockProcessor::new());
        let engine = SettlementEngine::new(
            w.storage.clone(),
            processor.clone(),
            w.service.config().clone(),
        );

        let order = order_at(&w, OrderStatus::Delivered).await;

        let (tx, rx) = mpsc::channel(4);
        let worker = tokio::spawn(SettlementWorker::new(engine).run(rx));

        // unknown order fails inside the engine; the worker keeps going
        tx.send(Arc::new(OrderEvent::new(EventPayload::DeliveryCompleted {
            order_id: uuid::Uuid::new_v4(),
        })))
        .await
        .unwrap();
        tx.send(Arc::new(OrderEvent::new(EventPayload::DeliveryCompleted {
            order_id: order.id,
        })))
        .await
        .unwrap();
        drop(tx);

        tokio::time::timeout(Duration::from_secs(5), worker)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(processor.transfers().len(), 2);
    }
}
