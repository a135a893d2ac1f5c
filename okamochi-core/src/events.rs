//! Event routing and fan-out
//!
//! Decouples the order service from its consumers, each on its own channel:
//!
//! ```text
//! OrderService (broadcast)
//!        │
//!        └── EventRouter
//!               ├── mpsc ──────► SettlementWorker (terminal events) [critical]
//!               └── broadcast ─► realtime push subscribers [best-effort]
//! ```
//!
//! Settlement events move money, so they are forwarded with a blocking send
//! and never dropped. Realtime push is cosmetic; a slow subscriber lags and
//! misses frames, nothing else.

use shared::order::{EventPayload, OrderEvent, OrderEventType, RealtimeEvent};
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc};

/// Terminal events that trigger settlement work
const SETTLEMENT_EVENTS: &[OrderEventType] = &[
    OrderEventType::DeliveryCompleted,
    OrderEventType::OrderCancelled,
];

/// Consumer-side handles created together with the router
pub struct EventChannels {
    /// Settlement triggers, Arc-wrapped to avoid cloning full events
    pub settlement_rx: mpsc::Receiver<Arc<OrderEvent>>,
    /// Handle for attaching realtime push subscribers
    pub realtime_tx: broadcast::Sender<RealtimeEvent>,
}

/// Routes domain events from the service broadcast to per-consumer channels
pub struct EventRouter {
    settlement_tx: mpsc::Sender<Arc<OrderEvent>>,
    realtime_tx: broadcast::Sender<RealtimeEvent>,
}

impl EventRouter {
    pub fn new(settlement_buffer: usize, realtime_buffer: usize) -> (Self, EventChannels) {
        let (settlement_tx, settlement_rx) = mpsc::channel(settlement_buffer);
        let (realtime_tx, _) = broadcast::channel(realtime_buffer);

        let router = Self {
            settlement_tx,
            realtime_tx: realtime_tx.clone(),
        };
        let channels = EventChannels {
            settlement_rx,
            realtime_tx,
        };

        (router, channels)
    }

    /// Run until the source channel closes
    pub async fn run(self, mut source: broadcast::Receiver<OrderEvent>) {
        tracing::info!("event router started");

        loop {
            match source.recv().await {
                Ok(event) => self.dispatch(event).await,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    // a lagged router can silently miss settlement triggers
                    tracing::error!(
                        skipped,
                        "event router lagged, settlement triggers may be lost"
                    );
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::info!("source channel closed, event router stopping");
                    break;
                }
            }
        }
    }

    async fn dispatch(&self, event: OrderEvent) {
        let event = Arc::new(event);

        // Settlement first: blocking send so backpressure stalls the router
        // rather than dropping a payout trigger
        if SETTLEMENT_EVENTS.contains(&event.event_type)
            && self.settlement_tx.send(Arc::clone(&event)).await.is_err()
        {
            tracing::error!(
                event_type = %event.event_type,
                "settlement channel closed, payout trigger lost"
            );
        }

        // Realtime push: send fails only when nobody is subscribed
        if let Some(push) = realtime_from(&event.payload) {
            let _ = self.realtime_tx.send(push);
        }
    }
}

/// Outbound push event for a domain event, if tracking clients care about it
pub fn realtime_from(payload: &EventPayload) -> Option<RealtimeEvent> {
    match payload {
        EventPayload::StatusChanged {
            order_id,
            order_number,
            to,
            ..
        } => Some(RealtimeEvent::OrderStatusChanged {
            order_id: *order_id,
            order_number: order_number.clone(),
            status: *to,
        }),
        EventPayload::DriverLocationChanged {
            driver_id,
            latitude,
            longitude,
            timestamp,
        } => Some(RealtimeEvent::DriverLocationChanged {
            driver_id: *driver_id,
            latitude: *latitude,
            longitude: *longitude,
            timestamp: *timestamp,
        }),
        _ => None,
    }
}
