//! Engine composition root
//!
//! Wires the order service, the event router, and the settlement worker
//! together and registers the long-running pieces with [`BackgroundTasks`]:
//!
//! ```text
//! OrderService ──broadcast──▶ EventRouter ──mpsc──▶ SettlementWorker
//!                                  │
//!                                  └─────broadcast──▶ realtime subscribers
//! ```
//!
//! Transports (HTTP handlers, push gateways) hold an [`Engine`] and reach
//! order operations through [`Engine::service`].

use std::sync::Arc;

use shared::RealtimeEvent;
use tokio::sync::broadcast;

use crate::config::Config;
use crate::events::{EventChannels, EventRouter};
use crate::orders::OrderService;
use crate::payments::PaymentProcessor;
use crate::settlement::{SettlementEngine, SettlementWorker};
use crate::storage::Storage;
use crate::tasks::{BackgroundTasks, TaskKind};

pub struct Engine {
    service: Arc<OrderService>,
    realtime_tx: broadcast::Sender<RealtimeEvent>,
    tasks: BackgroundTasks,
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("tasks", &self.tasks.len())
            .finish_non_exhaustive()
    }
}

impl Engine {
    /// Construct the service and spawn the event pipeline
    ///
    /// Must be called inside a Tokio runtime.
    pub fn start(
        storage: Arc<dyn Storage>,
        processor: Arc<dyn PaymentProcessor>,
        config: Config,
    ) -> Self {
        let service = Arc::new(OrderService::new(storage.clone(), config.clone()));

        let (router, channels) =
            EventRouter::new(config.settlement_buffer, config.realtime_buffer);
        let EventChannels {
            settlement_rx,
            realtime_tx,
        } = channels;

        let mut tasks = BackgroundTasks::new();

        let source = service.subscribe();
        tasks.spawn("event_router", TaskKind::Listener, async move {
            router.run(source).await;
        });

        let settlement = SettlementEngine::new(storage, processor, config);
        let worker = SettlementWorker::new(settlement);
        tasks.spawn("settlement_worker", TaskKind::Worker, async move {
            worker.run(settlement_rx).await;
        });

        tracing::info!(tasks = tasks.len(), "engine started");

        Self {
            service,
            realtime_tx,
            tasks,
        }
    }

    /// Order operations entry point
    pub fn service(&self) -> &Arc<OrderService> {
        &self.service
    }

    /// Subscribe to outbound realtime pushes
    pub fn subscribe_realtime(&self) -> broadcast::Receiver<RealtimeEvent> {
        self.realtime_tx.subscribe()
    }

    /// Count background tasks that have stopped unexpectedly
    pub fn check_health(&self) -> usize {
        self.tasks.check_health()
    }

    /// Stop the engine and wait for the pipeline to drain
    ///
    /// Dropping the engine's service handle closes the event channels, which
    /// lets the router and worker exit. Service handles still held by callers
    /// keep the pipeline open until they drop too.
    pub async fn shutdown(self) {
        let Engine {
            service,
            realtime_tx,
            tasks,
        } = self;
        drop(service);
        drop(realtime_tx);
        tasks.shutdown().await;
    }
}
