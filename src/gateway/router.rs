//! Gateway event router

use std::sync::Arc;

use tracing::{debug, warn};

use crate::config::DeliveryConfig;
use crate::dispatch::{BroadcastDispatcher, BroadcastReport};
use crate::error::GatewayError;
use crate::lifecycle::LifecycleManager;
use crate::metrics::Metrics;
use crate::store::{Connection, ConnectionId, ConnectionStore};
use crate::transport::{Payload, Transport};

/// One event from the connection-oriented event source
#[derive(Debug, Clone)]
pub enum GatewayEvent {
    Connect { id: ConnectionId },
    Disconnect { id: ConnectionId },
    Message { id: ConnectionId, payload: Payload },
}

impl GatewayEvent {
    pub fn connection_id(&self) -> &ConnectionId {
        match self {
            GatewayEvent::Connect { id }
            | GatewayEvent::Disconnect { id }
            | GatewayEvent::Message { id, .. } => id,
        }
    }
}

/// Result of handling one event
#[derive(Debug, Clone)]
pub enum EventOutcome {
    Joined(Connection),
    Left,
    Broadcast(BroadcastReport),
}

/// Wires the store, lifecycle manager, dispatcher and metrics together
#[derive(Clone)]
pub struct Gateway {
    lifecycle: LifecycleManager,
    dispatcher: BroadcastDispatcher,
    metrics: Arc<Metrics>,
    prune_gone: bool,
}

impl Gateway {
    pub fn new(
        store: Arc<dyn ConnectionStore>,
        transport: Arc<dyn Transport>,
        metrics: Arc<Metrics>,
        delivery: &DeliveryConfig,
    ) -> Self {
        Self {
            lifecycle: LifecycleManager::new(Arc::clone(&store)),
            dispatcher: BroadcastDispatcher::new(store, transport),
            metrics,
            prune_gone: delivery.prune_gone,
        }
    }

    /// Handle one event. Only store failures are returned as errors.
    pub async fn handle(&self, event: GatewayEvent) -> Result<EventOutcome, GatewayError> {
        debug!(connection_id = %event.connection_id(), "Handling gateway event");
        match event {
            GatewayEvent::Connect { id } => self.connect(id).await.map(EventOutcome::Joined),
            GatewayEvent::Disconnect { id } => self.disconnect(&id).await.map(|_| EventOutcome::Left),
            GatewayEvent::Message { id, payload } => {
                self.message(&id, payload).await.map(EventOutcome::Broadcast)
            }
        }
    }

    pub async fn connect(&self, id: ConnectionId) -> Result<Connection, GatewayError> {
        let result = self.lifecycle.on_join(id).await;
        match &result {
            Ok(_) => self.metrics.record_join(),
            Err(_) => self.metrics.record_store_error(),
        }
        result
    }

    pub async fn disconnect(&self, id: &ConnectionId) -> Result<(), GatewayError> {
        let result = self.lifecycle.on_leave(id).await;
        match &result {
            Ok(()) => self.metrics.record_leave(),
            Err(_) => self.metrics.record_store_error(),
        }
        result
    }

    /// Fan `payload` out, then drop any recipient the transport reported gone
    pub async fn message(&self, sender: &ConnectionId, payload: Payload) -> Result<BroadcastReport, GatewayError> {
        let report = match self.dispatcher.on_message(sender, payload).await {
            Ok(report) => report,
            Err(e) => {
                self.metrics.record_store_error();
                return Err(e);
            }
        };
        self.metrics.record_broadcast(&report);

        if self.prune_gone {
            self.prune(&report).await;
        }

        Ok(report)
    }

    /// Remove gone recipients; a failed removal is logged and left for a later broadcast
    async fn prune(&self, report: &BroadcastReport) -> usize {
        let mut pruned = 0;
        for id in report.gone() {
            match self.lifecycle.on_gone(id).await {
                Ok(()) => {
                    self.metrics.record_pruned();
                    pruned += 1;
                }
                Err(e) => {
                    self.metrics.record_store_error();
                    warn!(connection_id = %id, error = %e, "Could not prune gone connection");
                }
            }
        }
        if pruned > 0 {
            debug!(pruned, "Prune pass complete");
        }
        pruned
    }

    pub fn lifecycle(&self) -> &LifecycleManager {
        &self.lifecycle
    }

    pub fn store(&self) -> &Arc<dyn ConnectionStore> {
        self.lifecycle.store()
    }

    pub fn metrics(&self) -> &Arc<Metrics> {
        &self.metrics
    }
}
