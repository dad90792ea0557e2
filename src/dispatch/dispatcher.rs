//! Broadcast Dispatcher Implementation
//!
//! Enumerates the store once per message and pushes the payload to every
//! entry concurrently. The snapshot is not synchronized with concurrent
//! joins and leaves: a racing joiner may miss the message and a racing
//! leaver shows up as an absorbed delivery failure.

use std::sync::Arc;
use std::time::Instant;

use futures::future::join_all;
use tracing::{debug, error, info, instrument, warn};

use super::report::{BroadcastReport, DeliveryFailure};
use crate::error::GatewayError;
use crate::store::{ConnectionId, ConnectionStore};
use crate::transport::{Payload, Transport};

/// Fans inbound messages out to every registered connection
#[derive(Clone)]
pub struct BroadcastDispatcher {
    store: Arc<dyn ConnectionStore>,
    transport: Arc<dyn Transport>,
}

impl BroadcastDispatcher {
    pub fn new(store: Arc<dyn ConnectionStore>, transport: Arc<dyn Transport>) -> Self {
        Self { store, transport }
    }

    /// Deliver `payload` to every registered connection, the sender included.
    ///
    /// Fails only when the store cannot be enumerated. Per-target failures
    /// are logged and returned in the report.
    #[instrument(skip_all, fields(sender = %sender, bytes = payload.len()))]
    pub async fn on_message(
        &self,
        sender: &ConnectionId,
        payload: Payload,
    ) -> Result<BroadcastReport, GatewayError> {
        let started = Instant::now();

        let snapshot = self.store.scan().await.map_err(|e| {
            error!(backend = self.store.backend_name(), error = %e, "Failed to enumerate connections");
            GatewayError::from(e)
        })?;

        debug!(recipients = snapshot.len(), "Broadcasting message");

        let attempts = snapshot.into_iter().map(|connection| {
            let transport = Arc::clone(&self.transport);
            let payload = payload.clone();
            async move {
                let result = transport.deliver_to(&connection.id, payload).await;
                (connection.id, result)
            }
        });

        let mut delivered = Vec::new();
        let mut failures = Vec::new();
        for (target, result) in join_all(attempts).await {
            match result {
                Ok(()) => delivered.push(target),
                Err(error) => {
                    let failure = DeliveryFailure { target, error };
                    warn!(error = %GatewayError::from(failure.clone()), "Failed to deliver message");
                    failures.push(failure);
                }
            }
        }

        let report = BroadcastReport {
            sender: sender.clone(),
            delivered,
            failures,
            elapsed: started.elapsed(),
        };

        info!(
            delivered = report.delivered.len(),
            failed = report.failures.len(),
            elapsed = ?report.elapsed,
            "Broadcast complete"
        );

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{Connection, MemoryStore};
    use crate::transport::DeliveryError;
    use async_trait::async_trait;
    use std::collections::HashSet;
    use tokio::sync::Mutex;

    #[derive(Default)]
    struct RecordingTransport {
        failing: HashSet<ConnectionId>,
        sent: Mutex<Vec<(ConnectionId, Payload)>>,
    }

    #[async_trait]
    impl Transport for RecordingTransport {
        async fn deliver_to(&self, target: &ConnectionId, payload: Payload) -> Result<(), DeliveryError> {
            if self.failing.contains(target) {
                return Err(DeliveryError::Gone);
            }
            self.sent.lock().await.push((target.clone(), payload));
            Ok(())
        }
    }

    async fn store_with(ids: &[&str]) -> Arc<MemoryStore> {
        let store = Arc::new(MemoryStore::new());
        for id in ids {
            store.put(Connection::new((*id).into())).await.unwrap();
        }
        store
    }

    #[tokio::test]
    async fn test_empty_store_delivers_nothing() {
        let transport = Arc::new(RecordingTransport::default());
        let dispatcher = BroadcastDispatcher::new(store_with(&[]).await, transport.clone());

        let report = dispatcher.on_message(&"a".into(), Payload::from("x")).await.unwrap();

        assert_eq!(report.recipients(), 0);
        assert!(transport.sent.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_sender_receives_own_message() {
        let transport = Arc::new(RecordingTransport::default());
        let dispatcher = BroadcastDispatcher::new(store_with(&["a"]).await, transport.clone());

        let report = dispatcher.on_message(&"a".into(), Payload::from("echo")).await.unwrap();

        assert_eq!(report.delivered, vec![ConnectionId::from("a")]);
        let sent = transport.sent.lock().await;
        assert_eq!(sent.as_slice(), &[(ConnectionId::from("a"), Payload::from("echo"))]);
    }

    #[tokio::test]
    async fn test_failing_target_is_isolated() {
        let transport = Arc::new(RecordingTransport {
            failing: HashSet::from([ConnectionId::from("c")]),
            ..Default::default()
        });
        let dispatcher = BroadcastDispatcher::new(store_with(&["a", "b", "c"]).await, transport.clone());

        let report = dispatcher.on_message(&"b".into(), Payload::from("hello")).await.unwrap();

        let mut delivered = report.delivered.clone();
        delivered.sort();
        assert_eq!(delivered, vec![ConnectionId::from("a"), ConnectionId::from("b")]);
        assert_eq!(
            report.failures,
            vec![DeliveryFailure {
                target: "c".into(),
                error: DeliveryError::Gone,
            }]
        );
        assert_eq!(transport.sent.lock().await.len(), 2);
    }
}
