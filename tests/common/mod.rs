//! Shared fakes for integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use fanout_gateway::store::{Connection, ConnectionId, ConnectionStore, MemoryStore};
use fanout_gateway::transport::{DeliveryError, Payload, Transport};
use fanout_gateway::StoreError;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

/// Transport that records every delivery and fails on demand
#[derive(Default)]
pub struct RecordingTransport {
    failures: Mutex<HashMap<ConnectionId, DeliveryError>>,
    stalls: Mutex<HashMap<ConnectionId, Duration>>,
    sent: Mutex<Vec<(ConnectionId, Payload)>>,
}

impl RecordingTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub async fn fail(&self, id: &str, error: DeliveryError) {
        self.failures.lock().await.insert(id.into(), error);
    }

    pub async fn stall(&self, id: &str, delay: Duration) {
        self.stalls.lock().await.insert(id.into(), delay);
    }

    pub async fn sent(&self) -> Vec<(ConnectionId, Payload)> {
        self.sent.lock().await.clone()
    }

    /// Payloads received by `id`, in delivery order
    pub async fn received_by(&self, id: &str) -> Vec<Payload> {
        let id = ConnectionId::from(id);
        self.sent
            .lock()
            .await
            .iter()
            .filter(|(target, _)| *target == id)
            .map(|(_, payload)| payload.clone())
            .collect()
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn deliver_to(&self, target: &ConnectionId, payload: Payload) -> Result<(), DeliveryError> {
        let stall = self.stalls.lock().await.get(target).copied();
        if let Some(delay) = stall {
            tokio::time::sleep(delay).await;
        }

        if let Some(error) = self.failures.lock().await.get(target).cloned() {
            return Err(error);
        }

        self.sent.lock().await.push((target.clone(), payload));
        Ok(())
    }
}

/// Store wrapper that can be switched offline to simulate an unreachable backend,
/// or made to reject only deletes
#[derive(Default)]
pub struct SwitchableStore {
    inner: MemoryStore,
    offline: AtomicBool,
    deletes_failing: AtomicBool,
}

impl SwitchableStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Reads and puts keep working; every delete fails
    pub fn set_deletes_failing(&self, failing: bool) {
        self.deletes_failing.store(failing, Ordering::SeqCst);
    }

    fn check(&self) -> Result<(), StoreError> {
        if self.offline.load(Ordering::SeqCst) {
            Err(StoreError::Unavailable("store switched offline".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl ConnectionStore for SwitchableStore {
    async fn put(&self, connection: Connection) -> Result<(), StoreError> {
        self.check()?;
        self.inner.put(connection).await
    }

    async fn delete(&self, id: &ConnectionId) -> Result<(), StoreError> {
        self.check()?;
        if self.deletes_failing.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("delete rejected".to_string()));
        }
        self.inner.delete(id).await
    }

    async fn scan(&self) -> Result<Vec<Connection>, StoreError> {
        self.check()?;
        self.inner.scan().await
    }

    fn backend_name(&self) -> &'static str {
        "switchable"
    }
}

/// Sorted ids currently in `store`
pub async fn members(store: &dyn ConnectionStore) -> Vec<ConnectionId> {
    let mut ids: Vec<_> = store
        .scan()
        .await
        .expect("scan failed")
        .into_iter()
        .map(|c| c.id)
        .collect();
    ids.sort();
    ids
}

pub fn ids(raw: &[&str]) -> Vec<ConnectionId> {
    raw.iter().map(|id| ConnectionId::from(*id)).collect()
}
