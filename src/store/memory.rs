//! In-memory connection store

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::types::{Connection, ConnectionId, ConnectionStore};
use crate::error::StoreError;

/// Process-local store; contents are lost on restart
#[derive(Debug, Default)]
pub struct MemoryStore {
    connections: RwLock<HashMap<ConnectionId, Connection>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of registered connections
    pub async fn len(&self) -> usize {
        self.connections.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.connections.read().await.is_empty()
    }

    pub async fn contains(&self, id: &ConnectionId) -> bool {
        self.connections.read().await.contains_key(id)
    }
}

#[async_trait]
impl ConnectionStore for MemoryStore {
    async fn put(&self, connection: Connection) -> Result<(), StoreError> {
        let mut connections = self.connections.write().await;
        connections.insert(connection.id.clone(), connection);
        Ok(())
    }

    async fn delete(&self, id: &ConnectionId) -> Result<(), StoreError> {
        self.connections.write().await.remove(id);
        Ok(())
    }

    async fn scan(&self) -> Result<Vec<Connection>, StoreError> {
        let connections = self.connections.read().await;
        Ok(connections.values().cloned().collect())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
