//! Connection Store Types

use std::fmt;
use std::time::SystemTime;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::StoreError;

/// Opaque identifier assigned by the transport at connect time
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectionId(String);

impl ConnectionId {
    /// Generate a fresh random identifier
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ConnectionId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for ConnectionId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// One live client session as recorded in the registry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connection {
    pub id: ConnectionId,
    pub connected_at: SystemTime,
}

impl Connection {
    pub fn new(id: ConnectionId) -> Self {
        Self {
            id,
            connected_at: SystemTime::now(),
        }
    }
}

/// Key-value registry of reachable connections
///
/// Implementations must tolerate concurrent `put`/`delete`/`scan` calls.
/// No cross-key atomicity is required: `scan` may or may not observe
/// writes that race with it.
#[async_trait]
pub trait ConnectionStore: Send + Sync {
    /// Insert or overwrite the entry for `connection.id`
    async fn put(&self, connection: Connection) -> Result<(), StoreError>;

    /// Remove the entry for `id`; removing an absent id succeeds
    async fn delete(&self, id: &ConnectionId) -> Result<(), StoreError>;

    /// Snapshot of every registered connection
    async fn scan(&self) -> Result<Vec<Connection>, StoreError>;

    /// Short backend name for logs and status output
    fn backend_name(&self) -> &'static str;
}
