//! File-backed connection store
//!
//! Keeps the registry in a JSON file so it survives gateway restarts.
//! Every mutation is written to disk before it becomes visible to `scan`.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::sync::RwLock;
use tracing::{debug, info};

use super::types::{Connection, ConnectionId, ConnectionStore};
use crate::error::StoreError;

/// Durable store persisted as a JSON array of connections
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    connections: RwLock<HashMap<ConnectionId, Connection>>,
}

impl FileStore {
    /// Open the store at `path`, loading any entries a previous run left behind
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();

        let connections = match tokio::fs::read(&path).await {
            Ok(bytes) if bytes.is_empty() => HashMap::new(),
            Ok(bytes) => {
                let entries: Vec<Connection> = serde_json::from_slice(&bytes)?;
                entries.into_iter().map(|c| (c.id.clone(), c)).collect()
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(e) => return Err(e.into()),
        };

        info!(
            path = %path.display(),
            entries = connections.len(),
            "Opened file-backed connection store"
        );

        Ok(Self {
            path,
            connections: RwLock::new(connections),
        })
    }

    /// Write the full map to a synced temp file and rename it over the store file
    async fn persist(&self, connections: &HashMap<ConnectionId, Connection>) -> Result<(), StoreError> {
        let mut entries: Vec<&Connection> = connections.values().collect();
        entries.sort_by(|a, b| a.id.cmp(&b.id));
        let bytes = serde_json::to_vec_pretty(&entries)?;

        let tmp_path = self.path.with_extension("tmp");
        let mut file = tokio::fs::File::create(&tmp_path).await?;
        file.write_all(&bytes).await?;
        // The rename must not land before the data does
        file.sync_all().await?;
        drop(file);
        tokio::fs::rename(&tmp_path, &self.path).await?;

        debug!(path = %self.path.display(), entries = entries.len(), "Persisted connection store");
        Ok(())
    }
}

#[async_trait]
impl ConnectionStore for FileStore {
    async fn put(&self, connection: Connection) -> Result<(), StoreError> {
        let mut connections = self.connections.write().await;
        let mut updated = connections.clone();
        updated.insert(connection.id.clone(), connection);

        self.persist(&updated).await?;
        *connections = updated;
        Ok(())
    }

    async fn delete(&self, id: &ConnectionId) -> Result<(), StoreError> {
        let mut connections = self.connections.write().await;
        if !connections.contains_key(id) {
            return Ok(());
        }

        let mut updated = connections.clone();
        updated.remove(id);

        self.persist(&updated).await?;
        *connections = updated;
        Ok(())
    }

    async fn scan(&self) -> Result<Vec<Connection>, StoreError> {
        let connections = self.connections.read().await;
        Ok(connections.values().cloned().collect())
    }

    fn backend_name(&self) -> &'static str {
        "file"
    }
}
