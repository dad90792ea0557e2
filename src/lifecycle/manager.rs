//! Lifecycle Manager Implementation

use std::sync::Arc;

use tracing::{debug, error, info, instrument};

use crate::error::GatewayError;
use crate::store::{Connection, ConnectionId, ConnectionStore};

/// Applies join/leave transitions to the connection store
#[derive(Clone)]
pub struct LifecycleManager {
    store: Arc<dyn ConnectionStore>,
}

impl LifecycleManager {
    pub fn new(store: Arc<dyn ConnectionStore>) -> Self {
        Self { store }
    }

    /// Register `id` as reachable. A repeated join overwrites the entry.
    #[instrument(skip_all, fields(connection_id = %id))]
    pub async fn on_join(&self, id: ConnectionId) -> Result<Connection, GatewayError> {
        let connection = Connection::new(id);

        if let Err(e) = self.store.put(connection.clone()).await {
            error!(backend = self.store.backend_name(), error = %e, "Failed to register connection");
            return Err(e.into());
        }

        info!("Connection joined");
        Ok(connection)
    }

    /// Remove `id` from the store. Leaving an absent id succeeds.
    #[instrument(skip_all, fields(connection_id = %id))]
    pub async fn on_leave(&self, id: &ConnectionId) -> Result<(), GatewayError> {
        if let Err(e) = self.store.delete(id).await {
            error!(backend = self.store.backend_name(), error = %e, "Failed to remove connection");
            return Err(e.into());
        }

        info!("Connection left");
        Ok(())
    }

    /// Remove a connection the transport reported as gone during delivery
    #[instrument(skip_all, fields(connection_id = %id))]
    pub async fn on_gone(&self, id: &ConnectionId) -> Result<(), GatewayError> {
        self.store.delete(id).await.map_err(|e| {
            error!(backend = self.store.backend_name(), error = %e, "Failed to prune gone connection");
            GatewayError::from(e)
        })?;

        debug!("Pruned gone connection");
        Ok(())
    }

    /// Drop every entry left behind by a previous run. Returns how many were removed.
    pub async fn clear_stale(&self) -> Result<usize, GatewayError> {
        let stale = self.store.scan().await.map_err(|e| {
            error!(backend = self.store.backend_name(), error = %e, "Failed to read stale connections");
            GatewayError::from(e)
        })?;

        for connection in &stale {
            self.store.delete(&connection.id).await?;
        }

        info!(cleared = stale.len(), "Cleared stale connections");
        Ok(stale.len())
    }

    pub fn store(&self) -> &Arc<dyn ConnectionStore> {
        &self.store
    }
}
