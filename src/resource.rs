//! Resource Management
//!
//! Caps the number of concurrently open client sockets.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::{debug, warn};

/// Hands out one slot per open socket, up to `max_connections`
pub struct ResourceManager {
    max_connections: usize,
    connection_semaphore: Arc<Semaphore>,
    stats: ResourceStats,
}

/// Resource usage statistics
#[derive(Debug, Default)]
pub struct ResourceStats {
    pub peak_connections: AtomicUsize,
    pub total_connections_created: AtomicUsize,
    pub total_connections_rejected: AtomicUsize,
}

/// Point-in-time copy of [`ResourceStats`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct ResourceSnapshot {
    pub active_connections: usize,
    pub max_connections: usize,
    pub peak_connections: usize,
    pub total_connections_created: usize,
    pub total_connections_rejected: usize,
}

impl ResourceManager {
    pub fn new(max_connections: usize) -> Self {
        Self {
            max_connections,
            connection_semaphore: Arc::new(Semaphore::new(max_connections)),
            stats: ResourceStats::default(),
        }
    }

    /// Try to acquire a connection slot without waiting
    pub fn acquire_connection_slot(&self) -> crate::Result<ConnectionSlot> {
        match Arc::clone(&self.connection_semaphore).try_acquire_owned() {
            Ok(permit) => {
                self.stats
                    .total_connections_created
                    .fetch_add(1, Ordering::Relaxed);

                let current = self.active_connections();
                self.stats.peak_connections.fetch_max(current, Ordering::Relaxed);

                debug!("Acquired connection slot, active connections: {}", current);
                Ok(ConnectionSlot { _permit: permit })
            }
            Err(_) => {
                self.stats
                    .total_connections_rejected
                    .fetch_add(1, Ordering::Relaxed);
                warn!(
                    "Connection limit reached ({}), rejecting connection",
                    self.max_connections
                );
                Err(anyhow::anyhow!("Connection limit reached"))
            }
        }
    }

    pub fn active_connections(&self) -> usize {
        self.max_connections - self.connection_semaphore.available_permits()
    }

    pub fn get_stats(&self) -> ResourceSnapshot {
        ResourceSnapshot {
            active_connections: self.active_connections(),
            max_connections: self.max_connections,
            peak_connections: self.stats.peak_connections.load(Ordering::Relaxed),
            total_connections_created: self.stats.total_connections_created.load(Ordering::Relaxed),
            total_connections_rejected: self.stats.total_connections_rejected.load(Ordering::Relaxed),
        }
    }
}

/// Held for the lifetime of one socket; dropping it frees the slot
#[derive(Debug)]
pub struct ConnectionSlot {
    _permit: OwnedSemaphorePermit,
}
