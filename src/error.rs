//! Gateway Error Types
//!
//! Typed errors for the registry and broadcast paths. Bootstrap code
//! (config loading, server start) uses `anyhow` via [`crate::Result`].

use thiserror::Error;

use crate::store::ConnectionId;
use crate::transport::DeliveryError;

/// Failure reported by a [`crate::store::ConnectionStore`] backend
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("store data is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),

    #[error("store backend unavailable: {0}")]
    Unavailable(String),
}

/// Errors surfaced by the lifecycle manager and the broadcast dispatcher
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The connection registry could not be read or written
    #[error("connection store unavailable: {0}")]
    StoreUnavailable(#[from] StoreError),

    /// A single recipient could not be reached
    #[error("delivery to {target} failed: {source}")]
    DeliveryFailure {
        target: ConnectionId,
        #[source]
        source: DeliveryError,
    },
}

impl GatewayError {
    /// Whether this error came from the connection store
    pub fn is_store_unavailable(&self) -> bool {
        matches!(self, GatewayError::StoreUnavailable(_))
    }
}
