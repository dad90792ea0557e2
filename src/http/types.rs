//! Management API Types

use serde::Serialize;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::metrics::MetricsSnapshot;
use crate::resource::ResourceSnapshot;
use crate::store::Connection;

/// API response wrapper
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
    pub timestamp: SystemTime,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            timestamp: SystemTime::now(),
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message),
            timestamp: SystemTime::now(),
        }
    }
}

/// Health check result
#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: String,
    pub store_backend: String,
    pub store_reachable: bool,
}

/// Gateway status information
#[derive(Debug, Serialize)]
pub struct GatewayStatus {
    pub uptime_seconds: u64,
    pub version: String,
    pub store_backend: String,
    pub registered_connections: usize,
    pub open_sockets: usize,
    pub resources: ResourceSnapshot,
    pub counters: MetricsSnapshot,
}

/// One registry entry as exposed by `/api/v1/connections`
#[derive(Debug, Serialize)]
pub struct ConnectionEntry {
    pub id: String,
    pub connected_at_unix: u64,
}

impl From<Connection> for ConnectionEntry {
    fn from(connection: Connection) -> Self {
        let connected_at_unix = connection
            .connected_at
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();

        Self {
            id: connection.id.to_string(),
            connected_at_unix,
        }
    }
}
