//! Management API Handlers

use super::types::*;
use crate::gateway::Gateway;
use crate::resource::ResourceManager;
use crate::transport::WebSocketTransport;
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use std::sync::Arc;
use std::time::SystemTime;
use tokio::sync::broadcast;
use tracing::error;

/// Shared application state for handlers
#[derive(Clone)]
pub struct AppState {
    pub gateway: Gateway,
    pub transport: Arc<WebSocketTransport>,
    pub resources: Arc<ResourceManager>,
    pub shutdown: broadcast::Sender<()>,
    pub max_message_size: usize,
    pub start_time: SystemTime,
}

type ApiError = (StatusCode, Json<ApiResponse<()>>);

fn store_unavailable(e: impl std::fmt::Display) -> ApiError {
    (
        StatusCode::SERVICE_UNAVAILABLE,
        Json(ApiResponse::error(e.to_string())),
    )
}

/// Health check handler; degraded when the store cannot be scanned
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let store = state.gateway.store();
    let store_reachable = store.scan().await.is_ok();

    let health = HealthStatus {
        status: if store_reachable { "healthy" } else { "degraded" }.to_string(),
        store_backend: store.backend_name().to_string(),
        store_reachable,
    };

    let code = if store_reachable {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (code, Json(ApiResponse::success(health)))
}

/// Get gateway status
pub async fn get_status(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<GatewayStatus>>, ApiError> {
    let uptime = SystemTime::now()
        .duration_since(state.start_time)
        .unwrap_or_default()
        .as_secs();

    let store = state.gateway.store();
    let registered = store.scan().await.map_err(|e| {
        error!(error = %e, "Status request could not read the connection store");
        store_unavailable(e)
    })?;

    let status = GatewayStatus {
        uptime_seconds: uptime,
        version: env!("CARGO_PKG_VERSION").to_string(),
        store_backend: store.backend_name().to_string(),
        registered_connections: registered.len(),
        open_sockets: state.transport.live_count().await,
        resources: state.resources.get_stats(),
        counters: state.gateway.metrics().snapshot(),
    };

    Ok(Json(ApiResponse::success(status)))
}

/// List every registered connection
pub async fn get_connections(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<ConnectionEntry>>>, ApiError> {
    let mut connections = state.gateway.store().scan().await.map_err(|e| {
        error!(error = %e, "Connection listing could not read the connection store");
        store_unavailable(e)
    })?;
    connections.sort_by(|a, b| a.id.cmp(&b.id));

    let entries = connections.into_iter().map(ConnectionEntry::from).collect();
    Ok(Json(ApiResponse::success(entries)))
}

/// Prometheus scrape endpoint
pub async fn export_metrics(State(state): State<AppState>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4; charset=utf-8")],
        state.gateway.metrics().export_prometheus(),
    )
}
