//! Gateway Routes

use super::{handlers::*, websocket::ws_handler};
use axum::{routing::get, Router};
use tower_http::cors::CorsLayer;

/// Gateway router
pub struct GatewayApi;

impl GatewayApi {
    /// Create the router: the WebSocket endpoint plus, optionally, management routes
    pub fn create_router(state: AppState, ws_path: &str, management_api: bool) -> Router {
        let mut router = Router::new().route(ws_path, get(ws_handler));

        if management_api {
            let api_routes = Router::new()
                .route("/status", get(get_status))
                .route("/connections", get(get_connections));

            router = router
                .route("/health", get(health_check))
                .route("/metrics", get(export_metrics))
                .nest("/api/v1", api_routes);
        }

        router
            .layer(CorsLayer::permissive())
            .with_state(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DeliveryConfig;
    use crate::gateway::Gateway;
    use crate::metrics::Metrics;
    use crate::resource::ResourceManager;
    use crate::store::{ConnectionStore, MemoryStore};
    use crate::transport::WebSocketTransport;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use std::sync::Arc;
    use std::time::SystemTime;
    use tokio::sync::broadcast;
    use tower::ServiceExt;

    fn create_test_state() -> AppState {
        let store: Arc<dyn ConnectionStore> = Arc::new(MemoryStore::new());
        let transport = Arc::new(WebSocketTransport::from_config(&DeliveryConfig::default()));
        let gateway = Gateway::new(
            store,
            transport.clone(),
            Arc::new(Metrics::new()),
            &DeliveryConfig::default(),
        );
        let (shutdown, _) = broadcast::channel(1);

        AppState {
            gateway,
            transport,
            resources: Arc::new(ResourceManager::new(8)),
            shutdown,
            max_message_size: 64 * 1024,
            start_time: SystemTime::now(),
        }
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let app = GatewayApi::create_router(create_test_state(), "/ws", true);

        let request = Request::builder()
            .uri("/health")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_management_routes_can_be_disabled() {
        let app = GatewayApi::create_router(create_test_state(), "/ws", false);

        let request = Request::builder()
            .uri("/api/v1/status")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_plain_get_on_ws_path_is_rejected() {
        let app = GatewayApi::create_router(create_test_state(), "/ws", true);

        let request = Request::builder()
            .uri("/ws")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert!(response.status().is_client_error());
    }
}
