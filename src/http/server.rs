//! Gateway Server

use super::{api::GatewayApi, handlers::AppState};
use crate::{
    config::Config,
    gateway::Gateway,
    metrics::Metrics,
    resource::ResourceManager,
    store::{self, ConnectionStore},
    transport::WebSocketTransport,
    Result,
};
use anyhow::Context;
use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::SystemTime;
use tokio::{net::TcpListener, sync::broadcast};
use tracing::{error, info};

/// HTTP + WebSocket server hosting the gateway
pub struct GatewayServer {
    config: Arc<Config>,
    app_state: AppState,
}

impl GatewayServer {
    /// Build the server with the store backend named in `config`
    pub async fn new(config: Config, shutdown: broadcast::Sender<()>) -> Result<Self> {
        let store = store::from_config(&config.store)
            .await
            .context("Failed to open connection store")?;
        let clear_on_startup = config.store.clear_on_startup;

        let server = Self::with_store(config, store, shutdown);
        if clear_on_startup {
            server
                .app_state
                .gateway
                .lifecycle()
                .clear_stale()
                .await
                .context("Failed to clear stale connections")?;
        }
        Ok(server)
    }

    /// Build the server around an existing store
    pub fn with_store(
        config: Config,
        store: Arc<dyn ConnectionStore>,
        shutdown: broadcast::Sender<()>,
    ) -> Self {
        let transport = Arc::new(WebSocketTransport::from_config(&config.delivery));
        let metrics = Arc::new(Metrics::new());
        let gateway = Gateway::new(store, transport.clone(), metrics, &config.delivery);

        let app_state = AppState {
            gateway,
            transport,
            resources: Arc::new(ResourceManager::new(config.server.max_connections)),
            shutdown,
            max_message_size: config.server.max_message_size,
            start_time: SystemTime::now(),
        };

        Self {
            config: Arc::new(config),
            app_state,
        }
    }

    pub fn router(&self) -> Router {
        GatewayApi::create_router(
            self.app_state.clone(),
            &self.config.server.ws_path,
            self.config.monitoring.management_api,
        )
    }

    pub fn state(&self) -> &AppState {
        &self.app_state
    }

    /// Bind the configured address
    pub async fn bind(&self) -> Result<TcpListener> {
        let bind_addr = self.config.server.bind_addr;
        TcpListener::bind(bind_addr)
            .await
            .with_context(|| format!("Failed to bind gateway server to {}", bind_addr))
    }

    /// Serve on `listener` until `shutdown` fires
    pub async fn serve(self, listener: TcpListener, mut shutdown: broadcast::Receiver<()>) -> Result<()> {
        let local_addr: SocketAddr = listener.local_addr()?;
        info!(
            "Gateway listening on {} (WebSocket path {})",
            local_addr, self.config.server.ws_path
        );

        let app = self.router();
        let graceful = async move {
            let _ = shutdown.recv().await;
            info!("Gateway server stopping");
        };

        if let Err(e) = axum::serve(listener, app).with_graceful_shutdown(graceful).await {
            error!("Gateway server error: {}", e);
            return Err(e.into());
        }

        Ok(())
    }
}
