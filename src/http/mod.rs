//! HTTP Module
//!
//! axum front end: the WebSocket endpoint that feeds gateway events and the
//! read-only management routes.

pub mod api;
pub mod handlers;
pub mod server;
pub mod types;
pub mod websocket;

pub use api::GatewayApi;
pub use handlers::AppState;
pub use server::GatewayServer;
pub use types::*;
