//! fanout-gateway
//!
//! Real-time WebSocket fan-out: every message a client sends is pushed to
//! every connection currently in the registry, the sender included.
//!
//! The registry ([`store::ConnectionStore`]) is written only by the
//! [`lifecycle::LifecycleManager`] and enumerated by the
//! [`dispatch::BroadcastDispatcher`], which reaches clients through a
//! [`transport::Transport`]. Delivery is best-effort and per-target
//! failures never fail a broadcast.

pub mod config;
pub mod dispatch;
pub mod error;
pub mod gateway;
pub mod http;
pub mod lifecycle;
pub mod metrics;
pub mod resource;
pub mod shutdown;
pub mod store;
pub mod transport;

pub use config::Config;
pub use dispatch::{BroadcastDispatcher, BroadcastReport};
pub use error::{GatewayError, StoreError};
pub use gateway::{Gateway, GatewayEvent};
pub use lifecycle::LifecycleManager;
pub use http::GatewayServer;
pub use shutdown::ShutdownCoordinator;

/// Result type for bootstrap and server code
pub type Result<T> = anyhow::Result<T>;
