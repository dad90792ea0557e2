//! Transport Module
//!
//! The push-delivery seam between the dispatcher and live client sockets.

pub mod types;
pub mod websocket;

pub use types::{DeliveryError, Payload, Transport};
pub use websocket::WebSocketTransport;
