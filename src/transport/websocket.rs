//! WebSocket push transport
//!
//! Each accepted socket registers a bounded outbound queue here; the socket's
//! writer task drains it. Delivery is a timed send into that queue.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc::{self, error::SendTimeoutError};
use tokio::sync::RwLock;
use tracing::debug;

use super::types::{DeliveryError, Payload, Transport};
use crate::config::DeliveryConfig;
use crate::store::ConnectionId;

/// Transport backed by per-connection channels to live WebSocket writers
pub struct WebSocketTransport {
    channels: RwLock<HashMap<ConnectionId, mpsc::Sender<Payload>>>,
    channel_capacity: usize,
    send_timeout: Duration,
}

impl WebSocketTransport {
    pub fn new(channel_capacity: usize, send_timeout: Duration) -> Self {
        Self {
            channels: RwLock::new(HashMap::new()),
            channel_capacity,
            send_timeout,
        }
    }

    pub fn from_config(config: &DeliveryConfig) -> Self {
        Self::new(config.channel_capacity, config.send_timeout)
    }

    /// Open the outbound queue for a newly accepted socket
    pub async fn register(&self, id: ConnectionId) -> mpsc::Receiver<Payload> {
        let (tx, rx) = mpsc::channel(self.channel_capacity);
        let previous = self.channels.write().await.insert(id.clone(), tx);
        if previous.is_some() {
            debug!(connection_id = %id, "Replaced existing outbound channel");
        }
        rx
    }

    /// Drop the outbound queue; later deliveries to `id` report `Gone`
    pub async fn unregister(&self, id: &ConnectionId) {
        self.channels.write().await.remove(id);
    }

    /// Number of sockets the transport currently considers live
    pub async fn live_count(&self) -> usize {
        self.channels.read().await.len()
    }

    pub async fn is_live(&self, id: &ConnectionId) -> bool {
        self.channels.read().await.contains_key(id)
    }
}

#[async_trait]
impl Transport for WebSocketTransport {
    async fn deliver_to(&self, target: &ConnectionId, payload: Payload) -> Result<(), DeliveryError> {
        let sender = {
            let channels = self.channels.read().await;
            channels.get(target).cloned()
        };
        let sender = sender.ok_or(DeliveryError::Gone)?;

        match sender.send_timeout(payload, self.send_timeout).await {
            Ok(()) => Ok(()),
            Err(SendTimeoutError::Closed(_)) => Err(DeliveryError::Gone),
            Err(SendTimeoutError::Timeout(_)) => Err(DeliveryError::Timeout(self.send_timeout)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_deliver_to_registered_socket() {
        let transport = WebSocketTransport::new(4, Duration::from_millis(100));
        let mut rx = transport.register("a".into()).await;

        transport.deliver_to(&"a".into(), Payload::from("hi")).await.unwrap();
        assert_eq!(rx.recv().await, Some(Payload::from("hi")));
    }

    #[tokio::test]
    async fn test_unknown_target_is_gone() {
        let transport = WebSocketTransport::new(4, Duration::from_millis(100));
        let result = transport.deliver_to(&"nobody".into(), Payload::from("hi")).await;
        assert_eq!(result, Err(DeliveryError::Gone));
    }

    #[tokio::test]
    async fn test_dropped_receiver_is_gone() {
        let transport = WebSocketTransport::new(4, Duration::from_millis(100));
        let rx = transport.register("a".into()).await;
        drop(rx);

        let result = transport.deliver_to(&"a".into(), Payload::from("hi")).await;
        assert_eq!(result, Err(DeliveryError::Gone));
    }

    #[tokio::test]
    async fn test_full_queue_times_out() {
        let transport = WebSocketTransport::new(1, Duration::from_millis(20));
        let _rx = transport.register("a".into()).await;

        transport.deliver_to(&"a".into(), Payload::from("1")).await.unwrap();
        let result = transport.deliver_to(&"a".into(), Payload::from("2")).await;
        assert_eq!(result, Err(DeliveryError::Timeout(Duration::from_millis(20))));
    }

    #[tokio::test]
    async fn test_unregister() {
        let transport = WebSocketTransport::new(4, Duration::from_millis(100));
        let _rx = transport.register("a".into()).await;
        assert_eq!(transport.live_count().await, 1);

        transport.unregister(&"a".into()).await;
        assert!(!transport.is_live(&"a".into()).await);
        assert_eq!(transport.live_count().await, 0);
    }
}
