//! WebSocket event source
//!
//! Turns one socket into the gateway's connect / message / disconnect
//! events. Frames from a single socket are handled in order, so its
//! connect always precedes its messages, which precede its disconnect.

use std::borrow::Cow;
use std::time::Duration;

use axum::{
    extract::{
        ws::{close_code, CloseFrame, Message, WebSocket, WebSocketUpgrade},
        State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tracing::{debug, error, info, instrument, warn};

use super::handlers::AppState;
use crate::gateway::GatewayEvent;
use crate::resource::ConnectionSlot;
use crate::store::ConnectionId;
use crate::transport::Payload;

/// How long a closing socket may take to flush queued frames
const WRITER_DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Upgrade handler for the gateway's WebSocket path
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    let slot = match state.resources.acquire_connection_slot() {
        Ok(slot) => slot,
        Err(e) => {
            warn!(error = %e, "Refusing WebSocket upgrade");
            return (StatusCode::SERVICE_UNAVAILABLE, "connection limit reached").into_response();
        }
    };

    ws.max_message_size(state.max_message_size)
        .on_upgrade(move |socket| handle_socket(socket, state, slot))
}

#[instrument(skip_all, fields(connection_id = tracing::field::Empty))]
async fn handle_socket(socket: WebSocket, state: AppState, _slot: ConnectionSlot) {
    let id = ConnectionId::generate();
    tracing::Span::current().record("connection_id", tracing::field::display(&id));

    let outbound = state.transport.register(id.clone()).await;
    let (mut sink, stream) = socket.split();

    if let Err(e) = state.gateway.handle(GatewayEvent::Connect { id: id.clone() }).await {
        error!(error = %e, "Rejecting socket, connection could not be registered");
        state.transport.unregister(&id).await;
        let frame = CloseFrame {
            code: close_code::ERROR,
            reason: Cow::from("connection registry unavailable"),
        };
        if let Err(e) = sink.send(Message::Close(Some(frame))).await {
            debug!(error = %e, "Failed to send close frame");
        }
        return;
    }

    let metrics = state.gateway.metrics().clone();
    metrics.socket_opened();

    let mut writer = tokio::spawn(write_outbound(sink, outbound));
    read_inbound(stream, &state, &id).await;

    state.transport.unregister(&id).await;
    if let Err(e) = state.gateway.handle(GatewayEvent::Disconnect { id: id.clone() }).await {
        error!(error = %e, "Failed to remove connection on close");
    }
    metrics.socket_closed();

    if tokio::time::timeout(WRITER_DRAIN_TIMEOUT, &mut writer).await.is_err() {
        warn!("Writer did not drain in time, aborting");
        writer.abort();
    }
    info!("Socket closed");
}

/// Forward every inbound data frame to the gateway until the socket ends
async fn read_inbound(
    mut stream: futures::stream::SplitStream<WebSocket>,
    state: &AppState,
    id: &ConnectionId,
) {
    let mut shutdown_rx = state.shutdown.subscribe();

    loop {
        let frame = tokio::select! {
            frame = stream.next() => frame,
            _ = shutdown_rx.recv() => {
                debug!("Closing socket for shutdown");
                break;
            }
        };

        let payload = match frame {
            Some(Ok(Message::Text(text))) => Payload::from(text),
            Some(Ok(Message::Binary(bytes))) => Payload::from(bytes),
            Some(Ok(Message::Close(_))) | None => break,
            // ping/pong are answered by axum
            Some(Ok(_)) => continue,
            Some(Err(e)) => {
                debug!(error = %e, "WebSocket read error");
                break;
            }
        };

        let event = GatewayEvent::Message {
            id: id.clone(),
            payload,
        };
        if let Err(e) = state.gateway.handle(event).await {
            error!(error = %e, "Broadcast aborted");
        }
    }
}

/// Drain the transport queue into the socket; closes once the queue is dropped
async fn write_outbound(
    mut sink: futures::stream::SplitSink<WebSocket, Message>,
    mut outbound: mpsc::Receiver<Payload>,
) {
    while let Some(payload) = outbound.recv().await {
        let message = match payload {
            Payload::Text(text) => Message::Text(text.to_string()),
            Payload::Binary(bytes) => Message::Binary(bytes.to_vec()),
        };
        if let Err(e) = sink.send(message).await {
            debug!(error = %e, "WebSocket write error");
            return;
        }
    }

    if let Err(e) = sink.send(Message::Close(None)).await {
        debug!(error = %e, "Failed to send close frame");
    }
}
