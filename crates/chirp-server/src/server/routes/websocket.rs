//! Broadcast chat over WebSocket.
//!
//! One event channel per client: an inbound text frame is a chat message,
//! and every registered connection (the sender included) receives it back
//! verbatim. The payload is opaque to the server.

use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
    routing::get,
    Router,
};
use chirp_realtime::OutboundEvent;
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::server::AppState;

/// Create the WebSocket router
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/ws", get(chat_websocket_handler))
        .with_state(state)
}

/// GET /ws
///
/// WebSocket endpoint for the broadcast chat channel.
async fn chat_websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> Response {
    info!("Chat WebSocket connection request");
    ws.on_upgrade(move |socket| handle_chat_socket(socket, state))
}

/// Handle one chat connection from accept to disconnect.
async fn handle_chat_socket(mut socket: WebSocket, state: Arc<AppState>) {
    let (tx, rx) = mpsc::channel(chirp_realtime::OUTBOUND_QUEUE_CAPACITY);

    let id = match state.registry.register(tx) {
        Ok(id) => id,
        Err(e) => {
            warn!(error = %e, "Refusing chat connection");
            let _ = socket.send(Message::Close(None)).await;
            return;
        }
    };
    info!(connection = %id, "User connected");

    let (sender, mut receiver) = socket.split();

    // Drain the outbound queue into the socket until either side closes
    let mut forward = tokio::spawn(forward_outbound(sender, rx));

    loop {
        tokio::select! {
            msg = receiver.next() => match msg {
                Some(Ok(Message::Text(text))) => {
                    debug!(connection = %id, len = text.len(), "Received chat message");
                    let report = state.broadcast.broadcast(id, &text);
                    debug!(
                        connection = %id,
                        delivered = report.delivered,
                        skipped = report.skipped,
                        "Message fanned out"
                    );
                }
                Some(Ok(Message::Binary(_))) => {
                    warn!(connection = %id, "Received binary WebSocket message (not supported)");
                }
                Some(Ok(Message::Ping(_))) | Some(Ok(Message::Pong(_))) => {
                    // Pings are answered by the protocol layer
                }
                Some(Ok(Message::Close(_))) => {
                    info!(connection = %id, "WebSocket close requested");
                    break;
                }
                Some(Err(e)) => {
                    error!(connection = %id, error = %e, "WebSocket error");
                    break;
                }
                None => break,
            },
            _ = &mut forward => break,
        }
    }

    forward.abort();
    state.registry.unregister(&id);
    info!(connection = %id, "User disconnected");
}

async fn forward_outbound(
    mut sender: futures::stream::SplitSink<WebSocket, Message>,
    mut rx: mpsc::Receiver<OutboundEvent>,
) {
    while let Some(event) = rx.recv().await {
        if let Err(e) = sender.send(Message::Text(event.payload)).await {
            debug!(error = %e, "Failed to write to WebSocket, stopping forwarder");
            break;
        }
    }
}
