//! Relay WebSocket upgrade handler

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::app::AppState;
use crate::util::rate_limit::ConnectionRateLimiter;
use crate::ws::relay::{ConnectionId, RelayHub};

/// WebSocket upgrade handler for the session relay
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Handle the upgraded relay connection
async fn handle_socket(socket: WebSocket, state: AppState) {
    let hub = state.relay.clone();
    let (connection_id, outbound_rx) = hub.connect();
    info!(connection_id = %connection_id, "New relay connection");

    let (ws_sink, ws_stream) = socket.split();

    run_connection(
        connection_id,
        &hub,
        ws_sink,
        ws_stream,
        outbound_rx,
        ConnectionRateLimiter::new(state.config.relay_rate_limit),
    )
    .await;

    hub.disconnect(connection_id);
    info!(connection_id = %connection_id, "Relay connection closed");
}

/// Pump frames between the socket and the hub with read/write split
async fn run_connection(
    connection_id: ConnectionId,
    hub: &RelayHub,
    mut ws_sink: futures::stream::SplitSink<WebSocket, Message>,
    mut ws_stream: futures::stream::SplitStream<WebSocket>,
    mut outbound_rx: mpsc::Receiver<String>,
    rate_limiter: ConnectionRateLimiter,
) {
    // Writer task: hub -> WebSocket
    let writer_handle = tokio::spawn(async move {
        while let Some(frame) = outbound_rx.recv().await {
            if let Err(e) = ws_sink.send(Message::Text(frame)).await {
                debug!(connection_id = %connection_id, error = %e, "WebSocket send failed");
                break;
            }
        }
    });

    // Reader loop: WebSocket -> hub
    while let Some(result) = ws_stream.next().await {
        match result {
            Ok(Message::Text(text)) => {
                if !rate_limiter.check() {
                    warn!(connection_id = %connection_id, "Rate limited relay message");
                    continue;
                }
                hub.handle_text(connection_id, &text);
            }
            Ok(Message::Binary(_)) => {
                warn!(connection_id = %connection_id, "Received binary message, ignoring");
            }
            Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => {}
            Ok(Message::Close(_)) => {
                debug!(connection_id = %connection_id, "Client initiated close");
                break;
            }
            Err(e) => {
                error!(connection_id = %connection_id, error = %e, "WebSocket error");
                break;
            }
        }
    }

    writer_handle.abort();
}
