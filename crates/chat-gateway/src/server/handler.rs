//! WebSocket handler
//!
//! One receive task and one send task per connection. Whichever ends first
//! stops the other, and teardown runs exactly once afterwards, including when
//! the receive task panicked.

use crate::server::GatewayState;
use crate::Gateway;
use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::IntoResponse,
};
use chat_core::ConnectionId;
use futures_util::{SinkExt, StreamExt};
use tokio::task::{JoinError, JoinHandle};

/// WebSocket gateway handler
pub async fn gateway_handler(
    State(state): State<GatewayState>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_socket(state, socket))
}

/// Handle an upgraded WebSocket connection
async fn handle_socket(state: GatewayState, socket: WebSocket) {
    let gateway = state.gateway().clone();
    let (connection, mut outbound) = gateway.open_connection();
    let connection_id = connection.id();
    drop(connection);

    tracing::info!(connection_id = %connection_id, "WebSocket connection established");

    let (mut ws_sink, mut ws_stream) = socket.split();

    // Receive task: inbound frames go straight to the router.
    let gateway_recv = gateway.clone();
    let recv_task = tokio::spawn(async move {
        while let Some(msg) = ws_stream.next().await {
            match msg {
                Ok(Message::Text(text)) => {
                    gateway_recv.handle_text(connection_id, &text);
                }
                Ok(Message::Binary(_)) => {
                    gateway_recv.reject_frame(connection_id, "binary frame");
                }
                Ok(Message::Ping(_) | Message::Pong(_)) => {
                    // Pong is handled automatically by axum
                    tracing::trace!(connection_id = %connection_id, "Ping/pong received");
                }
                Ok(Message::Close(_)) => {
                    tracing::info!(connection_id = %connection_id, "Client closed connection");
                    break;
                }
                Err(e) => {
                    tracing::debug!(
                        connection_id = %connection_id,
                        error = %e,
                        "WebSocket error"
                    );
                    break;
                }
            }
        }
    });

    // Send task: drains the outbound queue until teardown closes it.
    let send_task = tokio::spawn(async move {
        while let Some(frame) = outbound.recv().await {
            if ws_sink.send(Message::Text(frame.to_string())).await.is_err() {
                tracing::debug!(
                    connection_id = %connection_id,
                    "Failed to send frame to WebSocket"
                );
                break;
            }
        }

        let _ = ws_sink.close().await;
    });

    supervise(&gateway, connection_id, recv_task, send_task).await;
}

/// Wait for either connection task to end, stop the other, then tear down
///
/// The stopped task is awaited before teardown so no frame of this
/// connection is still being routed when it is closed.
async fn supervise(
    gateway: &Gateway,
    connection_id: ConnectionId,
    mut recv_task: JoinHandle<()>,
    mut send_task: JoinHandle<()>,
) {
    let (finished, recv_ended) = tokio::select! {
        result = &mut recv_task => (result, true),
        result = &mut send_task => {
            tracing::debug!(connection_id = %connection_id, "Send task ended");
            (result, false)
        }
    };
    let remaining = if recv_ended { send_task } else { recv_task };

    remaining.abort();
    for result in [finished, remaining.await] {
        if let Err(e) = result {
            report_task_failure(gateway, connection_id, &e);
        }
    }

    gateway.close_connection(connection_id);
}

fn report_task_failure(gateway: &Gateway, connection_id: ConnectionId, error: &JoinError) {
    if error.is_panic() {
        gateway.diagnostics().record_handler_panic();
        tracing::error!(
            connection_id = %connection_id,
            "Connection task panicked"
        );
    }
}
