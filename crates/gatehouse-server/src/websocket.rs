//! `WebSocket` upgrade handling.
//!
//! Each socket gets an opaque connection id, a writer task draining its
//! outbound channel, and a connect/disconnect event pair. Every inbound text
//! message dispatches on its own task: messages on one connection may be
//! processed concurrently, and no cross-message ordering is guaranteed. A
//! client disconnecting mid-request does not abort the in-flight dispatch —
//! the notifier just starts observing `Gone`.

use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::connections::OUTBOUND_CHANNEL_SIZE;
use crate::dispatcher::TransportEvent;
use crate::server::AppState;

/// GET /ws — upgrade to a gateway connection.
pub async fn ws_handler(
    State(state): State<AppState>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    let connection_id = format!("conn-{}", Uuid::new_v4());
    info!(connection_id, "websocket connected");

    let (tx, mut rx) = mpsc::channel::<String>(OUTBOUND_CHANNEL_SIZE);
    state.connections.add(&connection_id, tx).await;
    let _ = state
        .dispatcher
        .dispatch(TransportEvent::Connect {
            connection_id: connection_id.clone(),
        })
        .await;

    let (mut sink, mut stream) = socket.split();
    let writer = tokio::spawn(async move {
        while let Some(text) = rx.recv().await {
            if sink.send(Message::Text(text.into())).await.is_err() {
                break;
            }
        }
    });

    while let Some(Ok(message)) = stream.next().await {
        match message {
            Message::Text(text) => {
                let dispatcher = state.dispatcher.clone();
                let event = TransportEvent::Message {
                    connection_id: connection_id.clone(),
                    body: Some(text.to_string()),
                    push_endpoint: state.push_endpoint.clone(),
                };
                // One task per message; the dispatcher contains its own
                // failures, so nothing here needs the response.
                let _ = tokio::spawn(async move {
                    let response = dispatcher.dispatch(event).await;
                    debug!(status = response.status, "message dispatched");
                });
            }
            Message::Close(_) => break,
            // Ping/pong handled by axum; binary frames are not part of the
            // protocol.
            _ => {}
        }
    }

    info!(connection_id, "websocket disconnected");
    state.connections.remove(&connection_id).await;
    let _ = state
        .dispatcher
        .dispatch(TransportEvent::Disconnect {
            connection_id: connection_id.clone(),
        })
        .await;
    writer.abort();
}
