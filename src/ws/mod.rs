pub mod handlers;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
};
use futures::{sink::SinkExt, stream::StreamExt};
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::connection::Connection;
use crate::state::AppState;

/// WebSocket upgrade handler
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Handle one WebSocket connection for its whole lifetime
async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let (mut sender, mut receiver) = socket.split();

    // Everything routed to this client queues on the channel; this task is
    // the only writer on the wire.
    let (tx, mut rx) = mpsc::unbounded_channel();
    let conn = Connection::new(tx);
    tracing::info!("websocket connected: {}", conn.id);

    loop {
        tokio::select! {
            // Fan-out queued by the registries
            outbound = rx.recv() => {
                match outbound {
                    Some(msg) => {
                        if let Ok(json) = serde_json::to_string(&msg) {
                            if sender.send(Message::Text(json.into())).await.is_err() {
                                break;
                            }
                        }
                    }
                    None => break,
                }
            }

            // Frames from the client
            ws_msg = receiver.next() => {
                match ws_msg {
                    Some(Ok(Message::Text(text))) => {
                        tracing::debug!("received frame: {}", text);
                        if let Some(reply) = handlers::handle_frame(&text, &conn, &state).await {
                            if let Ok(json) = serde_json::to_string(&reply) {
                                if sender.send(Message::Text(json.into())).await.is_err() {
                                    break;
                                }
                            }
                        }
                    }
                    Some(Ok(Message::Close(_))) => {
                        tracing::info!("websocket closed: {}", conn.id);
                        break;
                    }
                    Some(Ok(Message::Ping(data))) => {
                        if sender.send(Message::Pong(data)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        tracing::error!("websocket error on {}: {}", conn.id, e);
                        break;
                    }
                    None => break,
                }
            }
        }
    }

    // Cleanup runs whatever ended the loop, so a dropped socket can never
    // leave a stale session behind
    handlers::handle_disconnect(&conn.id, &state).await;
    tracing::info!("websocket disconnected: {}", conn.id);
}
