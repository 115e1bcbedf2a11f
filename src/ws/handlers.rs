//! WebSocket message dispatch
//!
//! Frames are decoded and routed here as plain functions over `AppState`,
//! so the whole router is testable without a socket.

use crate::connection::Connection;
use crate::protocol::{ClientMessage, CommandKind, ParseError, ServerMessage};
use crate::state::AppState;
use std::sync::Arc;

/// Decode one text frame and run it through the router.
///
/// Returns the reply for the sending connection, if any. Frames that do not
/// decode are dropped here and the connection stays open; only a
/// recognizable message with an unknown tag earns an error reply.
pub async fn handle_frame(
    text: &str,
    conn: &Connection,
    state: &Arc<AppState>,
) -> Option<ServerMessage> {
    match ClientMessage::parse(text) {
        Ok(msg) => handle_message(msg, conn, state).await,
        Err(ParseError::UnknownType(tag)) => {
            tracing::warn!("unknown message type: {}", tag);
            Some(ServerMessage::Error {
                code: "UNKNOWN_MESSAGE_TYPE".to_string(),
                message: format!("The server does not recognize message type: {}", tag),
            })
        }
        Err(ParseError::Malformed(e)) => {
            tracing::warn!("failed to parse client message: {}", e);
            None
        }
    }
}

/// Handle a decoded client message and return the optional reply
pub async fn handle_message(
    msg: ClientMessage,
    conn: &Connection,
    state: &Arc<AppState>,
) -> Option<ServerMessage> {
    match msg {
        ClientMessage::Join {
            room_code,
            player_name,
        } => Some(state.join(conn, room_code, player_name).await),

        ClientMessage::Message {
            content,
            target,
            extra,
        } => {
            state.chat(&conn.id, content, target, extra).await;
            None
        }

        ClientMessage::AiConfig {
            model_id,
            api_key,
            hf_token,
            extra,
        } => {
            state
                .relay_ai_config(&conn.id, model_id, api_key, hf_token, extra)
                .await;
            None
        }

        ClientMessage::Command { command, extra } => {
            // Session gate first: the unjoined get silence, not errors
            state.session_of(&conn.id).await?;
            match CommandKind::parse(&command) {
                Some(_) => {
                    state.relay_command(&conn.id, command, extra).await;
                    None
                }
                None => {
                    tracing::warn!("unknown command: {}", command);
                    Some(ServerMessage::Error {
                        code: "UNKNOWN_COMMAND".to_string(),
                        message: format!("The server does not recognize the command: {}", command),
                    })
                }
            }
        }

        // parse() already turned unknown tags into an error reply
        ClientMessage::Unknown => None,
    }
}

/// Tear down a connection after its socket closes
pub async fn handle_disconnect(conn_id: &str, state: &Arc<AppState>) {
    state.disconnect(conn_id).await;
}
