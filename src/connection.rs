use tokio::sync::mpsc;

use crate::protocol::ServerMessage;
use crate::types::ConnectionId;

/// Handle to one connected client: its id plus the outbound channel drained
/// by that client's socket task.
///
/// Sends queue onto the channel and never wait for the receiver, so fan-out
/// to a room cannot stall on one slow socket.
#[derive(Debug, Clone)]
pub struct Connection {
    pub id: ConnectionId,
    tx: mpsc::UnboundedSender<ServerMessage>,
}

impl Connection {
    pub fn new(tx: mpsc::UnboundedSender<ServerMessage>) -> Self {
        Self {
            id: ulid::Ulid::new().to_string(),
            tx,
        }
    }

    /// Queue a message for delivery. Returns false when the socket task is
    /// gone; callers treat that as a skip, never an error.
    pub fn send(&self, msg: ServerMessage) -> bool {
        self.tx.send(msg).is_ok()
    }

    /// Whether the socket task is still draining this channel
    pub fn is_open(&self) -> bool {
        !self.tx.is_closed()
    }
}
