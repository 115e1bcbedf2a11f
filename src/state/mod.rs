mod rooms;
mod sessions;

pub use rooms::RoomStore;
pub use sessions::{SessionEntry, SessionRegistry};

use chrono::Utc;
use serde_json::{Map, Value};
use tokio::sync::RwLock;

use crate::connection::Connection;
use crate::protocol::ServerMessage;
use crate::types::*;

/// Both registries behind one lock.
///
/// Every router event reads and writes them as a unit, so there is a single
/// ordering domain: no event can observe a session without its room
/// membership or the other way around.
#[derive(Debug, Default)]
pub struct Classroom {
    pub sessions: SessionRegistry,
    pub rooms: RoomStore,
}

impl Classroom {
    /// Put a connection into a room under a display name and announce it.
    ///
    /// Returns the `joinedRoom` reply for the joiner. A connection that is
    /// already somewhere leaves its old room first, with the full departure
    /// announcements.
    pub fn join(
        &mut self,
        conn: &Connection,
        room_code: Option<String>,
        display_name: Option<String>,
    ) -> ServerMessage {
        if self.sessions.lookup(&conn.id).is_some() {
            self.disconnect(&conn.id);
        }

        let room_code = room_code
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| DEFAULT_ROOM_CODE.to_string());
        let display_name = display_name
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| DEFAULT_DISPLAY_NAME.to_string());

        self.rooms.add_member(&room_code, &display_name);
        self.sessions.register(
            conn.clone(),
            Session {
                display_name: display_name.clone(),
                room_code: room_code.clone(),
            },
        );
        tracing::info!(
            "{} joined room {} ({} users total)",
            display_name,
            room_code,
            self.rooms.member_count(&room_code)
        );

        let users = self.rooms.snapshot(&room_code);
        self.broadcast_to_room(
            &room_code,
            ServerMessage::StudentJoined {
                player_name: display_name.clone(),
            },
            Some(&conn.id),
        );
        self.broadcast_to_room(
            &room_code,
            ServerMessage::RoomUpdate {
                room_code: room_code.clone(),
                user_count: users.len(),
                users: users.clone(),
            },
            Some(&conn.id),
        );

        ServerMessage::JoinedRoom {
            room_code,
            user_name: display_name,
            users_in_room: users,
        }
    }

    /// Relay a chat message: to one member when `target` is set, otherwise
    /// to the whole room minus the sender. Senders without a session are
    /// ignored.
    pub fn chat(
        &self,
        conn_id: &str,
        content: String,
        target: Option<String>,
        mut extra: Map<String, Value>,
    ) {
        let Some(session) = self.sessions.session_of(conn_id) else {
            tracing::debug!("message from unregistered connection, ignoring");
            return;
        };
        scrub_stamps(&mut extra);
        let relay = ServerMessage::Message {
            content,
            target: target.clone(),
            sender: session.display_name.clone(),
            timestamp: Utc::now().to_rfc3339(),
            extra,
        };
        match target {
            Some(name) => self.directed_send(&session.room_code, &name, relay),
            None => self.broadcast_to_room(&session.room_code, relay, Some(conn_id)),
        }
    }

    /// Relay assistant configuration to the rest of the sender's room. The
    /// payload is not interpreted; only the sender and timestamp stamps are
    /// set.
    pub fn relay_ai_config(
        &self,
        conn_id: &str,
        model_id: String,
        api_key: Option<String>,
        hf_token: Option<String>,
        mut extra: Map<String, Value>,
    ) {
        let Some(session) = self.sessions.session_of(conn_id) else {
            tracing::debug!("aiConfig from unregistered connection, ignoring");
            return;
        };
        scrub_stamps(&mut extra);
        tracing::info!(
            "relaying aiConfig for model {} from {}",
            model_id,
            session.display_name
        );
        let relay = ServerMessage::AiConfig {
            model_id,
            api_key,
            hf_token,
            sender: session.display_name.clone(),
            timestamp: Utc::now().to_rfc3339(),
            extra,
        };
        self.broadcast_to_room(&session.room_code, relay, Some(conn_id));
    }

    /// Relay a recognized directive to the rest of the sender's room
    pub fn relay_command(&self, conn_id: &str, command: String, mut extra: Map<String, Value>) {
        let Some(session) = self.sessions.session_of(conn_id) else {
            tracing::debug!("command from unregistered connection, ignoring");
            return;
        };
        scrub_stamps(&mut extra);
        tracing::info!(
            "broadcasting command '{}' from {}",
            command,
            session.display_name
        );
        let relay = ServerMessage::Command {
            command,
            sender: session.display_name.clone(),
            timestamp: Utc::now().to_rfc3339(),
            extra,
        };
        self.broadcast_to_room(&session.room_code, relay, Some(conn_id));
    }

    /// Tear down a connection's registration and announce the departure.
    /// Connections that never joined are a no-op.
    pub fn disconnect(&mut self, conn_id: &str) {
        let Some(entry) = self.sessions.remove(conn_id) else {
            return;
        };
        let Session {
            display_name,
            room_code,
        } = entry.session;
        let remaining = self.rooms.remove_member(&room_code, &display_name);
        tracing::info!(
            "{} left room {} ({} users remaining)",
            display_name,
            room_code,
            remaining
        );

        self.broadcast_to_room(
            &room_code,
            ServerMessage::StudentLeft {
                player_name: display_name,
            },
            None,
        );
        let users = self.rooms.snapshot(&room_code);
        self.broadcast_to_room(
            &room_code,
            ServerMessage::RoomUpdate {
                room_code: room_code.clone(),
                user_count: users.len(),
                users,
            },
            None,
        );
    }
}

/// Clients may claim their own sender or timestamp; the server's stamps win
fn scrub_stamps(extra: &mut Map<String, Value>) {
    extra.remove("sender");
    extra.remove("timestamp");
}

/// Shared application state.
///
/// Join and disconnect take the write half; relays only read the registries
/// and fan out over the per-connection channels, so they can run
/// concurrently.
#[derive(Debug, Default)]
pub struct AppState {
    classroom: RwLock<Classroom>,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run a join event: registration, membership, and announcements as one
    /// atomic step.
    pub async fn join(
        &self,
        conn: &Connection,
        room_code: Option<String>,
        display_name: Option<String>,
    ) -> ServerMessage {
        self.classroom
            .write()
            .await
            .join(conn, room_code, display_name)
    }

    pub async fn chat(
        &self,
        conn_id: &str,
        content: String,
        target: Option<String>,
        extra: Map<String, Value>,
    ) {
        self.classroom
            .read()
            .await
            .chat(conn_id, content, target, extra)
    }

    pub async fn relay_ai_config(
        &self,
        conn_id: &str,
        model_id: String,
        api_key: Option<String>,
        hf_token: Option<String>,
        extra: Map<String, Value>,
    ) {
        self.classroom
            .read()
            .await
            .relay_ai_config(conn_id, model_id, api_key, hf_token, extra)
    }

    pub async fn relay_command(&self, conn_id: &str, command: String, extra: Map<String, Value>) {
        self.classroom
            .read()
            .await
            .relay_command(conn_id, command, extra)
    }

    pub async fn disconnect(&self, conn_id: &str) {
        self.classroom.write().await.disconnect(conn_id)
    }

    /// Session for a connection, if it has joined
    pub async fn session_of(&self, conn_id: &str) -> Option<Session> {
        self.classroom
            .read()
            .await
            .sessions
            .session_of(conn_id)
            .cloned()
    }

    /// Sorted roster of a room; empty when the room does not exist
    pub async fn roster(&self, room_code: &str) -> Vec<String> {
        self.classroom.read().await.rooms.snapshot(room_code)
    }

    pub async fn has_room(&self, room_code: &str) -> bool {
        self.classroom.read().await.rooms.contains(room_code)
    }

    pub async fn room_count(&self) -> usize {
        self.classroom.read().await.rooms.len()
    }

    pub async fn session_count(&self) -> usize {
        self.classroom.read().await.sessions.len()
    }
}
