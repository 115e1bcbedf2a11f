use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Opaque ID types for type safety
pub type RoomCode = String;
pub type ConnectionId = String;

/// Room code used when a join request does not name one
pub const DEFAULT_ROOM_CODE: &str = "0000";

/// Display name used when a join request does not carry one
pub const DEFAULT_DISPLAY_NAME: &str = "anonymous";

/// A classroom room: its join code and the current member roster.
///
/// Rooms come into existence on first join and are dropped when the last
/// member leaves. The roster is a sorted set, so two members sharing a
/// display name collapse into one entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Room {
    pub code: RoomCode,
    pub members: BTreeSet<String>,
    pub created_at: DateTime<Utc>,
}

impl Room {
    pub fn new(code: RoomCode) -> Self {
        Self {
            code,
            members: BTreeSet::new(),
            created_at: Utc::now(),
        }
    }

    /// Roster snapshot in sorted order
    pub fn roster(&self) -> Vec<String> {
        self.members.iter().cloned().collect()
    }
}

/// What the registry knows about one joined connection
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Session {
    pub display_name: String,
    pub room_code: RoomCode,
}
