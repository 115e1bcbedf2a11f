use std::collections::HashMap;

use crate::connection::Connection;
use crate::types::{ConnectionId, Session};

/// One registered connection: the delivery handle plus who and where it is
#[derive(Debug, Clone)]
pub struct SessionEntry {
    pub conn: Connection,
    pub session: Session,
}

/// Sessions by connection id.
///
/// A connection shows up here when its join is processed and disappears on
/// disconnect; anything it sends in between resolves its identity through
/// this map.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    entries: HashMap<ConnectionId, SessionEntry>,
}

impl SessionRegistry {
    /// Associate a connection with a display name and room, replacing any
    /// previous association.
    pub fn register(&mut self, conn: Connection, session: Session) {
        self.entries.insert(conn.id.clone(), SessionEntry { conn, session });
    }

    pub fn lookup(&self, conn_id: &str) -> Option<&SessionEntry> {
        self.entries.get(conn_id)
    }

    /// Session data alone, without the delivery handle
    pub fn session_of(&self, conn_id: &str) -> Option<&Session> {
        self.entries.get(conn_id).map(|e| &e.session)
    }

    /// Drop a connection's registration. Unknown ids are a no-op.
    pub fn remove(&mut self, conn_id: &str) -> Option<SessionEntry> {
        self.entries.remove(conn_id)
    }

    /// All registered entries, in no particular order
    pub fn iter(&self) -> impl Iterator<Item = &SessionEntry> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
