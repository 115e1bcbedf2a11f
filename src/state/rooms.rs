use std::collections::HashMap;

use crate::types::{Room, RoomCode};

/// Rooms by join code.
///
/// A room exists exactly as long as it has members: the first join creates
/// it, removing the last member drops it.
#[derive(Debug, Default)]
pub struct RoomStore {
    rooms: HashMap<RoomCode, Room>,
}

impl RoomStore {
    /// Fetch a room, creating it on first use
    pub fn get_or_create(&mut self, code: &str) -> &mut Room {
        self.rooms.entry(code.to_string()).or_insert_with(|| {
            tracing::info!("room created: {}", code);
            Room::new(code.to_string())
        })
    }

    /// Add a member name to a room, creating the room if needed. Adding a
    /// name that is already present changes nothing.
    pub fn add_member(&mut self, code: &str, name: &str) {
        self.get_or_create(code).members.insert(name.to_string());
    }

    /// Remove a member name and return how many members remain. The room is
    /// dropped when its last member leaves; an absent room is a no-op
    /// reporting 0.
    pub fn remove_member(&mut self, code: &str, name: &str) -> usize {
        let Some(room) = self.rooms.get_mut(code) else {
            return 0;
        };
        room.members.remove(name);
        let remaining = room.members.len();
        if remaining == 0 {
            self.rooms.remove(code);
            tracing::info!("room {} deleted (empty)", code);
        }
        remaining
    }

    /// Sorted roster of a room; empty when the room does not exist
    pub fn snapshot(&self, code: &str) -> Vec<String> {
        self.rooms.get(code).map(Room::roster).unwrap_or_default()
    }

    pub fn get(&self, code: &str) -> Option<&Room> {
        self.rooms.get(code)
    }

    pub fn contains(&self, code: &str) -> bool {
        self.rooms.contains_key(code)
    }

    pub fn member_count(&self, code: &str) -> usize {
        self.rooms.get(code).map(|r| r.members.len()).unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }
}
