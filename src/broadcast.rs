use crate::protocol::ServerMessage;
use crate::state::Classroom;

impl Classroom {
    /// Deliver a message to every open connection in a room, minus an
    /// optional excluded connection.
    ///
    /// A room nobody occupies is a silent no-op. Each delivery queues onto
    /// the recipient's channel and never waits; connections whose socket
    /// task is gone are skipped.
    pub fn broadcast_to_room(
        &self,
        room_code: &str,
        message: ServerMessage,
        exclude: Option<&str>,
    ) {
        if !self.rooms.contains(room_code) {
            return;
        }
        for entry in self.sessions.iter() {
            if entry.session.room_code != room_code {
                continue;
            }
            if exclude == Some(entry.conn.id.as_str()) {
                continue;
            }
            if !entry.conn.is_open() {
                continue;
            }
            if !entry.conn.send(message.clone()) {
                tracing::debug!("dropped message for closed connection {}", entry.conn.id);
            }
        }
    }

    /// Deliver a message to the first connection in the room registered
    /// under `target`.
    ///
    /// At most one recipient; which one is unspecified when names collide.
    /// No match, or a match whose socket is gone, drops the message
    /// silently.
    pub fn directed_send(&self, room_code: &str, target: &str, message: ServerMessage) {
        for entry in self.sessions.iter() {
            if entry.session.room_code == room_code && entry.session.display_name == target {
                if !entry.conn.send(message) {
                    tracing::debug!("directed message for {} hit a closed connection", target);
                }
                return;
            }
        }
        tracing::debug!(
            "no connection named {} in room {}, dropping directed message",
            target,
            room_code
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::Connection;
    use crate::types::Session;
    use tokio::sync::mpsc;

    fn conn() -> (Connection, mpsc::UnboundedReceiver<ServerMessage>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Connection::new(tx), rx)
    }

    fn populate(
        classroom: &mut Classroom,
        name: &str,
        room: &str,
    ) -> (Connection, mpsc::UnboundedReceiver<ServerMessage>) {
        let (c, rx) = conn();
        classroom.rooms.add_member(room, name);
        classroom.sessions.register(
            c.clone(),
            Session {
                display_name: name.to_string(),
                room_code: room.to_string(),
            },
        );
        (c, rx)
    }

    fn ping() -> ServerMessage {
        ServerMessage::StudentJoined {
            player_name: "ping".to_string(),
        }
    }

    fn count(rx: &mut mpsc::UnboundedReceiver<ServerMessage>) -> usize {
        let mut n = 0;
        while rx.try_recv().is_ok() {
            n += 1;
        }
        n
    }

    #[test]
    fn test_broadcast_reaches_the_room_only() {
        let mut classroom = Classroom::default();
        let (_a, mut a_rx) = populate(&mut classroom, "a", "1111");
        let (_b, mut b_rx) = populate(&mut classroom, "b", "1111");
        let (_c, mut c_rx) = populate(&mut classroom, "c", "2222");

        classroom.broadcast_to_room("1111", ping(), None);

        assert_eq!(count(&mut a_rx), 1);
        assert_eq!(count(&mut b_rx), 1);
        assert_eq!(count(&mut c_rx), 0);
    }

    #[test]
    fn test_broadcast_honors_exclusion() {
        let mut classroom = Classroom::default();
        let (a, mut a_rx) = populate(&mut classroom, "a", "1111");
        let (_b, mut b_rx) = populate(&mut classroom, "b", "1111");

        classroom.broadcast_to_room("1111", ping(), Some(&a.id));

        assert_eq!(count(&mut a_rx), 0);
        assert_eq!(count(&mut b_rx), 1);
    }

    #[test]
    fn test_broadcast_to_absent_room_is_noop() {
        let mut classroom = Classroom::default();
        let (_a, mut a_rx) = populate(&mut classroom, "a", "1111");

        classroom.broadcast_to_room("9999", ping(), None);

        assert_eq!(count(&mut a_rx), 0);
    }

    #[test]
    fn test_broadcast_skips_closed_connections() {
        let mut classroom = Classroom::default();
        let (_a, a_rx) = populate(&mut classroom, "a", "1111");
        let (_b, mut b_rx) = populate(&mut classroom, "b", "1111");

        // a's socket task is gone but its registration lingers
        drop(a_rx);
        classroom.broadcast_to_room("1111", ping(), None);

        assert_eq!(count(&mut b_rx), 1);
    }

    #[test]
    fn test_directed_send_hits_exactly_one() {
        let mut classroom = Classroom::default();
        let (_a, mut a_rx) = populate(&mut classroom, "a", "1111");
        let (_b, mut b_rx) = populate(&mut classroom, "b", "1111");

        classroom.directed_send("1111", "b", ping());

        assert_eq!(count(&mut a_rx), 0);
        assert_eq!(count(&mut b_rx), 1);
    }

    #[test]
    fn test_directed_send_matches_within_room_only() {
        let mut classroom = Classroom::default();
        let (_a, mut a_rx) = populate(&mut classroom, "a", "1111");
        let (_other, mut other_rx) = populate(&mut classroom, "b", "2222");

        // "b" exists, but not in this room
        classroom.directed_send("1111", "b", ping());

        assert_eq!(count(&mut a_rx), 0);
        assert_eq!(count(&mut other_rx), 0);
    }

    #[test]
    fn test_directed_send_under_name_collision_delivers_once() {
        let mut classroom = Classroom::default();
        let (_first, mut first_rx) = populate(&mut classroom, "dana", "1111");
        let (_second, mut second_rx) = populate(&mut classroom, "dana", "1111");

        classroom.directed_send("1111", "dana", ping());

        assert_eq!(count(&mut first_rx) + count(&mut second_rx), 1);
    }

    #[test]
    fn test_directed_send_to_closed_connection_fails_silently() {
        let mut classroom = Classroom::default();
        let (_a, a_rx) = populate(&mut classroom, "a", "1111");
        let (_b, mut b_rx) = populate(&mut classroom, "b", "1111");

        drop(a_rx);
        // Must not panic and must not fall through to anyone else
        classroom.directed_send("1111", "a", ping());

        assert_eq!(count(&mut b_rx), 0);
    }
}
