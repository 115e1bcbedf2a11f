use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Result type for frame decoding
pub type ParseResult<T> = Result<T, ParseError>;

/// Why an inbound frame was rejected.
///
/// `Malformed` frames are dropped without a reply; `UnknownType` frames are
/// well-formed JSON whose tag names no known message, and get an error reply.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("invalid message payload: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("unknown message type: {0}")]
    UnknownType(String),
}

/// Messages clients send to the server.
///
/// The wire format is the original classroom clients' JSON: a `type` tag and
/// camelCase fields. Relay-type messages capture any fields the server does
/// not model in `extra` so they pass through to recipients untouched.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ClientMessage {
    /// Enter a room under a display name. Older clients send `joinRoom` and
    /// `name`; both spellings are accepted.
    #[serde(alias = "joinRoom")]
    Join {
        room_code: Option<String>,
        #[serde(alias = "name")]
        player_name: Option<String>,
    },
    /// Chat text for the whole room, or for one member when `target` is set
    Message {
        content: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        target: Option<String>,
        #[serde(flatten)]
        extra: Map<String, Value>,
    },
    /// Assistant configuration to hand to the rest of the room, opaque to
    /// the server
    AiConfig {
        model_id: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        api_key: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        hf_token: Option<String>,
        #[serde(flatten)]
        extra: Map<String, Value>,
    },
    /// A named directive for the rest of the room
    Command {
        command: String,
        #[serde(flatten)]
        extra: Map<String, Value>,
    },
    /// Catchall for tags the server does not know; gives dispatch a real
    /// default arm
    #[serde(other)]
    Unknown,
}

impl ClientMessage {
    /// Decode one text frame.
    ///
    /// Unrecognized tags come back as [`ParseError::UnknownType`] carrying
    /// the offending tag so the router can name it in the error reply.
    pub fn parse(text: &str) -> ParseResult<Self> {
        let msg: ClientMessage = serde_json::from_str(text)?;
        if matches!(msg, ClientMessage::Unknown) {
            let tag = serde_json::from_str::<Value>(text)
                .ok()
                .and_then(|v| v.get("type").and_then(Value::as_str).map(str::to_string))
                .unwrap_or_default();
            return Err(ParseError::UnknownType(tag));
        }
        Ok(msg)
    }
}

/// Directives the router recognizes and relays to the room
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    LoadContent,
    SetupAi,
}

impl CommandKind {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "LOAD_CONTENT" => Some(Self::LoadContent),
            "SETUP_AI" => Some(Self::SetupAi),
            _ => None,
        }
    }
}

/// Messages the server sends to clients.
///
/// Relayed variants mirror their inbound counterparts plus the two stamps the
/// server owns: `sender` (the registered display name, never the one the
/// client claimed) and `timestamp` (server clock, RFC 3339).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ServerMessage {
    /// Reply to the joiner with their accepted identity and the roster
    JoinedRoom {
        room_code: String,
        user_name: String,
        users_in_room: Vec<String>,
    },
    /// Announcement to the rest of the room that someone arrived
    StudentJoined { player_name: String },
    /// Announcement to the room that someone left
    StudentLeft { player_name: String },
    /// Roster refresh for a room
    RoomUpdate {
        room_code: String,
        user_count: usize,
        users: Vec<String>,
    },
    /// Relayed chat message
    Message {
        content: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        target: Option<String>,
        sender: String,
        timestamp: String,
        #[serde(flatten)]
        extra: Map<String, Value>,
    },
    /// Relayed assistant configuration
    AiConfig {
        model_id: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        api_key: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        hf_token: Option<String>,
        sender: String,
        timestamp: String,
        #[serde(flatten)]
        extra: Map<String, Value>,
    },
    /// Relayed directive
    Command {
        command: String,
        sender: String,
        timestamp: String,
        #[serde(flatten)]
        extra: Map<String, Value>,
    },
    Error { code: String, message: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_join_accepts_both_spellings() {
        let msg = ClientMessage::parse(r#"{"type":"join","roomCode":"1234","playerName":"dana"}"#)
            .unwrap();
        match msg {
            ClientMessage::Join {
                room_code,
                player_name,
            } => {
                assert_eq!(room_code.as_deref(), Some("1234"));
                assert_eq!(player_name.as_deref(), Some("dana"));
            }
            other => panic!("expected Join, got {:?}", other),
        }

        let msg =
            ClientMessage::parse(r#"{"type":"joinRoom","roomCode":"1234","name":"dana"}"#).unwrap();
        assert!(matches!(msg, ClientMessage::Join { .. }));
    }

    #[test]
    fn test_parse_join_fields_are_optional() {
        let msg = ClientMessage::parse(r#"{"type":"join"}"#).unwrap();
        match msg {
            ClientMessage::Join {
                room_code,
                player_name,
            } => {
                assert!(room_code.is_none());
                assert!(player_name.is_none());
            }
            other => panic!("expected Join, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_unknown_type_names_the_tag() {
        let err = ClientMessage::parse(r#"{"type":"dance"}"#).unwrap_err();
        match err {
            ParseError::UnknownType(tag) => assert_eq!(tag, "dance"),
            other => panic!("expected UnknownType, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_rejects_malformed_frames() {
        assert!(matches!(
            ClientMessage::parse("not json at all"),
            Err(ParseError::Malformed(_))
        ));
        // No type tag
        assert!(matches!(
            ClientMessage::parse(r#"{"content":"hi"}"#),
            Err(ParseError::Malformed(_))
        ));
        // Tag is not a string
        assert!(matches!(
            ClientMessage::parse(r#"{"type":42,"content":"hi"}"#),
            Err(ParseError::Malformed(_))
        ));
        // Declared type with a missing required field
        assert!(matches!(
            ClientMessage::parse(r#"{"type":"message"}"#),
            Err(ParseError::Malformed(_))
        ));
        // Declared type with a wrong field type
        assert!(matches!(
            ClientMessage::parse(r#"{"type":"message","content":17}"#),
            Err(ParseError::Malformed(_))
        ));
    }

    #[test]
    fn test_parse_message_keeps_unmodeled_fields() {
        let msg = ClientMessage::parse(
            r#"{"type":"message","content":"hi","lang":"he","sender":"forged"}"#,
        )
        .unwrap();
        match msg {
            ClientMessage::Message {
                content,
                target,
                extra,
            } => {
                assert_eq!(content, "hi");
                assert!(target.is_none());
                assert_eq!(extra.get("lang"), Some(&json!("he")));
                assert_eq!(extra.get("sender"), Some(&json!("forged")));
                assert!(extra.get("type").is_none());
            }
            other => panic!("expected Message, got {:?}", other),
        }
    }

    #[test]
    fn test_command_kind_recognizes_the_known_set() {
        assert_eq!(
            CommandKind::parse("LOAD_CONTENT"),
            Some(CommandKind::LoadContent)
        );
        assert_eq!(CommandKind::parse("SETUP_AI"), Some(CommandKind::SetupAi));
        assert_eq!(CommandKind::parse("REBOOT"), None);
        assert_eq!(CommandKind::parse("load_content"), None);
    }

    #[test]
    fn test_joined_room_wire_shape() {
        let msg = ServerMessage::JoinedRoom {
            room_code: "1234".to_string(),
            user_name: "dana".to_string(),
            users_in_room: vec!["dana".to_string()],
        };
        assert_eq!(
            serde_json::to_value(&msg).unwrap(),
            json!({
                "type": "joinedRoom",
                "roomCode": "1234",
                "userName": "dana",
                "usersInRoom": ["dana"],
            })
        );
    }

    #[test]
    fn test_relayed_message_wire_shape() {
        let mut extra = Map::new();
        extra.insert("lang".to_string(), json!("he"));
        let msg = ServerMessage::Message {
            content: "hi".to_string(),
            target: None,
            sender: "omer".to_string(),
            timestamp: "2024-01-01T00:00:00+00:00".to_string(),
            extra,
        };
        assert_eq!(
            serde_json::to_value(&msg).unwrap(),
            json!({
                "type": "message",
                "content": "hi",
                "sender": "omer",
                "timestamp": "2024-01-01T00:00:00+00:00",
                "lang": "he",
            })
        );
    }

    #[test]
    fn test_ai_config_omits_absent_credentials() {
        let msg = ServerMessage::AiConfig {
            model_id: "phi-3".to_string(),
            api_key: None,
            hf_token: None,
            sender: "teacher".to_string(),
            timestamp: "2024-01-01T00:00:00+00:00".to_string(),
            extra: Map::new(),
        };
        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(value["type"], "aiConfig");
        assert_eq!(value["modelId"], "phi-3");
        assert!(value.get("apiKey").is_none());
        assert!(value.get("hfToken").is_none());
    }
}
