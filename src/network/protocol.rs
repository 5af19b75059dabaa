//! Protocol Messages
//!
//! Wire format for client-server communication over WebSocket.
//! Every frame is a JSON object tagged by `"type"`.

use serde::{Deserialize, Serialize};

use crate::game::player::{Player, PlayerId};
use crate::game::registry::Snapshot;

// =============================================================================
// CLIENT -> SERVER MESSAGES
// =============================================================================

/// Messages sent from client to server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ClientMessage {
    /// Admission handshake. `token` absent or null means anonymous.
    Handshake {
        /// Identity token issued by the login flow.
        #[serde(default)]
        token: Option<String>,
    },

    /// Report a new position.
    Move {
        /// World X.
        x: f64,
        /// World Y.
        y: f64,
    },

    /// Client detected contact with the arena edge.
    HitEdge,

    /// Vertical nudge applied on top of the current position.
    Jump {
        /// Offset added to Y.
        xy: f64,
    },
}

// =============================================================================
// SERVER -> CLIENT MESSAGES
// =============================================================================

/// Messages sent from server to client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ServerMessage {
    /// Sent once to a newly admitted connection.
    Init {
        /// The receiver's own player id.
        id: PlayerId,
        /// Everyone currently registered, the receiver included.
        players: Snapshot,
    },

    /// A player joined (sent to everyone but the newcomer).
    Join(Player),

    /// A player moved (sent to everyone, the mover included).
    Move {
        /// Who moved.
        id: PlayerId,
        /// New X.
        x: f64,
        /// New Y.
        y: f64,
    },

    /// Periodic full-state sync.
    Update {
        /// Every registered player.
        players: Snapshot,
    },

    /// A player left.
    Leave {
        /// Departed player.
        id: PlayerId,
    },
}

// =============================================================================
// SERIALIZATION HELPERS
// =============================================================================

impl ClientMessage {
    /// Serialize to JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize from JSON string.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

impl ServerMessage {
    /// Serialize to JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize from JSON string.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }

    /// Wire name of this message.
    pub fn kind(&self) -> &'static str {
        match self {
            ServerMessage::Init { .. } => "init",
            ServerMessage::Join(_) => "join",
            ServerMessage::Move { .. } => "move",
            ServerMessage::Update { .. } => "update",
            ServerMessage::Leave { .. } => "leave",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_handshake() {
        let msg = ClientMessage::from_json(r#"{"type":"handshake","token":"alice"}"#).unwrap();
        assert_eq!(msg, ClientMessage::Handshake { token: Some("alice".into()) });
    }

    #[test]
    fn test_parse_handshake_without_token() {
        let missing = ClientMessage::from_json(r#"{"type":"handshake"}"#).unwrap();
        let null = ClientMessage::from_json(r#"{"type":"handshake","token":null}"#).unwrap();

        assert_eq!(missing, ClientMessage::Handshake { token: None });
        assert_eq!(null, ClientMessage::Handshake { token: None });
    }

    #[test]
    fn test_parse_move_and_hit_edge() {
        let msg = ClientMessage::from_json(r#"{"type":"move","x":10,"y":20.5}"#).unwrap();
        assert_eq!(msg, ClientMessage::Move { x: 10.0, y: 20.5 });

        let msg = ClientMessage::from_json(r#"{"type":"hitEdge"}"#).unwrap();
        assert_eq!(msg, ClientMessage::HitEdge);

        let msg = ClientMessage::from_json(r#"{"type":"jump","xy":-5}"#).unwrap();
        assert_eq!(msg, ClientMessage::Jump { xy: -5.0 });
    }

    #[test]
    fn test_malformed_move_rejected() {
        assert!(ClientMessage::from_json(r#"{"type":"move","x":10}"#).is_err());
        assert!(ClientMessage::from_json(r#"{"type":"move","x":"10","y":2}"#).is_err());
        assert!(ClientMessage::from_json(r#"{"type":"move","x":null,"y":2}"#).is_err());
        assert!(ClientMessage::from_json(r#"{"type":"teleport"}"#).is_err());
        assert!(ClientMessage::from_json("not json").is_err());
    }

    #[test]
    fn test_server_message_shapes() {
        let id = PlayerId::generate();
        let player = Player::new(id, "alice", 5.0, 6.0);

        let join = serde_json::to_value(ServerMessage::Join(player.clone())).unwrap();
        assert_eq!(join["type"], "join");
        assert_eq!(join["id"], id.to_string());
        assert_eq!(join["name"], "alice");

        let mv = serde_json::to_value(ServerMessage::Move { id, x: 1.0, y: 2.0 }).unwrap();
        assert_eq!(mv, json!({"type": "move", "id": id.to_string(), "x": 1.0, "y": 2.0}));

        let leave = serde_json::to_value(ServerMessage::Leave { id }).unwrap();
        assert_eq!(leave, json!({"type": "leave", "id": id.to_string()}));

        let mut players = Snapshot::new();
        players.insert(id, player);
        let init = serde_json::to_value(ServerMessage::Init { id, players }).unwrap();
        assert_eq!(init["type"], "init");
        assert_eq!(init["players"][id.to_string()]["name"], "alice");
    }

    #[test]
    fn test_server_message_json_roundtrip() {
        let id = PlayerId::generate();
        let mut players = Snapshot::new();
        players.insert(id, Player::new(id, "bob", 1.0, 1.0));
        let msg = ServerMessage::Update { players };

        let json = msg.to_json().unwrap();
        let parsed = ServerMessage::from_json(&json).unwrap();

        assert_eq!(parsed, msg);
        assert_eq!(parsed.kind(), "update");
    }
}
