//! Synchronization messages exchanged over the broadcast domain.
//!
//! Every message is a JSON object tagged by `type`:
//!
//! ```text
//! {"type":"PLAYER_UPDATE","player":{...}}
//! {"type":"PLAYER_DISCONNECT","id":"..."}
//! {"type":"PLAYER_EATEN","predatorId":"...","preyId":"..."}
//! ```

use crate::{Color, EntityId, Position, ProtocolError};
use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// Full snapshot of one entity as announced by its owner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerState {
    pub id: EntityId,
    pub name: String,
    pub pos: Position,
    pub radius: f32,
    pub color: Color,
    pub score: f32,
    /// Owner's monotonic clock reading (ms) at emission.
    pub last_update: u64,
}

/// A message on the broadcast domain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE", rename_all_fields = "camelCase")]
pub enum SyncMessage {
    /// Periodic state snapshot of the sender's own entity.
    PlayerUpdate { player: PlayerState },
    /// The named entity left the domain.
    PlayerDisconnect { id: EntityId },
    /// `predator_id` absorbed `prey_id`.
    PlayerEaten {
        predator_id: EntityId,
        prey_id: EntityId,
    },
    /// Any discriminator this build does not know. Never sent.
    #[serde(other, skip_serializing)]
    Unknown,
}

impl SyncMessage {
    /// Encode into a frame ready for the broadcast bus.
    pub fn encode(&self) -> Result<Bytes, ProtocolError> {
        Ok(Bytes::from(serde_json::to_vec(self)?))
    }

    /// Decode a frame received from the broadcast bus.
    pub fn decode(frame: &[u8]) -> Result<Self, ProtocolError> {
        Ok(serde_json::from_slice(frame)?)
    }

    /// Wire discriminator, for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            SyncMessage::PlayerUpdate { .. } => "PLAYER_UPDATE",
            SyncMessage::PlayerDisconnect { .. } => "PLAYER_DISCONNECT",
            SyncMessage::PlayerEaten { .. } => "PLAYER_EATEN",
            SyncMessage::Unknown => "UNKNOWN",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PREDATOR: &str = "6f1c2a0e-8d3b-4c5a-9e7f-0a1b2c3d4e5f";
    const PREY: &str = "0b9d8c7e-6f5a-4b3c-8d2e-1f0a9b8c7d6e";

    #[test]
    fn test_decode_eaten() {
        let json = format!(r#"{{"type":"PLAYER_EATEN","predatorId":"{PREDATOR}","preyId":"{PREY}"}}"#);
        let msg = SyncMessage::decode(json.as_bytes()).unwrap();
        match msg {
            SyncMessage::PlayerEaten { predator_id, prey_id } => {
                assert_eq!(predator_id.to_string(), PREDATOR);
                assert_eq!(prey_id.to_string(), PREY);
            }
            other => panic!("unexpected message: {other:?}"),
        }
    }

    #[test]
    fn test_decode_update() {
        let json = format!(
            r##"{{"type":"PLAYER_UPDATE","player":{{"id":"{PREY}","name":"blob","pos":[105.0,100.0],"radius":30.5,"color":"#3b82f6","score":31.0,"lastUpdate":1600}}}}"##
        );
        let msg = SyncMessage::decode(json.as_bytes()).unwrap();
        let SyncMessage::PlayerUpdate { player } = msg else {
            panic!("expected PLAYER_UPDATE");
        };
        assert_eq!(player.name, "blob");
        assert_eq!(player.pos, Position::new(105.0, 100.0));
        assert_eq!(player.radius, 30.5);
        assert_eq!(player.color, Color::new(0x3b, 0x82, 0xf6));
        assert_eq!(player.last_update, 1600);
    }

    #[test]
    fn test_encode_uses_wire_names() {
        let id = EntityId::from_random_bytes([1; 16]);
        let frame = SyncMessage::PlayerDisconnect { id }.encode().unwrap();
        let value: serde_json::Value = serde_json::from_slice(&frame).unwrap();
        assert_eq!(value["type"], "PLAYER_DISCONNECT");
        assert_eq!(value["id"], id.to_string());

        let frame = SyncMessage::PlayerEaten { predator_id: id, prey_id: id }.encode().unwrap();
        let value: serde_json::Value = serde_json::from_slice(&frame).unwrap();
        assert!(value.get("predatorId").is_some());
        assert!(value.get("preyId").is_some());
    }

    #[test]
    fn test_unknown_discriminator() {
        let msg = SyncMessage::decode(br#"{"type":"PLAYER_WAVED","id":"x"}"#).unwrap();
        assert_eq!(msg, SyncMessage::Unknown);
        assert!(SyncMessage::Unknown.encode().is_err());
    }

    #[test]
    fn test_malformed_frames() {
        assert!(SyncMessage::decode(b"not json").is_err());
        assert!(SyncMessage::decode(br#"{"id":"missing type"}"#).is_err());
        let bad_color = format!(
            r#"{{"type":"PLAYER_UPDATE","player":{{"id":"{PREY}","name":"x","pos":[0,0],"radius":30,"color":"red","score":30,"lastUpdate":0}}}}"#
        );
        assert!(SyncMessage::decode(bad_color.as_bytes()).is_err());
    }
}
