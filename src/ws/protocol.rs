//! WebSocket protocol message definitions
//! Wire types for the session relay (`/ws`) and hosted matches (`/solo`)

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::game::combat::WeaponClass;
use crate::game::events::MatchEvent;
use crate::game::player::PlayerId;
use crate::game::r#match::{MatchOutcome, MatchPhase, MatchReport};
use crate::game::world::{ArenaBounds, Obstacle};
use crate::game::zone::ZoneStatus;
use crate::store::Position;

// ============================================================================
// Session relay
// ============================================================================

/// Messages a relay client sends
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum RelayInbound {
    #[serde(rename_all = "camelCase")]
    Join {
        session_id: String,
        data: RelayJoin,
    },
    #[serde(rename_all = "camelCase")]
    Update {
        session_id: String,
        data: RelayPlayerState,
    },
    #[serde(rename_all = "camelCase")]
    Leave {
        session_id: String,
        data: RelayLeave,
    },
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelayJoin {
    pub player_id: String,
    pub player_name: Option<String>,
}

/// Opaque player state forwarded to the rest of the session
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelayPlayerState {
    pub player_id: String,
    pub position: Option<Position>,
    pub rotation: Option<f32>,
    pub health: Option<f32>,
    pub weapon: Option<String>,
    pub action: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelayLeave {
    pub player_id: String,
}

/// Messages the relay fans out
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum RelayOutbound {
    #[serde(rename_all = "camelCase")]
    PlayerJoined {
        session_id: String,
        player_id: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        player_name: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    PlayerUpdate {
        session_id: String,
        player_id: String,
        position: Option<Position>,
        rotation: Option<f32>,
        health: Option<f32>,
        weapon: Option<String>,
        last_action: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    PlayerLeft {
        session_id: String,
        player_id: String,
    },
}

/// Reply sent only to the sender of a bad relay message
#[derive(Debug, Clone, Serialize)]
pub struct RelayNotice {
    pub message: String,
}

// ============================================================================
// Hosted match
// ============================================================================

/// Messages sent from a hosted-match client to the server
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMsg {
    /// Movement vector, magnitude clamped to 1
    Move { dx: f32, dy: f32 },
    /// Aim and pull the trigger (ignored while on cooldown)
    AimAndFire { angle: f32 },
    EquipWeapon { weapon: WeaponClass },
    /// Host asks to begin the match
    Start,
    Ping { t: u64 },
    /// Give up and end the match
    Quit,
}

/// Messages sent from server to a hosted-match client
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMsg {
    /// Sent once after connecting
    Welcome {
        match_id: Uuid,
        player_id: PlayerId,
        player_name: String,
        seed: u64,
        server_time: u64,
        bounds: ArenaBounds,
        obstacles: Vec<Obstacle>,
    },

    /// Periodic world state
    Snapshot(MatchSnapshot),

    /// Events produced by the last tick
    Events { tick: u64, events: Vec<MatchEvent> },

    /// Final result, sent once
    MatchEnd {
        outcome: MatchOutcome,
        report: MatchReport,
    },

    Error { code: String, message: String },

    Pong { t: u64 },
}

/// Full world state at one tick
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchSnapshot {
    pub tick: u64,
    pub phase: MatchPhase,
    pub elapsed_ms: f64,
    /// `MM:SS` match clock
    pub clock: String,
    pub alive: usize,
    pub zone: ZoneStatus,
    pub players: Vec<PlayerSnapshot>,
    pub projectiles: Vec<ProjectileSnapshot>,
    pub pickups: Vec<PickupSnapshot>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerSnapshot {
    pub id: PlayerId,
    pub name: String,
    pub is_human: bool,
    pub x: f32,
    pub y: f32,
    pub rotation: f32,
    pub vel_x: f32,
    pub vel_y: f32,
    pub health: f32,
    pub weapon: WeaponClass,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProjectileSnapshot {
    pub id: u64,
    pub x: f32,
    pub y: f32,
    pub angle: f32,
}

#[derive(Debug, Clone, Serialize)]
pub struct PickupSnapshot {
    pub id: u64,
    pub weapon: WeaponClass,
    pub x: f32,
    pub y: f32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relay_inbound_uses_camel_case_fields() {
        let msg: RelayInbound = serde_json::from_str(
            r#"{"action":"update","sessionId":"s1","data":{"playerId":"p1","position":{"x":1.0,"y":2.0},"action":"shoot"}}"#,
        )
        .unwrap();
        match msg {
            RelayInbound::Update { session_id, data } => {
                assert_eq!(session_id, "s1");
                assert_eq!(data.player_id, "p1");
                assert_eq!(data.position, Some(Position { x: 1.0, y: 2.0 }));
                assert_eq!(data.action.as_deref(), Some("shoot"));
                assert_eq!(data.health, None);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn unknown_relay_action_is_rejected() {
        assert!(serde_json::from_str::<RelayInbound>(r#"{"action":"dance","sessionId":"s1","data":{}}"#).is_err());
    }

    #[test]
    fn player_update_carries_last_action() {
        let json = serde_json::to_value(RelayOutbound::PlayerUpdate {
            session_id: "s1".into(),
            player_id: "p1".into(),
            position: Some(Position { x: 3.0, y: 4.0 }),
            rotation: Some(0.5),
            health: Some(90.0),
            weapon: Some("rifle".into()),
            last_action: Some("shoot".into()),
        })
        .unwrap();
        assert_eq!(json["action"], "playerUpdate");
        assert_eq!(json["sessionId"], "s1");
        assert_eq!(json["lastAction"], "shoot");
        assert_eq!(json["position"]["x"], 3.0);
    }

    #[test]
    fn player_joined_omits_missing_name() {
        let json = serde_json::to_value(RelayOutbound::PlayerJoined {
            session_id: "s1".into(),
            player_id: "p1".into(),
            player_name: None,
        })
        .unwrap();
        assert_eq!(json["action"], "playerJoined");
        assert!(json.get("playerName").is_none());
    }

    #[test]
    fn client_commands_parse() {
        let msg: ClientMsg = serde_json::from_str(r#"{"type":"aim_and_fire","angle":1.5}"#).unwrap();
        assert!(matches!(msg, ClientMsg::AimAndFire { angle } if angle == 1.5));

        let msg: ClientMsg = serde_json::from_str(r#"{"type":"equip_weapon","weapon":"shotgun"}"#).unwrap();
        assert!(matches!(msg, ClientMsg::EquipWeapon { weapon: WeaponClass::Shotgun }));

        let msg: ClientMsg = serde_json::from_str(r#"{"type":"start"}"#).unwrap();
        assert!(matches!(msg, ClientMsg::Start));
    }
}
