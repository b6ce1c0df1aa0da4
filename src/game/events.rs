//! Outbound match events
//!
//! The match pushes these onto its queue during a tick; whoever hosts the
//! match drains them afterwards.

use serde::Serialize;

use super::combat::{ProjectileId, WeaponClass};
use super::player::PlayerId;

/// Why a match ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EndReason {
    /// At most one player is left standing
    LastStanding,
    /// The human player died
    HumanEliminated,
    /// Stopped from outside
    Aborted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeathCause {
    Shot,
    Zone,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MatchEvent {
    MatchStarted {
        player_count: usize,
    },
    PlayerCountUpdated {
        count: usize,
    },
    PlayerDamaged {
        player: PlayerId,
        health: f32,
    },
    WeaponPickup {
        player: PlayerId,
        weapon: WeaponClass,
    },
    ZoneUpdate {
        current_radius: f32,
        target_radius: f32,
        shrink_elapsed: f64,
        player_in_zone: bool,
    },
    /// A shrink phase just started
    ZoneWarning {
        target_radius: f32,
    },
    ProjectileFired {
        projectile: ProjectileId,
        owner: PlayerId,
        x: f32,
        y: f32,
        angle: f32,
    },
    PlayerDied {
        player: PlayerId,
        name: String,
        killer: Option<PlayerId>,
        cause: DeathCause,
    },
    GameOver {
        is_winner: bool,
    },
    MatchResult {
        winner_id: Option<PlayerId>,
        elapsed_ms: f64,
        reason: EndReason,
    },
}

impl MatchEvent {
    /// Events worth forwarding immediately instead of waiting for the next snapshot
    pub fn is_terminal(&self) -> bool {
        matches!(self, MatchEvent::MatchResult { .. })
    }
}
