//! Lifetime player statistics

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

use super::StoreError;

/// Stored per-player record
#[derive(Debug, Clone)]
struct PlayerRecord {
    player_name: String,
    matches: u32,
    wins: u32,
    last_played: DateTime<Utc>,
}

/// Player stats as returned to clients
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerSummary {
    pub player_id: Uuid,
    pub player_name: String,
    pub matches: u32,
    pub wins: u32,
    /// Percentage of matches won (0-100)
    pub win_rate: f64,
    pub last_played: DateTime<Utc>,
}

#[derive(Clone, Default)]
pub struct PlayerStore {
    records: Arc<DashMap<Uuid, PlayerRecord>>,
}

impl PlayerStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one finished match for a player, creating the record on first play
    pub fn record_result(&self, player_id: Uuid, player_name: &str, won: bool, at: DateTime<Utc>) {
        let mut record = self.records.entry(player_id).or_insert_with(|| PlayerRecord {
            player_name: player_name.to_string(),
            matches: 0,
            wins: 0,
            last_played: at,
        });
        record.matches += 1;
        if won {
            record.wins += 1;
        }
        record.last_played = at;
    }

    pub fn get_stats(&self, player_id: Uuid) -> Result<PlayerSummary, StoreError> {
        let record = self
            .records
            .get(&player_id)
            .ok_or(StoreError::PlayerNotFound)?;

        let win_rate = if record.matches > 0 {
            record.wins as f64 / record.matches as f64 * 100.0
        } else {
            0.0
        };

        Ok(PlayerSummary {
            player_id,
            player_name: record.player_name.clone(),
            matches: record.matches,
            wins: record.wins,
            win_rate,
            last_played: record.last_played,
        })
    }
}
