//! Game session lifecycle: lobby, start, live player state, results

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use super::{PlayerStore, StoreError};

/// Session lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Waiting,
    InProgress,
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

/// Player entry inside a session
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionPlayer {
    pub player_id: Uuid,
    pub player_name: String,
    pub is_host: bool,
    pub joined_at: DateTime<Utc>,
    pub position: Option<Position>,
    pub health: Option<f32>,
    pub weapon: Option<String>,
    pub last_action: Option<String>,
}

/// Full session record
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub session_id: Uuid,
    pub status: SessionStatus,
    pub players: Vec<SessionPlayer>,
    pub current_players: usize,
    pub max_players: usize,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub game_started_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub game_ended_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub winner_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub game_stats: Option<serde_json::Value>,
}

/// Returned when a player creates or joins a session
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionTicket {
    pub session_id: Uuid,
    pub player_id: Uuid,
    pub player_name: String,
    pub is_host: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStarted {
    pub session_id: Uuid,
    pub status: SessionStatus,
    pub started_at: DateTime<Utc>,
}

/// Partial player state pushed by a client; absent fields are left alone
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerStateUpdate {
    pub position: Option<Position>,
    pub health: Option<f32>,
    pub weapon: Option<String>,
    pub action: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerStateAck {
    pub session_id: Uuid,
    pub player_id: Uuid,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionEnded {
    pub session_id: Uuid,
    pub status: SessionStatus,
    pub winner_id: Option<Uuid>,
    pub winner_name: Option<String>,
    pub ended_at: DateTime<Utc>,
}

/// Session store operations
#[derive(Clone)]
pub struct SessionStore {
    sessions: Arc<DashMap<Uuid, Session>>,
    players: PlayerStore,
    max_players: usize,
}

impl SessionStore {
    pub fn new(players: PlayerStore, max_players: usize) -> Self {
        Self {
            sessions: Arc::new(DashMap::new()),
            players,
            max_players: max_players.max(2),
        }
    }

    pub fn players(&self) -> &PlayerStore {
        &self.players
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    fn validate_name(player_name: &str) -> Result<String, StoreError> {
        let name = player_name.trim();
        if name.is_empty() {
            return Err(StoreError::InvalidInput("Player name is required"));
        }
        Ok(name.to_string())
    }

    /// Open a new lobby with the caller as host
    pub fn create_session(&self, player_name: &str) -> Result<SessionTicket, StoreError> {
        let player_name = Self::validate_name(player_name)?;
        let now = Utc::now();
        let session_id = Uuid::new_v4();
        let player_id = Uuid::new_v4();

        let session = Session {
            session_id,
            status: SessionStatus::Waiting,
            players: vec![SessionPlayer {
                player_id,
                player_name: player_name.clone(),
                is_host: true,
                joined_at: now,
                position: None,
                health: None,
                weapon: None,
                last_action: None,
            }],
            current_players: 1,
            max_players: self.max_players,
            created_at: now,
            updated_at: now,
            game_started_at: None,
            game_ended_at: None,
            winner_id: None,
            game_stats: None,
        };
        self.sessions.insert(session_id, session);

        info!(session_id = %session_id, player_id = %player_id, "Session created");

        Ok(SessionTicket {
            session_id,
            player_id,
            player_name,
            is_host: true,
        })
    }

    pub fn join_session(
        &self,
        session_id: Uuid,
        player_name: &str,
    ) -> Result<SessionTicket, StoreError> {
        let player_name = Self::validate_name(player_name)?;
        let mut session = self
            .sessions
            .get_mut(&session_id)
            .ok_or(StoreError::SessionNotFound)?;

        if session.current_players >= session.max_players {
            return Err(StoreError::SessionFull);
        }
        if session.status != SessionStatus::Waiting {
            return Err(StoreError::AlreadyInProgress);
        }

        let now = Utc::now();
        let player_id = Uuid::new_v4();
        session.players.push(SessionPlayer {
            player_id,
            player_name: player_name.clone(),
            is_host: false,
            joined_at: now,
            position: None,
            health: None,
            weapon: None,
            last_action: None,
        });
        session.current_players += 1;
        session.updated_at = now;

        info!(
            session_id = %session_id,
            player_id = %player_id,
            player_count = session.current_players,
            "Player joined session"
        );

        Ok(SessionTicket {
            session_id,
            player_id,
            player_name,
            is_host: false,
        })
    }

    /// Move a lobby to in-progress. Host only, needs at least two players.
    pub fn start_game(
        &self,
        session_id: Uuid,
        player_id: Uuid,
    ) -> Result<SessionStarted, StoreError> {
        let mut session = self
            .sessions
            .get_mut(&session_id)
            .ok_or(StoreError::SessionNotFound)?;

        let is_host = session
            .players
            .iter()
            .any(|p| p.player_id == player_id && p.is_host);
        if !is_host {
            return Err(StoreError::NotHost);
        }
        if session.current_players < 2 {
            return Err(StoreError::NotEnoughPlayers);
        }
        if session.status != SessionStatus::Waiting {
            return Err(StoreError::AlreadyInProgress);
        }

        let now = Utc::now();
        session.status = SessionStatus::InProgress;
        session.game_started_at = Some(now);
        session.updated_at = now;

        info!(session_id = %session_id, "Session started");

        Ok(SessionStarted {
            session_id,
            status: session.status,
            started_at: now,
        })
    }

    pub fn get_session(&self, session_id: Uuid) -> Result<Session, StoreError> {
        self.sessions
            .get(&session_id)
            .map(|s| s.value().clone())
            .ok_or(StoreError::SessionNotFound)
    }

    /// Record the latest client-reported state for one player
    pub fn update_player_state(
        &self,
        session_id: Uuid,
        player_id: Uuid,
        update: PlayerStateUpdate,
    ) -> Result<PlayerStateAck, StoreError> {
        let mut session = self
            .sessions
            .get_mut(&session_id)
            .ok_or(StoreError::SessionNotFound)?;

        let player = session
            .players
            .iter_mut()
            .find(|p| p.player_id == player_id)
            .ok_or(StoreError::PlayerNotInSession)?;

        if let Some(position) = update.position {
            player.position = Some(position);
        }
        if let Some(health) = update.health {
            player.health = Some(health);
        }
        if let Some(weapon) = update.weapon {
            player.weapon = Some(weapon);
        }
        if let Some(action) = update.action {
            player.last_action = Some(action);
        }

        let now = Utc::now();
        session.updated_at = now;

        Ok(PlayerStateAck {
            session_id,
            player_id,
            updated_at: now,
        })
    }

    /// Close a session and count the match for every session player.
    /// `winner_id` is `None` when nobody in the session won (a bot did).
    /// A waiting lobby may be closed (solo matches never start it); a
    /// completed one may not, so each session counts once.
    pub fn end_game(
        &self,
        session_id: Uuid,
        winner_id: Option<Uuid>,
        game_stats: Option<serde_json::Value>,
    ) -> Result<SessionEnded, StoreError> {
        let mut session = self
            .sessions
            .get_mut(&session_id)
            .ok_or(StoreError::SessionNotFound)?;

        if session.status == SessionStatus::Completed {
            return Err(StoreError::AlreadyCompleted);
        }

        let winner_name = match winner_id {
            Some(id) => Some(
                session
                    .players
                    .iter()
                    .find(|p| p.player_id == id)
                    .map(|p| p.player_name.clone())
                    .ok_or(StoreError::WinnerNotInSession)?,
            ),
            None => None,
        };

        let now = Utc::now();
        session.status = SessionStatus::Completed;
        session.game_ended_at = Some(now);
        session.updated_at = now;
        session.winner_id = winner_id;
        session.game_stats = Some(game_stats.unwrap_or_else(|| serde_json::json!({})));

        for player in &session.players {
            let won = Some(player.player_id) == winner_id;
            self.players
                .record_result(player.player_id, &player.player_name, won, now);
        }

        info!(
            session_id = %session_id,
            winner_id = ?winner_id,
            "Session completed"
        );

        Ok(SessionEnded {
            session_id,
            status: session.status,
            winner_id,
            winner_name,
            ended_at: now,
        })
    }

    /// Drop lobbies that have sat in `waiting` longer than `ttl`. Returns how many were removed.
    pub fn sweep_expired_lobbies(&self, ttl: Duration, now: DateTime<Utc>) -> usize {
        let before = self.sessions.len();
        self.sessions
            .retain(|_, s| s.status != SessionStatus::Waiting || now - s.updated_at <= ttl);
        before - self.sessions.len()
    }
}
