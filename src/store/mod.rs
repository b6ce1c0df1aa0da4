//! In-memory session and player stat stores

pub mod players;
pub mod sessions;

pub use players::{PlayerStore, PlayerSummary};
pub use sessions::{Position, Session, SessionStatus, SessionStore};

/// Store operation errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("{0}")]
    InvalidInput(&'static str),

    #[error("Session not found")]
    SessionNotFound,

    #[error("Player not found in session")]
    PlayerNotInSession,

    #[error("Winner not found in session")]
    WinnerNotInSession,

    #[error("Player not found")]
    PlayerNotFound,

    #[error("Session is full")]
    SessionFull,

    #[error("Game is already in progress")]
    AlreadyInProgress,

    #[error("Game has already ended")]
    AlreadyCompleted,

    #[error("Only the host can start the game")]
    NotHost,

    #[error("Need at least 2 players to start")]
    NotEnoughPlayers,
}
