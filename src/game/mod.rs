//! Game simulation modules

pub mod ai;
pub mod arena;
pub mod collision;
pub mod combat;
pub mod events;
pub mod r#match;
pub mod math;
pub mod physics;
pub mod player;
pub mod runner;
pub mod snapshot;
pub mod world;
pub mod zone;

pub use events::{DeathCause, EndReason, MatchEvent};
pub use player::{Player, PlayerId};
pub use r#match::{
    Match, MatchConfig, MatchError, MatchOutcome, MatchPhase, MatchReport, PlayerCommand,
};
pub use runner::{MatchCommand, MatchHandle, MatchRegistry, MatchRunner, SessionLink};
