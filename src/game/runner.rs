//! Hosted matches: one tokio task per match, driven by a fixed-step clock

use dashmap::DashMap;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc};
use tokio::time::{interval, MissedTickBehavior};
use tracing::{info, warn};
use uuid::Uuid;

use crate::gateway::StatsGateway;
use crate::util::time::{tick_delta_ms, SIMULATION_TPS, SNAPSHOT_TPS};
use crate::ws::protocol::ServerMsg;
use crate::ws::relay::RelayHub;

use super::player::PlayerId;
use super::r#match::{Match, MatchOutcome, MatchPhase, PlayerCommand};
use super::snapshot::SnapshotBuilder;

/// Input sent to a running match task
#[derive(Debug, Clone)]
pub enum MatchCommand {
    Player(PlayerCommand),
    /// Start request from the given player
    Start(PlayerId),
    Ping { t: u64 },
    /// Stop the match
    Quit,
}

/// Session the match reports into
#[derive(Clone)]
pub struct SessionLink {
    pub session_id: Uuid,
    /// Relay to mirror player state into; `None` keeps the match private
    pub relay: Option<RelayHub>,
}

/// Handle to a running match
#[derive(Clone)]
pub struct MatchHandle {
    pub id: Uuid,
    pub command_tx: mpsc::Sender<MatchCommand>,
    pub event_tx: broadcast::Sender<ServerMsg>,
}

impl MatchHandle {
    pub fn subscribe(&self) -> broadcast::Receiver<ServerMsg> {
        self.event_tx.subscribe()
    }

    pub async fn send(&self, command: MatchCommand) -> bool {
        self.command_tx.send(command).await.is_ok()
    }
}

/// Registry of all active matches
pub struct MatchRegistry {
    matches: DashMap<Uuid, MatchHandle>,
}

impl MatchRegistry {
    pub fn new() -> Self {
        Self {
            matches: DashMap::new(),
        }
    }

    pub fn get(&self, id: &Uuid) -> Option<MatchHandle> {
        self.matches.get(id).map(|m| m.value().clone())
    }

    pub fn insert(&self, handle: MatchHandle) {
        self.matches.insert(handle.id, handle);
    }

    pub fn remove(&self, id: &Uuid) -> Option<MatchHandle> {
        self.matches.remove(id).map(|(_, h)| h)
    }

    pub fn active_matches(&self) -> usize {
        self.matches.len()
    }
}

impl Default for MatchRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Owns one `Match` and runs it to completion
pub struct MatchRunner {
    game: Match,
    command_rx: mpsc::Receiver<MatchCommand>,
    event_tx: broadcast::Sender<ServerMsg>,
    snapshot_builder: SnapshotBuilder,
    gateway: StatsGateway,
    session: Option<SessionLink>,
    tick_delta_ms: f64,
}

impl MatchRunner {
    pub fn new(
        game: Match,
        gateway: StatsGateway,
        session: Option<SessionLink>,
    ) -> (Self, MatchHandle) {
        let (command_tx, command_rx) = mpsc::channel(256);
        let (event_tx, _) = broadcast::channel(256);

        let handle = MatchHandle {
            id: game.id(),
            command_tx,
            event_tx: event_tx.clone(),
        };

        let runner = Self {
            game,
            command_rx,
            event_tx,
            snapshot_builder: SnapshotBuilder::new(SIMULATION_TPS / SNAPSHOT_TPS),
            gateway,
            session,
            tick_delta_ms: tick_delta_ms(),
        };

        (runner, handle)
    }

    /// Run the tick loop until the match ends, then report the result.
    /// Subscribe to the handle before calling this: a match nobody watches is aborted.
    pub async fn run(mut self) -> Option<MatchOutcome> {
        let match_id = self.game.id();
        info!(match_id = %match_id, players = self.game.player_count(), "Match task started");

        let tick_duration = Duration::from_micros(1_000_000 / SIMULATION_TPS as u64);
        let mut tick_interval = interval(tick_duration);
        tick_interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tick_interval.tick().await;

            self.process_commands();

            if self.event_tx.receiver_count() == 0 {
                info!(match_id = %match_id, "All subscribers left, aborting match");
                self.game.abort();
            }

            self.game.tick(self.tick_delta_ms);

            let events = self.game.drain_events();
            if !events.is_empty() {
                if events.iter().any(|e| e.is_terminal()) {
                    self.snapshot_builder.force_next();
                }
                let _ = self.event_tx.send(ServerMsg::Events {
                    tick: self.game.tick_count(),
                    events,
                });
            }

            if self.game.phase() != MatchPhase::Waiting && self.snapshot_builder.should_send() {
                let _ = self.event_tx.send(self.snapshot_builder.build(&self.game));
                self.mirror_to_relay();
            }

            if self.game.phase() == MatchPhase::Ended {
                break;
            }
        }

        let outcome = self.game.outcome().cloned();
        if let Some(outcome) = &outcome {
            info!(
                match_id = %match_id,
                reason = ?outcome.reason,
                winner = ?outcome.winner_name,
                elapsed_ms = outcome.elapsed_ms,
                "Match ended"
            );
            let _ = self.event_tx.send(ServerMsg::MatchEnd {
                outcome: outcome.clone(),
                report: self.game.report(),
            });
            self.report_result(outcome);
        }
        outcome
    }

    /// Drain pending commands without blocking
    fn process_commands(&mut self) {
        loop {
            match self.command_rx.try_recv() {
                Ok(MatchCommand::Player(command)) => self.game.queue_command(command),
                Ok(MatchCommand::Start(requester)) => {
                    if let Err(e) = self.game.start(requester) {
                        let _ = self.event_tx.send(ServerMsg::Error {
                            code: "start_refused".to_string(),
                            message: e.to_string(),
                        });
                    }
                }
                Ok(MatchCommand::Ping { t }) => {
                    let _ = self.event_tx.send(ServerMsg::Pong { t });
                }
                Ok(MatchCommand::Quit) | Err(mpsc::error::TryRecvError::Disconnected) => {
                    self.game.abort();
                    return;
                }
                Err(mpsc::error::TryRecvError::Empty) => return,
            }
        }
    }

    fn mirror_to_relay(&self) {
        let Some(SessionLink {
            session_id,
            relay: Some(relay),
        }) = &self.session
        else {
            return;
        };
        let session_id = session_id.to_string();
        for update in self.snapshot_builder.relay_updates(&self.game, &session_id) {
            relay.publish(&session_id, &update);
        }
    }

    /// Fire-and-forget report to the stats gateway
    fn report_result(&self, outcome: &MatchOutcome) {
        let Some(link) = &self.session else {
            return;
        };
        let game_stats = match serde_json::to_value(self.game.report()) {
            Ok(value) => value,
            Err(e) => {
                warn!(match_id = %self.game.id(), error = %e, "Failed to serialize match report");
                return;
            }
        };

        let gateway = self.gateway.clone();
        let session_id = link.session_id;
        let winner_id = outcome.winner_account;
        tokio::spawn(async move {
            if let Err(e) = gateway
                .report_match_end(session_id, winner_id, game_stats)
                .await
            {
                warn!(session_id = %session_id, error = %e, "Failed to report match result");
            }
        });
    }
}
