//! Snapshot building for hosted matches and the session relay

use crate::store::Position;
use crate::util::time::format_match_time;
use crate::ws::protocol::{
    MatchSnapshot, PickupSnapshot, PlayerSnapshot, ProjectileSnapshot, RelayOutbound, ServerMsg,
};

use super::r#match::Match;

/// Decides when to emit snapshots and builds them
pub struct SnapshotBuilder {
    /// Tick counter since last snapshot
    ticks_since_snapshot: u32,
    /// Snapshot interval in ticks
    snapshot_interval: u32,
}

impl SnapshotBuilder {
    pub fn new(snapshot_interval: u32) -> Self {
        Self {
            ticks_since_snapshot: 0,
            snapshot_interval: snapshot_interval.max(1),
        }
    }

    /// Check if it's time to send a snapshot
    pub fn should_send(&mut self) -> bool {
        self.ticks_since_snapshot += 1;
        if self.ticks_since_snapshot >= self.snapshot_interval {
            self.ticks_since_snapshot = 0;
            true
        } else {
            false
        }
    }

    /// Force snapshot on next check (used for important events)
    pub fn force_next(&mut self) {
        self.ticks_since_snapshot = self.snapshot_interval;
    }

    /// Full world state of `game`
    pub fn build(&self, game: &Match) -> ServerMsg {
        let players: Vec<PlayerSnapshot> = game
            .players()
            .values()
            .map(|p| PlayerSnapshot {
                id: p.id,
                name: p.name.clone(),
                is_human: p.is_human,
                x: p.x,
                y: p.y,
                rotation: p.rotation,
                vel_x: p.vel_x,
                vel_y: p.vel_y,
                health: p.health,
                weapon: p.weapon,
            })
            .collect();

        let projectiles = game
            .projectiles()
            .iter()
            .map(|(id, p)| ProjectileSnapshot {
                id: id.to_bits(),
                x: p.x,
                y: p.y,
                angle: p.angle,
            })
            .collect();

        let pickups = game
            .pickups()
            .iter()
            .map(|(id, p)| PickupSnapshot {
                id: id.to_bits(),
                weapon: p.weapon,
                x: p.x,
                y: p.y,
            })
            .collect();

        ServerMsg::Snapshot(MatchSnapshot {
            tick: game.tick_count(),
            phase: game.phase(),
            elapsed_ms: game.elapsed_ms(),
            clock: format_match_time(game.elapsed_ms() / 1000.0),
            alive: players.len(),
            zone: game.zone().status(),
            players,
            projectiles,
            pickups,
        })
    }

    /// Relay `playerUpdate` messages for every session-linked player in `game`
    pub fn relay_updates(&self, game: &Match, session_id: &str) -> Vec<RelayOutbound> {
        game.players()
            .values()
            .filter_map(|p| {
                let account = p.account_id?;
                Some(RelayOutbound::PlayerUpdate {
                    session_id: session_id.to_string(),
                    player_id: account.to_string(),
                    position: Some(Position { x: p.x, y: p.y }),
                    rotation: Some(p.rotation),
                    health: Some(p.health),
                    weapon: Some(p.weapon.as_str().to_string()),
                    last_action: None,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::r#match::MatchConfig;
    use uuid::Uuid;

    #[test]
    fn sends_every_interval_and_on_demand() {
        let mut builder = SnapshotBuilder::new(3);
        let sent: Vec<bool> = (0..6).map(|_| builder.should_send()).collect();
        assert_eq!(sent, vec![false, false, true, false, false, true]);

        builder.force_next();
        assert!(builder.should_send());
    }

    #[test]
    fn snapshot_lists_every_entity() {
        let mut game = Match::new(Uuid::new_v4(), 4, MatchConfig::default());
        game.setup_solo("Player".into()).unwrap();

        let builder = SnapshotBuilder::new(3);
        let json = serde_json::to_value(builder.build(&game)).unwrap();

        assert_eq!(json["type"], "snapshot");
        assert_eq!(json["players"].as_array().unwrap().len(), 16);
        assert_eq!(json["pickups"].as_array().unwrap().len(), 30);
        assert_eq!(json["phase"], "waiting");
        assert_eq!(json["clock"], "00:00");
        assert_eq!(json["zone"]["currentRadius"], 1000.0);
    }

    #[test]
    fn relay_updates_cover_linked_players_only() {
        let mut game = Match::new(Uuid::new_v4(), 4, MatchConfig::default());
        let human = game.setup_solo("Player".into()).unwrap();
        let account = Uuid::new_v4();
        game.set_account(human, account);

        let updates = SnapshotBuilder::new(3).relay_updates(&game, "s1");
        assert_eq!(updates.len(), 1);
        match &updates[0] {
            RelayOutbound::PlayerUpdate {
                player_id, weapon, ..
            } => {
                assert_eq!(player_id, &account.to_string());
                assert_eq!(weapon.as_deref(), Some("pistol"));
            }
            other => panic!("unexpected {:?}", other),
        }
    }
}
