//! Match state and the fixed-order simulation tick

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use std::collections::HashMap;
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

use super::ai::{self, AiIntent};
use super::arena::Arena;
use super::collision::{CollisionEvent, CollisionSystem};
use super::combat::{CombatSystem, Projectile, ProjectileSpec, WeaponClass};
use super::events::{DeathCause, EndReason, MatchEvent};
use super::math::distance;
use super::physics::PhysicsSystem;
use super::player::{Player, PlayerId, PlayerStats, PLAYER_RADIUS};
use super::world::{
    random_pickup, scatter_obstacles, ArenaBounds, Obstacle, PickupId, WeaponPickup,
};
use super::zone::{SafeZone, ZoneConfig, ZoneTransition};
use crate::util::names::bot_name;

/// Bots never spawn closer than this to the human
pub const MIN_BOT_SPAWN_DISTANCE: f32 = 300.0;

/// Placement attempts before accepting a close spawn
const SPAWN_ATTEMPTS: usize = 32;

/// Match phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchPhase {
    /// Gathering players
    Waiting,
    /// Simulation ticking
    Running,
    /// Finished, no further ticks
    Ended,
}

/// Why a lifecycle command was refused
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MatchError {
    #[error("only the host can start the match")]
    NotHost,
    #[error("at least 2 players are needed, have {0}")]
    NotEnoughPlayers(usize),
    #[error("match already started")]
    AlreadyStarted,
}

/// Simulation tuning
#[derive(Debug, Clone)]
pub struct MatchConfig {
    pub arena_size: f32,
    pub obstacle_count: usize,
    pub pickup_count: usize,
    pub bot_count: usize,
    /// Time between AI decisions (milliseconds, 0 = every tick)
    pub ai_interval_ms: f64,
    pub zone: ZoneConfig,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            arena_size: 2000.0,
            obstacle_count: 50,
            pickup_count: 30,
            bot_count: 15,
            ai_interval_ms: 500.0,
            zone: ZoneConfig::default(),
        }
    }
}

/// Commands the human player can issue between ticks
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PlayerCommand {
    Move { dx: f32, dy: f32 },
    AimAndFire { angle: f32 },
    EquipWeapon { weapon: WeaponClass },
}

/// Final record for one player
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerResult {
    pub name: String,
    pub is_human: bool,
    pub account_id: Option<Uuid>,
    /// 1 = winner; players eliminated in the same tick share a placement
    pub placement: usize,
    #[serde(flatten)]
    pub stats: PlayerStats,
}

/// How a match ended
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchOutcome {
    pub winner: Option<PlayerId>,
    pub winner_name: Option<String>,
    pub winner_account: Option<Uuid>,
    pub elapsed_ms: f64,
    pub reason: EndReason,
}

/// Summary handed to the stats gateway
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchReport {
    pub match_id: Uuid,
    pub duration_ms: f64,
    pub reason: EndReason,
    pub winner_name: Option<String>,
    pub players: Vec<PlayerResult>,
}

/// One battle-royale match. Owns every entity collection; subsystems only
/// borrow them for the duration of a tick.
pub struct Match {
    id: Uuid,
    seed: u64,
    config: MatchConfig,
    phase: MatchPhase,
    tick: u64,
    elapsed_ms: f64,
    ai_timer_ms: f64,
    bounds: ArenaBounds,
    players: Arena<Player>,
    projectiles: Arena<Projectile>,
    pickups: Arena<WeaponPickup>,
    obstacles: Vec<Obstacle>,
    zone: SafeZone,
    rng: ChaCha8Rng,
    host: Option<PlayerId>,
    human: Option<PlayerId>,
    human_in_zone: bool,
    pending: Vec<PlayerCommand>,
    events: Vec<MatchEvent>,
    killers: HashMap<PlayerId, PlayerId>,
    fallen: Vec<PlayerResult>,
    outcome: Option<MatchOutcome>,
}

impl Match {
    /// Create a match with a freshly generated arena
    pub fn new(id: Uuid, seed: u64, config: MatchConfig) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let bounds = ArenaBounds::square(config.arena_size);
        let (cx, cy) = bounds.center();
        let zone = SafeZone::new(cx, cy, config.arena_size / 2.0, config.zone.clone());

        let obstacles = scatter_obstacles(&bounds, config.obstacle_count, &mut rng);
        let mut pickups = Arena::new();
        for _ in 0..config.pickup_count {
            let (weapon, x, y) = random_pickup(&bounds, &mut rng);
            pickups.insert_with(|id| WeaponPickup { id, weapon, x, y });
        }

        Self {
            id,
            seed,
            config,
            phase: MatchPhase::Waiting,
            tick: 0,
            elapsed_ms: 0.0,
            ai_timer_ms: 0.0,
            bounds,
            players: Arena::new(),
            projectiles: Arena::new(),
            pickups,
            obstacles,
            zone,
            rng,
            host: None,
            human: None,
            human_in_zone: true,
            pending: Vec::new(),
            events: Vec::new(),
            killers: HashMap::new(),
            fallen: Vec::new(),
            outcome: None,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn phase(&self) -> MatchPhase {
        self.phase
    }

    pub fn tick_count(&self) -> u64 {
        self.tick
    }

    pub fn elapsed_ms(&self) -> f64 {
        self.elapsed_ms
    }

    pub fn bounds(&self) -> &ArenaBounds {
        &self.bounds
    }

    pub fn players(&self) -> &Arena<Player> {
        &self.players
    }

    pub fn projectiles(&self) -> &Arena<Projectile> {
        &self.projectiles
    }

    pub fn pickups(&self) -> &Arena<WeaponPickup> {
        &self.pickups
    }

    pub fn obstacles(&self) -> &[Obstacle] {
        &self.obstacles
    }

    pub fn zone(&self) -> &SafeZone {
        &self.zone
    }

    pub fn host(&self) -> Option<PlayerId> {
        self.host
    }

    pub fn human(&self) -> Option<PlayerId> {
        self.human
    }

    pub fn outcome(&self) -> Option<&MatchOutcome> {
        self.outcome.as_ref()
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    /// Add a player at a random position. The first player becomes the host;
    /// the first human becomes the command target.
    pub fn add_player(&mut self, name: String, is_human: bool) -> Result<PlayerId, MatchError> {
        if self.phase != MatchPhase::Waiting {
            return Err(MatchError::AlreadyStarted);
        }

        let (x, y) = self.spawn_point();
        let id = self
            .players
            .insert_with(|id| Player::new(id, name, is_human, x, y));

        if self.host.is_none() {
            self.host = Some(id);
        }
        if is_human && self.human.is_none() {
            self.human = Some(id);
        }

        self.events.push(MatchEvent::PlayerCountUpdated {
            count: self.players.len(),
        });
        Ok(id)
    }

    /// Link a player to a backend session player
    pub fn set_account(&mut self, player: PlayerId, account_id: Uuid) {
        if let Some(p) = self.players.get_mut(player) {
            p.account_id = Some(account_id);
        }
    }

    /// Add `count` bots named Bot1..BotN
    pub fn add_bots(&mut self, count: usize) -> Result<Vec<PlayerId>, MatchError> {
        (1..=count)
            .map(|n| self.add_player(bot_name(n), false))
            .collect()
    }

    /// One human host plus the configured number of bots
    pub fn setup_solo(&mut self, human_name: String) -> Result<PlayerId, MatchError> {
        let human = self.add_player(human_name, true)?;
        self.add_bots(self.config.bot_count)?;
        Ok(human)
    }

    /// Random spawn point, kept away from the human when there is one
    fn spawn_point(&mut self) -> (f32, f32) {
        let human_pos = self
            .human
            .and_then(|id| self.players.get(id))
            .map(|p| (p.x, p.y));

        let mut point = self.bounds.random_point(&mut self.rng);
        if let Some((hx, hy)) = human_pos {
            for _ in 0..SPAWN_ATTEMPTS {
                if distance(point.0, point.1, hx, hy) >= MIN_BOT_SPAWN_DISTANCE {
                    break;
                }
                point = self.bounds.random_point(&mut self.rng);
            }
        }
        point
    }

    /// Waiting -> Running. Only the host may start, and only with 2+ players.
    pub fn start(&mut self, requester: PlayerId) -> Result<(), MatchError> {
        if self.phase != MatchPhase::Waiting {
            return Err(MatchError::AlreadyStarted);
        }
        if self.host != Some(requester) {
            return Err(MatchError::NotHost);
        }
        if self.players.len() < 2 {
            return Err(MatchError::NotEnoughPlayers(self.players.len()));
        }

        self.phase = MatchPhase::Running;
        self.zone.schedule_first_shrink(self.elapsed_ms);
        self.events.push(MatchEvent::MatchStarted {
            player_count: self.players.len(),
        });
        self.events.push(MatchEvent::PlayerCountUpdated {
            count: self.players.len(),
        });

        debug!(match_id = %self.id, players = self.players.len(), "Match started");
        Ok(())
    }

    /// Queue a human command for the next tick
    pub fn queue_command(&mut self, command: PlayerCommand) {
        if self.phase != MatchPhase::Ended {
            self.pending.push(command);
        }
    }

    pub fn move_player(&mut self, dx: f32, dy: f32) {
        self.queue_command(PlayerCommand::Move { dx, dy });
    }

    pub fn aim_and_fire(&mut self, angle: f32) {
        self.queue_command(PlayerCommand::AimAndFire { angle });
    }

    pub fn equip_weapon(&mut self, weapon: WeaponClass) {
        self.queue_command(PlayerCommand::EquipWeapon { weapon });
    }

    /// Stop the match from outside. No further ticks run.
    pub fn abort(&mut self) {
        if self.phase == MatchPhase::Ended {
            return;
        }
        self.finish(None, EndReason::Aborted);
    }

    /// Take every event produced since the last drain
    pub fn drain_events(&mut self) -> Vec<MatchEvent> {
        std::mem::take(&mut self.events)
    }

    /// Advance the simulation by `delta_ms`
    pub fn tick(&mut self, delta_ms: f64) {
        if self.phase != MatchPhase::Running {
            return;
        }
        let delta_ms = delta_ms.max(0.0);
        self.tick += 1;
        self.elapsed_ms += delta_ms;
        let now = self.elapsed_ms;

        self.apply_human_input(now);
        self.run_ai(now, delta_ms);
        self.move_entities(delta_ms);
        self.resolve_collisions(now);
        self.update_zone(now, delta_ms);
        self.remove_dead();
        self.check_win_condition();
    }

    fn apply_human_input(&mut self, now: f64) {
        let commands = std::mem::take(&mut self.pending);
        let Some(human_id) = self.human else {
            return;
        };

        for command in commands {
            let Some(human) = self.players.get_mut(human_id) else {
                return;
            };
            match command {
                PlayerCommand::Move { dx, dy } => human.set_move(dx, dy),
                PlayerCommand::AimAndFire { angle } => {
                    human.face(angle);
                    let shots = CombatSystem::fire(human, angle, now, &mut self.rng);
                    self.spawn_projectiles(shots);
                }
                PlayerCommand::EquipWeapon { weapon } => {
                    if human.is_alive() {
                        human.equip_weapon(weapon);
                    }
                }
            }
        }
    }

    fn run_ai(&mut self, now: f64, delta_ms: f64) {
        self.ai_timer_ms += delta_ms;
        if self.config.ai_interval_ms > 0.0 && self.ai_timer_ms < self.config.ai_interval_ms {
            return;
        }
        self.ai_timer_ms = 0.0;

        let mut intents: Vec<(PlayerId, AiIntent)> = Vec::new();
        for (id, player) in self.players.iter() {
            if player.is_human || !player.is_alive() {
                continue;
            }
            let mut decision_rng = ChaCha8Rng::seed_from_u64(self.rng.gen());
            let intent = ai::decide(
                player,
                &self.players,
                &self.zone,
                &self.pickups,
                &mut decision_rng,
            );
            intents.push((id, intent));
        }

        for (id, intent) in intents {
            let Some(bot) = self.players.get_mut(id) else {
                continue;
            };
            if let Some(angle) = intent.move_angle {
                bot.move_in_direction(angle);
            }
            if let Some(angle) = intent.fire_angle {
                let shots = CombatSystem::fire(bot, angle, now, &mut self.rng);
                self.spawn_projectiles(shots);
            }
            if let Some(pickup) = intent.pickup_id {
                self.collect_pickup(id, pickup);
            }
        }
    }

    fn spawn_projectiles(&mut self, shots: Vec<ProjectileSpec>) {
        for spec in shots {
            let id = self.projectiles.insert_with(|id| spec.into_projectile(id));
            self.events.push(MatchEvent::ProjectileFired {
                projectile: id,
                owner: spec.owner_id,
                x: spec.x,
                y: spec.y,
                angle: spec.angle,
            });
        }
    }

    fn collect_pickup(&mut self, player_id: PlayerId, pickup_id: PickupId) {
        let Some(player) = self.players.get_mut(player_id) else {
            return;
        };
        if !player.is_alive() {
            return;
        }
        let Some(pickup) = self.pickups.remove(pickup_id) else {
            return;
        };
        player.equip_weapon(pickup.weapon);
        self.events.push(MatchEvent::WeaponPickup {
            player: player_id,
            weapon: pickup.weapon,
        });
    }

    fn move_entities(&mut self, delta_ms: f64) {
        for (_, player) in self.players.iter_mut() {
            player.advance(delta_ms);
            if player.is_human {
                (player.x, player.y) = PhysicsSystem::constrain_body(
                    player.x,
                    player.y,
                    PLAYER_RADIUS,
                    &self.obstacles,
                    &self.bounds,
                );
            } else {
                (player.x, player.y) = self.bounds.clamp_circle(player.x, player.y, PLAYER_RADIUS);
            }
        }

        if let Some(human_id) = self.human {
            self.push_apart_from(human_id);
        }

        for (_, projectile) in self.projectiles.iter_mut() {
            projectile.advance(delta_ms);
        }
    }

    /// The human shoves overlapping players out of the way
    fn push_apart_from(&mut self, human_id: PlayerId) {
        let others: Vec<PlayerId> = self
            .players
            .iter()
            .filter(|(id, p)| *id != human_id && p.is_alive())
            .map(|(id, _)| id)
            .collect();

        for other_id in others {
            let (Some(human), Some(other)) =
                (self.players.get(human_id), self.players.get(other_id))
            else {
                continue;
            };
            if !human.is_alive() {
                return;
            }
            if !PhysicsSystem::check_body_collision(
                human.x, human.y, PLAYER_RADIUS, other.x, other.y, PLAYER_RADIUS,
            ) {
                continue;
            }

            let ((hx, hy), (ox, oy)) = PhysicsSystem::resolve_body_collision(
                human.x, human.y, PLAYER_RADIUS, other.x, other.y, PLAYER_RADIUS,
            );
            let (hx, hy) = self.bounds.clamp_circle(hx, hy, PLAYER_RADIUS);
            let (ox, oy) = self.bounds.clamp_circle(ox, oy, PLAYER_RADIUS);

            if let Some(human) = self.players.get_mut(human_id) {
                (human.x, human.y) = (hx, hy);
            }
            if let Some(other) = self.players.get_mut(other_id) {
                (other.x, other.y) = (ox, oy);
            }
        }
    }

    fn resolve_collisions(&mut self, now: f64) {
        let contacts = CollisionSystem::resolve(
            &self.players,
            &self.projectiles,
            &self.obstacles,
            &self.pickups,
            &self.bounds,
            now,
        );

        for contact in contacts {
            match contact {
                CollisionEvent::Hit {
                    player,
                    projectile,
                    damage,
                } => {
                    let Some(shot) = self.projectiles.remove(projectile) else {
                        continue;
                    };
                    self.apply_hit(player, shot.owner_id, damage);
                }
                CollisionEvent::Expired { projectile } | CollisionEvent::Blocked { projectile } => {
                    self.projectiles.remove(projectile);
                }
                CollisionEvent::Pickup { player, pickup } => {
                    self.collect_pickup(player, pickup);
                }
            }
        }
    }

    fn apply_hit(&mut self, target_id: PlayerId, shooter_id: PlayerId, damage: f32) {
        let Some(target) = self.players.get_mut(target_id) else {
            return;
        };
        let before = target.health;
        if !target.take_damage(damage) {
            return;
        }
        let dealt = before - target.health;
        let killed = !target.is_alive();
        let health = target.health;

        self.events.push(MatchEvent::PlayerDamaged {
            player: target_id,
            health,
        });

        if let Some(shooter) = self.players.get_mut(shooter_id) {
            shooter.stats.shots_hit += 1;
            shooter.stats.damage_dealt += dealt;
            if killed {
                shooter.stats.kills += 1;
            }
        }
        if killed {
            self.killers.insert(target_id, shooter_id);
        }
    }

    fn update_zone(&mut self, now: f64, delta_ms: f64) {
        let transition = self.zone.advance(now, delta_ms);
        if let ZoneTransition::ShrinkStarted { target_radius } = transition {
            self.events.push(MatchEvent::ZoneWarning { target_radius });
        }

        let damage = self.zone.config().damage_per_tick;
        for (id, player) in self.players.iter_mut() {
            if !player.is_alive() || self.zone.is_inside(player.x, player.y) {
                continue;
            }
            player.take_damage(damage);
            if player.is_human {
                self.events.push(MatchEvent::PlayerDamaged {
                    player: id,
                    health: player.health,
                });
            }
        }

        let human_in_zone = self
            .human
            .and_then(|id| self.players.get(id))
            .map(|p| self.zone.is_inside(p.x, p.y))
            .unwrap_or(false);

        if self.zone.is_shrinking
            || transition != ZoneTransition::Idle
            || human_in_zone != self.human_in_zone
        {
            self.events.push(MatchEvent::ZoneUpdate {
                current_radius: self.zone.current_radius,
                target_radius: self.zone.target_radius,
                shrink_elapsed: self.zone.shrink_elapsed_ms(),
                player_in_zone: human_in_zone,
            });
        }
        self.human_in_zone = human_in_zone;
    }

    /// Remove every player at zero health, exactly once
    fn remove_dead(&mut self) {
        let dead: Vec<PlayerId> = self
            .players
            .iter()
            .filter(|(_, p)| !p.is_alive())
            .map(|(id, _)| id)
            .collect();
        if dead.is_empty() {
            return;
        }

        let placement = self.players.len() - dead.len() + 1;
        for id in dead {
            let Some(player) = self.players.remove(id) else {
                continue;
            };
            let killer = self.killers.remove(&id);
            let cause = if killer.is_some() {
                DeathCause::Shot
            } else {
                DeathCause::Zone
            };

            debug!(match_id = %self.id, player = %player.name, ?cause, "Player eliminated");
            self.events.push(MatchEvent::PlayerDied {
                player: id,
                name: player.name.clone(),
                killer,
                cause,
            });
            self.fallen.push(Self::result_for(player, placement));
        }

        self.events.push(MatchEvent::PlayerCountUpdated {
            count: self.players.len(),
        });
    }

    fn check_win_condition(&mut self) {
        if self.phase != MatchPhase::Running {
            return;
        }

        if self.players.len() <= 1 {
            let winner = self.players.handles().first().copied();
            self.finish(winner, EndReason::LastStanding);
            return;
        }

        if let Some(human) = self.human {
            if !self.players.contains(human) {
                self.finish(None, EndReason::HumanEliminated);
            }
        }
    }

    /// Running/Waiting -> Ended, exactly once
    fn finish(&mut self, winner: Option<PlayerId>, reason: EndReason) {
        self.phase = MatchPhase::Ended;
        self.pending.clear();

        let winner_player = winner.and_then(|id| self.players.get(id));
        self.outcome = Some(MatchOutcome {
            winner,
            winner_name: winner_player.map(|p| p.name.clone()),
            winner_account: winner_player.and_then(|p| p.account_id),
            elapsed_ms: self.elapsed_ms,
            reason,
        });

        if reason != EndReason::Aborted && self.human.is_some() {
            self.events.push(MatchEvent::GameOver {
                is_winner: winner.is_some() && winner == self.human,
            });
        }
        self.events.push(MatchEvent::MatchResult {
            winner_id: winner,
            elapsed_ms: self.elapsed_ms,
            reason,
        });

        debug!(
            match_id = %self.id,
            ?reason,
            winner = ?winner,
            elapsed_ms = self.elapsed_ms,
            "Match ended"
        );
    }

    fn result_for(player: Player, placement: usize) -> PlayerResult {
        PlayerResult {
            name: player.name,
            is_human: player.is_human,
            account_id: player.account_id,
            placement,
            stats: player.stats,
        }
    }

    /// Per-player results. Survivors share first place.
    pub fn report(&self) -> MatchReport {
        let mut players: Vec<PlayerResult> = self
            .players
            .values()
            .map(|p| Self::result_for(p.clone(), 1))
            .collect();
        players.extend(self.fallen.iter().rev().cloned());

        MatchReport {
            match_id: self.id,
            duration_ms: self.elapsed_ms,
            reason: self
                .outcome
                .as_ref()
                .map(|o| o.reason)
                .unwrap_or(EndReason::Aborted),
            winner_name: self.outcome.as_ref().and_then(|o| o.winner_name.clone()),
            players,
        }
    }

    #[cfg(test)]
    fn player_mut(&mut self, id: PlayerId) -> &mut Player {
        self.players.get_mut(id).expect("player exists")
    }
}
