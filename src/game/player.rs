//! Player entity

use serde::Serialize;
use uuid::Uuid;

use super::arena::Handle;
use super::combat::{CombatSystem, WeaponClass, MAX_HEALTH};
use super::math::normalize_move;

/// Movement speed (units per second)
pub const PLAYER_SPEED: f32 = 200.0;

/// Player body radius
pub const PLAYER_RADIUS: f32 = 16.0;

pub type PlayerId = Handle<Player>;

/// Per-player match statistics
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerStats {
    pub kills: u32,
    pub damage_dealt: f32,
    pub damage_taken: f32,
    pub shots_fired: u32,
    pub shots_hit: u32,
}

/// Player state in a match
#[derive(Debug, Clone)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub is_human: bool,
    /// Session player id when the player belongs to a backend session
    pub account_id: Option<Uuid>,

    // Position and movement
    pub x: f32,
    pub y: f32,
    pub rotation: f32,
    pub vel_x: f32,
    pub vel_y: f32,

    // Combat
    pub health: f32,
    pub weapon: WeaponClass,
    /// Match time of the last accepted shot (milliseconds)
    pub last_fired_at: Option<f64>,

    pub stats: PlayerStats,
}

impl Player {
    pub fn new(id: PlayerId, name: String, is_human: bool, x: f32, y: f32) -> Self {
        Self {
            id,
            name,
            is_human,
            account_id: None,
            x,
            y,
            rotation: 0.0,
            vel_x: 0.0,
            vel_y: 0.0,
            health: MAX_HEALTH,
            weapon: WeaponClass::default(),
            last_fired_at: None,
            stats: PlayerStats::default(),
        }
    }

    pub fn is_alive(&self) -> bool {
        self.health > 0.0
    }

    /// Set velocity from an input vector (magnitude clamped to 1)
    pub fn set_move(&mut self, dx: f32, dy: f32) {
        if !self.is_alive() {
            return;
        }
        let (dx, dy) = normalize_move(dx, dy);
        self.vel_x = dx * PLAYER_SPEED;
        self.vel_y = dy * PLAYER_SPEED;
    }

    /// Move at full speed toward `angle`, facing it
    pub fn move_in_direction(&mut self, angle: f32) {
        if !self.is_alive() || !angle.is_finite() {
            return;
        }
        self.vel_x = angle.cos() * PLAYER_SPEED;
        self.vel_y = angle.sin() * PLAYER_SPEED;
        self.rotation = angle;
    }

    /// Turn toward `angle` without moving
    pub fn face(&mut self, angle: f32) {
        if self.is_alive() && angle.is_finite() {
            self.rotation = angle;
        }
    }

    /// Replace the current weapon (pickups never stack)
    pub fn equip_weapon(&mut self, weapon: WeaponClass) {
        self.weapon = weapon;
    }

    /// Apply damage. Returns false when the player was already dead.
    pub fn take_damage(&mut self, amount: f32) -> bool {
        if !self.is_alive() {
            return false;
        }
        let (health, _) = CombatSystem::apply_damage(self.health, amount);
        self.stats.damage_taken += self.health - health;
        self.health = health;
        true
    }

    /// Integrate velocity over `delta_ms`
    pub fn advance(&mut self, delta_ms: f64) {
        if !self.is_alive() {
            return;
        }
        let dt = (delta_ms / 1000.0) as f32;
        self.x += self.vel_x * dt;
        self.y += self.vel_y * dt;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::arena::Arena;
    use proptest::prelude::*;

    fn spawn(players: &mut Arena<Player>) -> PlayerId {
        players.insert_with(|id| Player::new(id, "P".into(), false, 100.0, 100.0))
    }

    #[test]
    fn dead_players_ignore_commands() {
        let mut players = Arena::new();
        let id = spawn(&mut players);
        let player = players.get_mut(id).unwrap();

        assert!(player.take_damage(150.0));
        assert_eq!(player.health, 0.0);
        assert!(!player.take_damage(10.0));

        player.set_move(1.0, 0.0);
        player.move_in_direction(0.0);
        player.advance(1000.0);
        assert_eq!((player.x, player.y), (100.0, 100.0));
    }

    #[test]
    fn movement_uses_units_per_second() {
        let mut players = Arena::new();
        let id = spawn(&mut players);
        let player = players.get_mut(id).unwrap();

        player.set_move(1.0, 0.0);
        player.advance(500.0);
        assert!((player.x - 200.0).abs() < 1e-3);

        player.set_move(3.0, 4.0);
        let speed = (player.vel_x.powi(2) + player.vel_y.powi(2)).sqrt();
        assert!((speed - PLAYER_SPEED).abs() < 1e-3);
    }

    #[test]
    fn damage_taken_counts_only_applied_health() {
        let mut players = Arena::new();
        let id = spawn(&mut players);
        let player = players.get_mut(id).unwrap();
        player.health = 25.0;
        player.take_damage(40.0);
        assert_eq!(player.stats.damage_taken, 25.0);
    }

    proptest! {
        #[test]
        fn health_stays_in_range(hits in proptest::collection::vec(-50.0f32..150.0, 0..40)) {
            let mut players = Arena::new();
            let id = spawn(&mut players);
            let player = players.get_mut(id).unwrap();
            for hit in hits {
                player.take_damage(hit);
                prop_assert!((0.0..=MAX_HEALTH).contains(&player.health));
            }
        }
    }
}
