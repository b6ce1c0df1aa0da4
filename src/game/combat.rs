//! Combat system - weapons, projectiles, damage

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::arena::Handle;
use super::math::clamp;
use super::player::{Player, PlayerId};

/// Maximum (and starting) player health
pub const MAX_HEALTH: f32 = 100.0;

/// Projectile hitbox radius
pub const PROJECTILE_RADIUS: f32 = 4.0;

/// Distance in front of the shooter at which projectiles spawn
pub const MUZZLE_OFFSET: f32 = 30.0;

pub type ProjectileId = Handle<Projectile>;

/// Weapon classes available in the arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeaponClass {
    /// Starting weapon
    Pistol,
    /// Fast fire rate, long range
    Rifle,
    /// Five pellet spread, short range
    Shotgun,
}

impl WeaponClass {
    pub const ALL: [WeaponClass; 3] = [WeaponClass::Pistol, WeaponClass::Rifle, WeaponClass::Shotgun];

    pub fn as_str(&self) -> &'static str {
        match self {
            WeaponClass::Pistol => "pistol",
            WeaponClass::Rifle => "rifle",
            WeaponClass::Shotgun => "shotgun",
        }
    }
}

impl Default for WeaponClass {
    fn default() -> Self {
        Self::Pistol
    }
}

/// Static weapon configuration
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeaponStats {
    /// Damage per projectile
    pub damage: f32,
    /// Minimum time between shots (milliseconds)
    pub cooldown_ms: f64,
    /// Projectile speed (units per second)
    pub projectile_speed: f32,
    /// Projectile lifespan (milliseconds)
    pub projectile_lifespan_ms: f64,
    /// Projectiles per shot
    pub projectile_count: u32,
    /// Maximum angular deviation per projectile (radians)
    pub spread: f32,
}

impl WeaponStats {
    pub fn for_class(class: WeaponClass) -> Self {
        match class {
            WeaponClass::Pistol => Self {
                damage: 10.0,
                cooldown_ms: 400.0,
                projectile_speed: 500.0,
                projectile_lifespan_ms: 1000.0,
                projectile_count: 1,
                spread: 0.0,
            },
            WeaponClass::Rifle => Self {
                damage: 15.0,
                cooldown_ms: 200.0,
                projectile_speed: 700.0,
                projectile_lifespan_ms: 1500.0,
                projectile_count: 1,
                spread: 0.0,
            },
            WeaponClass::Shotgun => Self {
                damage: 8.0,
                cooldown_ms: 800.0,
                projectile_speed: 600.0,
                projectile_lifespan_ms: 800.0,
                projectile_count: 5,
                spread: 0.3,
            },
        }
    }
}

/// Active projectile in the arena
#[derive(Debug, Clone)]
pub struct Projectile {
    pub id: ProjectileId,
    pub owner_id: PlayerId,
    pub x: f32,
    pub y: f32,
    pub vel_x: f32,
    pub vel_y: f32,
    pub angle: f32,
    pub speed: f32,
    pub damage: f32,
    pub radius: f32,
    /// Match time the projectile was fired (milliseconds)
    pub spawned_at: f64,
    pub lifespan_ms: f64,
}

impl Projectile {
    /// Age in milliseconds at match time `now`
    pub fn age(&self, now: f64) -> f64 {
        now - self.spawned_at
    }

    pub fn is_expired(&self, now: f64) -> bool {
        self.age(now) >= self.lifespan_ms
    }

    /// Advance position by `delta_ms`
    pub fn advance(&mut self, delta_ms: f64) {
        let dt = (delta_ms / 1000.0) as f32;
        self.x += self.vel_x * dt;
        self.y += self.vel_y * dt;
    }

    /// Check collision with a circular target
    pub fn check_hit(&self, target_x: f32, target_y: f32, target_radius: f32) -> bool {
        let dx = self.x - target_x;
        let dy = self.y - target_y;
        let combined_radius = self.radius + target_radius;
        dx * dx + dy * dy <= combined_radius * combined_radius
    }
}

/// Everything needed to spawn one projectile; the match inserts it into its arena.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectileSpec {
    pub owner_id: PlayerId,
    pub x: f32,
    pub y: f32,
    pub angle: f32,
    pub speed: f32,
    pub damage: f32,
    pub spawned_at: f64,
    pub lifespan_ms: f64,
}

impl ProjectileSpec {
    pub fn into_projectile(self, id: ProjectileId) -> Projectile {
        Projectile {
            id,
            owner_id: self.owner_id,
            x: self.x,
            y: self.y,
            vel_x: self.angle.cos() * self.speed,
            vel_y: self.angle.sin() * self.speed,
            angle: self.angle,
            speed: self.speed,
            damage: self.damage,
            radius: PROJECTILE_RADIUS,
            spawned_at: self.spawned_at,
            lifespan_ms: self.lifespan_ms,
        }
    }
}

/// Combat rules shared by human and AI players
pub struct CombatSystem;

impl CombatSystem {
    /// Check if a weapon is off cooldown at match time `now`
    pub fn can_fire(last_fired_at: Option<f64>, now: f64, stats: &WeaponStats) -> bool {
        match last_fired_at {
            Some(last) => now - last >= stats.cooldown_ms,
            None => true,
        }
    }

    /// Fire the shooter's weapon at `angle`.
    ///
    /// Returns the projectiles to spawn, or an empty list when the shooter is
    /// dead or still on cooldown. Shotgun pellets deviate uniformly within
    /// `±spread` of the aim angle.
    pub fn fire<R: Rng + ?Sized>(
        shooter: &mut Player,
        angle: f32,
        now: f64,
        rng: &mut R,
    ) -> Vec<ProjectileSpec> {
        if !shooter.is_alive() || !angle.is_finite() {
            return Vec::new();
        }

        let stats = WeaponStats::for_class(shooter.weapon);
        if !Self::can_fire(shooter.last_fired_at, now, &stats) {
            return Vec::new();
        }

        shooter.last_fired_at = Some(now);
        shooter.rotation = angle;
        shooter.stats.shots_fired += 1;

        (0..stats.projectile_count)
            .map(|_| {
                let angle = if stats.spread > 0.0 {
                    angle + rng.gen_range(-stats.spread..=stats.spread)
                } else {
                    angle
                };
                ProjectileSpec {
                    owner_id: shooter.id,
                    x: shooter.x + angle.cos() * MUZZLE_OFFSET,
                    y: shooter.y + angle.sin() * MUZZLE_OFFSET,
                    angle,
                    speed: stats.projectile_speed,
                    damage: stats.damage,
                    spawned_at: now,
                    lifespan_ms: stats.projectile_lifespan_ms,
                }
            })
            .collect()
    }

    /// Apply damage to health, returns (new_health, is_dead)
    pub fn apply_damage(current_health: f32, damage: f32) -> (f32, bool) {
        let new_health = clamp(current_health - damage, 0.0, MAX_HEALTH);
        (new_health, new_health <= 0.0)
    }
}
