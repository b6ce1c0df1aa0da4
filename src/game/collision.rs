//! Projectile and pickup collision detection
//!
//! The resolver only reads the world and reports what touched what; the match
//! applies the resulting events in order.

use super::arena::Arena;
use super::combat::{Projectile, ProjectileId};
use super::player::{Player, PlayerId, PLAYER_RADIUS};
use super::world::{ArenaBounds, Obstacle, PickupId, WeaponPickup, PICKUP_RADIUS};

/// Outcome of one collision check
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CollisionEvent {
    /// Projectile struck a player and is consumed
    Hit {
        player: PlayerId,
        projectile: ProjectileId,
        damage: f32,
    },
    /// Projectile outlived its lifespan or left the arena
    Expired { projectile: ProjectileId },
    /// Projectile ran into an obstacle
    Blocked { projectile: ProjectileId },
    /// Player walked over a weapon pickup
    Pickup { player: PlayerId, pickup: PickupId },
}

pub struct CollisionSystem;

impl CollisionSystem {
    /// Resolve all projectile and pickup contacts at match time `now`.
    ///
    /// Projectiles are visited in slot order and each yields at most one
    /// event. Lifetime and bounds are checked before any overlap test. A
    /// projectile never hits its owner, and when it overlaps several players
    /// the first living one in roster order takes the hit. Each pickup goes to
    /// the first living player in roster order that touches it.
    pub fn resolve(
        players: &Arena<Player>,
        projectiles: &Arena<Projectile>,
        obstacles: &[Obstacle],
        pickups: &Arena<WeaponPickup>,
        bounds: &ArenaBounds,
        now: f64,
    ) -> Vec<CollisionEvent> {
        let mut events = Vec::new();

        for (id, projectile) in projectiles.iter() {
            if projectile.is_expired(now) || !bounds.contains(projectile.x, projectile.y) {
                events.push(CollisionEvent::Expired { projectile: id });
                continue;
            }

            if obstacles
                .iter()
                .any(|o| o.overlaps_circle(projectile.x, projectile.y, projectile.radius))
            {
                events.push(CollisionEvent::Blocked { projectile: id });
                continue;
            }

            let target = players.values().find(|p| {
                p.is_alive()
                    && p.id != projectile.owner_id
                    && projectile.check_hit(p.x, p.y, PLAYER_RADIUS)
            });
            if let Some(target) = target {
                events.push(CollisionEvent::Hit {
                    player: target.id,
                    projectile: id,
                    damage: projectile.damage,
                });
            }
        }

        for (id, pickup) in pickups.iter() {
            let reach = PLAYER_RADIUS + PICKUP_RADIUS;
            let collector = players.values().find(|p| {
                let dx = p.x - pickup.x;
                let dy = p.y - pickup.y;
                p.is_alive() && dx * dx + dy * dy <= reach * reach
            });
            if let Some(collector) = collector {
                events.push(CollisionEvent::Pickup {
                    player: collector.id,
                    pickup: id,
                });
            }
        }

        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::combat::{ProjectileSpec, WeaponClass, WeaponStats};
    use proptest::prelude::*;

    struct World {
        players: Arena<Player>,
        projectiles: Arena<Projectile>,
        obstacles: Vec<Obstacle>,
        pickups: Arena<WeaponPickup>,
        bounds: ArenaBounds,
    }

    impl World {
        fn new() -> Self {
            Self {
                players: Arena::new(),
                projectiles: Arena::new(),
                obstacles: Vec::new(),
                pickups: Arena::new(),
                bounds: ArenaBounds::square(2000.0),
            }
        }

        fn player(&mut self, x: f32, y: f32) -> PlayerId {
            self.players
                .insert_with(|id| Player::new(id, "P".into(), false, x, y))
        }

        fn shot(&mut self, owner: PlayerId, x: f32, y: f32, spawned_at: f64) -> ProjectileId {
            let stats = WeaponStats::for_class(WeaponClass::Pistol);
            let spec = ProjectileSpec {
                owner_id: owner,
                x,
                y,
                angle: 0.0,
                speed: stats.projectile_speed,
                damage: stats.damage,
                spawned_at,
                lifespan_ms: stats.projectile_lifespan_ms,
            };
            self.projectiles.insert_with(|id| spec.into_projectile(id))
        }

        fn resolve(&self, now: f64) -> Vec<CollisionEvent> {
            CollisionSystem::resolve(
                &self.players,
                &self.projectiles,
                &self.obstacles,
                &self.pickups,
                &self.bounds,
                now,
            )
        }
    }

    #[test]
    fn owner_is_never_hit() {
        let mut world = World::new();
        let owner = world.player(500.0, 500.0);
        world.shot(owner, 500.0, 500.0, 0.0);
        assert!(world.resolve(10.0).is_empty());
    }

    #[test]
    fn expiry_wins_over_overlap() {
        let mut world = World::new();
        let owner = world.player(100.0, 100.0);
        let target = world.player(500.0, 500.0);
        let shot = world.shot(owner, 500.0, 500.0, 0.0);

        assert_eq!(
            world.resolve(1000.0),
            vec![CollisionEvent::Expired { projectile: shot }]
        );
        assert_eq!(
            world.resolve(999.0),
            vec![CollisionEvent::Hit {
                player: target,
                projectile: shot,
                damage: 10.0
            }]
        );
    }

    #[test]
    fn out_of_bounds_expires() {
        let mut world = World::new();
        let owner = world.player(100.0, 100.0);
        let shot = world.shot(owner, 2001.0, 500.0, 0.0);
        assert_eq!(
            world.resolve(0.0),
            vec![CollisionEvent::Expired { projectile: shot }]
        );
    }

    #[test]
    fn obstacles_block_without_damage() {
        let mut world = World::new();
        let owner = world.player(100.0, 100.0);
        world.player(500.0, 500.0);
        world.obstacles.push(Obstacle {
            x: 500.0,
            y: 500.0,
            size: 60.0,
        });
        let shot = world.shot(owner, 500.0, 500.0, 0.0);
        assert_eq!(
            world.resolve(0.0),
            vec![CollisionEvent::Blocked { projectile: shot }]
        );
    }

    #[test]
    fn one_hit_per_projectile_in_roster_order() {
        let mut world = World::new();
        let owner = world.player(100.0, 100.0);
        let first = world.player(500.0, 500.0);
        world.player(505.0, 500.0);
        let a = world.shot(owner, 502.0, 500.0, 0.0);
        let b = world.shot(owner, 503.0, 500.0, 0.0);

        let events = world.resolve(0.0);
        assert_eq!(
            events,
            vec![
                CollisionEvent::Hit {
                    player: first,
                    projectile: a,
                    damage: 10.0
                },
                CollisionEvent::Hit {
                    player: first,
                    projectile: b,
                    damage: 10.0
                },
            ]
        );
    }

    #[test]
    fn dead_players_are_transparent() {
        let mut world = World::new();
        let owner = world.player(100.0, 100.0);
        let corpse = world.player(500.0, 500.0);
        world.players.get_mut(corpse).unwrap().health = 0.0;
        world.shot(owner, 500.0, 500.0, 0.0);
        assert!(world.resolve(0.0).is_empty());
    }

    #[test]
    fn pickup_claimed_once() {
        let mut world = World::new();
        let first = world.player(500.0, 500.0);
        world.player(510.0, 500.0);
        let pickup = world.pickups.insert_with(|id| WeaponPickup {
            id,
            weapon: WeaponClass::Rifle,
            x: 505.0,
            y: 500.0,
        });
        assert_eq!(
            world.resolve(0.0),
            vec![CollisionEvent::Pickup {
                player: first,
                pickup
            }]
        );
    }

    proptest! {
        #[test]
        fn projectiles_never_hit_their_owner(
            positions in proptest::collection::vec((0.0f32..300.0, 0.0f32..300.0), 1..8),
            shots in proptest::collection::vec((0usize..8, 0.0f32..300.0, 0.0f32..300.0), 1..16),
        ) {
            let mut world = World::new();
            let ids: Vec<_> = positions.iter().map(|&(x, y)| world.player(x, y)).collect();
            for &(owner, x, y) in &shots {
                world.shot(ids[owner % ids.len()], x, y, 0.0);
            }

            let events = world.resolve(0.0);
            let mut consumed = std::collections::HashSet::new();
            for event in events {
                if let CollisionEvent::Hit { player, projectile, .. } = event {
                    let owner = world.projectiles.get(projectile).unwrap().owner_id;
                    prop_assert_ne!(owner, player);
                    prop_assert!(consumed.insert(projectile));
                }
            }
        }
    }
}
