//! Bot decision making
//!
//! `decide` is a pure function of the world view it is handed plus the random
//! source; the match loop applies the returned intent.

use rand::Rng;
use std::f32::consts::TAU;

use super::arena::Arena;
use super::math::{angle_between, distance};
use super::player::Player;
use super::world::{PickupId, WeaponPickup};
use super::zone::SafeZone;

/// Chance per decision that an idle bot looks for a fight
pub const ENGAGE_CHANCE: f64 = 0.3;
/// Chance that an engaging bot also shoots
pub const FIRE_CHANCE: f64 = 0.3;
/// Bots only chase targets closer than this
pub const ENGAGE_RANGE: f32 = 300.0;
/// Bots grab pickups closer than this
pub const PICKUP_REACH: f32 = 50.0;

/// What a bot wants to do this tick
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AiIntent {
    pub move_angle: Option<f32>,
    pub fire_angle: Option<f32>,
    pub pickup_id: Option<PickupId>,
}

impl AiIntent {
    pub fn is_idle(&self) -> bool {
        self.move_angle.is_none() && self.fire_angle.is_none() && self.pickup_id.is_none()
    }
}

pub fn decide<R: Rng + ?Sized>(
    player: &Player,
    players: &Arena<Player>,
    zone: &SafeZone,
    pickups: &Arena<WeaponPickup>,
    rng: &mut R,
) -> AiIntent {
    let mut intent = AiIntent::default();
    if !player.is_alive() {
        return intent;
    }

    if !zone.is_inside(player.x, player.y) {
        intent.move_angle = Some(angle_between(
            player.x,
            player.y,
            zone.center_x,
            zone.center_y,
        ));
    } else if rng.gen_bool(ENGAGE_CHANCE) {
        match nearest_opponent(player, players) {
            Some((target, dist)) if dist < ENGAGE_RANGE => {
                let angle = angle_between(player.x, player.y, target.x, target.y);
                intent.move_angle = Some(angle);
                if rng.gen_bool(FIRE_CHANCE) {
                    intent.fire_angle = Some(angle);
                }
            }
            _ => intent.move_angle = Some(rng.gen_range(0.0..TAU)),
        }
    }

    intent.pickup_id = nearest_pickup(player, pickups);
    intent
}

/// Closest other living player and its distance
fn nearest_opponent<'a>(player: &Player, players: &'a Arena<Player>) -> Option<(&'a Player, f32)> {
    players
        .values()
        .filter(|other| other.id != player.id && other.is_alive())
        .map(|other| (other, distance(player.x, player.y, other.x, other.y)))
        .min_by(|a, b| a.1.total_cmp(&b.1))
}

fn nearest_pickup(player: &Player, pickups: &Arena<WeaponPickup>) -> Option<PickupId> {
    pickups
        .values()
        .map(|pickup| (pickup.id, distance(player.x, player.y, pickup.x, pickup.y)))
        .filter(|(_, dist)| *dist < PICKUP_REACH)
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(id, _)| id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::combat::WeaponClass;
    use crate::game::player::PlayerId;
    use crate::game::zone::ZoneConfig;
    use rand::rngs::mock::StepRng;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    /// StepRng yielding 0 makes every `gen_bool` succeed and ranges return their low end.
    fn always() -> StepRng {
        StepRng::new(0, 0)
    }

    /// StepRng yielding u64::MAX makes every `gen_bool` fail.
    fn never() -> StepRng {
        StepRng::new(u64::MAX, 0)
    }

    fn world() -> (Arena<Player>, SafeZone, Arena<WeaponPickup>) {
        let zone = SafeZone::new(1000.0, 1000.0, 500.0, ZoneConfig::default());
        (Arena::new(), zone, Arena::new())
    }

    fn add(players: &mut Arena<Player>, x: f32, y: f32) -> PlayerId {
        players.insert_with(|id| Player::new(id, "Bot".into(), false, x, y))
    }

    #[test]
    fn outside_zone_runs_to_center_without_firing() {
        let (mut players, zone, pickups) = world();
        let bot = add(&mut players, 1000.0, 1600.0);
        add(&mut players, 1000.0, 1650.0);

        let intent = decide(players.get(bot).unwrap(), &players, &zone, &pickups, &mut always());

        let angle = intent.move_angle.unwrap();
        assert!((angle - angle_between(1000.0, 1600.0, 1000.0, 1000.0)).abs() < 1e-6);
        assert_eq!(intent.fire_angle, None);
    }

    #[test]
    fn engages_nearest_player_in_range() {
        let (mut players, zone, pickups) = world();
        let bot = add(&mut players, 1000.0, 1000.0);
        add(&mut players, 1200.0, 1000.0);
        add(&mut players, 1000.0, 1100.0);

        let intent = decide(players.get(bot).unwrap(), &players, &zone, &pickups, &mut always());

        let toward_nearest = angle_between(1000.0, 1000.0, 1000.0, 1100.0);
        assert_eq!(intent.move_angle, Some(toward_nearest));
        assert_eq!(intent.fire_angle, Some(toward_nearest));
    }

    #[test]
    fn ignores_dead_players() {
        let (mut players, zone, pickups) = world();
        let bot = add(&mut players, 1000.0, 1000.0);
        let corpse = add(&mut players, 1000.0, 1050.0);
        players.get_mut(corpse).unwrap().health = 0.0;

        let intent = decide(players.get(bot).unwrap(), &players, &zone, &pickups, &mut always());

        // no living target in range: random heading, which StepRng pins to 0
        assert_eq!(intent.move_angle, Some(0.0));
        assert_eq!(intent.fire_angle, None);
    }

    #[test]
    fn wanders_when_nobody_is_close() {
        let (mut players, zone, pickups) = world();
        let bot = add(&mut players, 1000.0, 1000.0);
        add(&mut players, 1000.0, 1400.0);

        let mut rng = ChaCha8Rng::seed_from_u64(5);
        for _ in 0..100 {
            let intent = decide(players.get(bot).unwrap(), &players, &zone, &pickups, &mut rng);
            assert_eq!(intent.fire_angle, None);
            if let Some(angle) = intent.move_angle {
                assert!((0.0..TAU).contains(&angle));
            }
        }
    }

    #[test]
    fn idles_when_draw_fails() {
        let (mut players, zone, pickups) = world();
        let bot = add(&mut players, 1000.0, 1000.0);
        add(&mut players, 1000.0, 1050.0);

        let intent = decide(players.get(bot).unwrap(), &players, &zone, &pickups, &mut never());
        assert!(intent.is_idle());
    }

    #[test]
    fn grabs_nearby_pickup_regardless_of_branch() {
        let (mut players, zone, mut pickups) = world();
        let bot = add(&mut players, 1000.0, 1700.0);
        let near = pickups.insert_with(|id| WeaponPickup {
            id,
            weapon: WeaponClass::Rifle,
            x: 1000.0,
            y: 1740.0,
        });
        pickups.insert_with(|id| WeaponPickup {
            id,
            weapon: WeaponClass::Shotgun,
            x: 1000.0,
            y: 1760.0,
        });

        let intent = decide(players.get(bot).unwrap(), &players, &zone, &pickups, &mut never());
        assert_eq!(intent.pickup_id, Some(near));
        assert!(intent.move_angle.is_some());
    }
}
