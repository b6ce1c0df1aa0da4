//! Shrinking safe zone

use serde::Serialize;

use super::math::{distance, lerp};

/// Zone tuning
#[derive(Debug, Clone, PartialEq)]
pub struct ZoneConfig {
    /// Smallest radius the zone ever shrinks to
    pub final_radius: f32,
    /// Shrink speed (units per millisecond)
    pub shrink_speed: f64,
    /// Pause between shrink phases (milliseconds)
    pub shrink_delay_ms: f64,
    /// Radius multiplier applied by each phase
    pub shrink_factor: f32,
    /// Damage applied every tick to players outside the zone
    pub damage_per_tick: f32,
}

impl Default for ZoneConfig {
    fn default() -> Self {
        Self {
            final_radius: 100.0,
            shrink_speed: 0.1,
            shrink_delay_ms: 10_000.0,
            shrink_factor: 0.7,
            damage_per_tick: 0.1,
        }
    }
}

/// What changed during one `advance` call
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ZoneTransition {
    Idle,
    /// A shrink phase just began
    ShrinkStarted { target_radius: f32 },
    /// The running phase reached its target radius
    ShrinkFinished { radius: f32 },
}

/// Zone state exposed to presentation
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ZoneStatus {
    pub center_x: f32,
    pub center_y: f32,
    pub current_radius: f32,
    pub target_radius: f32,
    pub shrink_elapsed: f64,
    pub is_shrinking: bool,
}

/// Circular safe zone centered on the arena
#[derive(Debug, Clone)]
pub struct SafeZone {
    pub center_x: f32,
    pub center_y: f32,
    pub initial_radius: f32,
    pub current_radius: f32,
    pub target_radius: f32,
    pub is_shrinking: bool,
    config: ZoneConfig,
    shrink_start_radius: f32,
    shrink_elapsed_ms: f64,
    next_shrink_time: f64,
}

impl SafeZone {
    pub fn new(center_x: f32, center_y: f32, initial_radius: f32, config: ZoneConfig) -> Self {
        let initial_radius = initial_radius.max(config.final_radius);
        Self {
            center_x,
            center_y,
            initial_radius,
            current_radius: initial_radius,
            target_radius: initial_radius,
            is_shrinking: false,
            config,
            shrink_start_radius: initial_radius,
            shrink_elapsed_ms: 0.0,
            next_shrink_time: f64::INFINITY,
        }
    }

    pub fn config(&self) -> &ZoneConfig {
        &self.config
    }

    /// Arm the first shrink phase `shrink_delay_ms` after `now`
    pub fn schedule_first_shrink(&mut self, now: f64) {
        self.next_shrink_time = now + self.config.shrink_delay_ms;
    }

    pub fn next_shrink_time(&self) -> f64 {
        self.next_shrink_time
    }

    pub fn shrink_elapsed_ms(&self) -> f64 {
        self.shrink_elapsed_ms
    }

    /// Advance the zone state machine to match time `current_time`
    pub fn advance(&mut self, current_time: f64, delta_ms: f64) -> ZoneTransition {
        let mut transition = ZoneTransition::Idle;

        if !self.is_shrinking && current_time >= self.next_shrink_time {
            self.target_radius =
                (self.current_radius * self.config.shrink_factor).max(self.config.final_radius);
            self.shrink_start_radius = self.current_radius;
            self.shrink_elapsed_ms = 0.0;
            self.is_shrinking = true;
            transition = ZoneTransition::ShrinkStarted {
                target_radius: self.target_radius,
            };
        } else if self.is_shrinking {
            self.shrink_elapsed_ms += delta_ms.max(0.0);
        }

        if self.is_shrinking {
            let span = (self.shrink_start_radius - self.target_radius).max(0.0) as f64;
            let duration = if self.config.shrink_speed > 0.0 {
                span / self.config.shrink_speed
            } else {
                0.0
            };
            let progress = if duration <= 0.0 {
                1.0
            } else {
                (self.shrink_elapsed_ms / duration).min(1.0)
            };

            if progress >= 1.0 {
                self.current_radius = self.target_radius;
                self.is_shrinking = false;
                self.next_shrink_time = current_time + self.config.shrink_delay_ms;
                if transition == ZoneTransition::Idle {
                    transition = ZoneTransition::ShrinkFinished {
                        radius: self.current_radius,
                    };
                }
            } else {
                self.current_radius =
                    lerp(self.shrink_start_radius, self.target_radius, progress as f32)
                        .max(self.target_radius);
            }
        }

        transition
    }

    pub fn is_inside(&self, x: f32, y: f32) -> bool {
        distance(x, y, self.center_x, self.center_y) <= self.current_radius
    }

    pub fn status(&self) -> ZoneStatus {
        ZoneStatus {
            center_x: self.center_x,
            center_y: self.center_y,
            current_radius: self.current_radius,
            target_radius: self.target_radius,
            shrink_elapsed: self.shrink_elapsed_ms,
            is_shrinking: self.is_shrinking,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn zone() -> SafeZone {
        let mut zone = SafeZone::new(1000.0, 1000.0, 1000.0, ZoneConfig::default());
        zone.schedule_first_shrink(0.0);
        zone
    }

    #[test]
    fn idle_until_first_delay() {
        let mut zone = zone();
        let mut t = 0.0;
        while t < 10_000.0 {
            assert_eq!(zone.advance(t, 100.0), ZoneTransition::Idle);
            t += 100.0;
        }
        assert_eq!(zone.current_radius, 1000.0);
        assert!(!zone.is_shrinking);
    }

    #[test]
    fn first_phase_reaches_700_at_13_seconds() {
        let mut zone = zone();
        let mut t = 0.0;
        let mut started_at = None;
        let mut finished_at = None;

        while t <= 14_000.0 {
            match zone.advance(t, 100.0) {
                ZoneTransition::ShrinkStarted { target_radius } => {
                    assert!((target_radius - 700.0).abs() < 1e-3);
                    started_at = Some(t);
                }
                ZoneTransition::ShrinkFinished { .. } => finished_at = Some(t),
                ZoneTransition::Idle => {}
            }
            if t == 11_500.0 {
                assert!((zone.current_radius - 850.0).abs() < 1e-3);
            }
            if t == 12_900.0 {
                assert!(zone.current_radius > zone.target_radius);
            }
            t += 100.0;
        }

        assert_eq!(started_at, Some(10_000.0));
        assert_eq!(finished_at, Some(13_000.0));
        assert_eq!(zone.current_radius, zone.target_radius);
        assert_eq!(zone.next_shrink_time(), 23_000.0);
    }

    #[test]
    fn zero_length_phase_finishes_immediately() {
        let mut zone = SafeZone::new(0.0, 0.0, 100.0, ZoneConfig::default());
        zone.schedule_first_shrink(0.0);

        assert_eq!(
            zone.advance(10_000.0, 16.0),
            ZoneTransition::ShrinkStarted {
                target_radius: 100.0
            }
        );
        assert!(!zone.is_shrinking);
        assert_eq!(zone.current_radius, 100.0);
        assert_eq!(zone.next_shrink_time(), 20_000.0);
    }

    #[test]
    fn inside_check_includes_edge() {
        let zone = zone();
        assert!(zone.is_inside(1000.0, 1000.0));
        assert!(zone.is_inside(2000.0, 1000.0));
        assert!(!zone.is_inside(2000.1, 1000.0));
    }

    #[test]
    fn unscheduled_zone_never_shrinks() {
        let mut zone = SafeZone::new(0.0, 0.0, 500.0, ZoneConfig::default());
        assert_eq!(zone.advance(1.0e9, 16.0), ZoneTransition::Idle);
        assert_eq!(zone.current_radius, 500.0);
    }

    proptest! {
        #[test]
        fn radius_is_monotonic_and_bounded(deltas in proptest::collection::vec(1.0f64..2_000.0, 1..400)) {
            let mut zone = zone();
            let mut t = 0.0;
            let mut last = zone.current_radius;

            for delta in deltas {
                t += delta;
                zone.advance(t, delta);

                prop_assert!(zone.current_radius <= last);
                prop_assert!(zone.current_radius >= zone.target_radius);
                prop_assert!(zone.target_radius >= zone.config().final_radius);
                if !zone.is_shrinking {
                    prop_assert_eq!(zone.current_radius, zone.target_radius);
                }
                last = zone.current_radius;
            }
        }
    }
}
