//! Static arena layout: bounds, obstacles and weapon pickups

use rand::Rng;
use serde::Serialize;

use super::arena::Handle;
use super::combat::WeaponClass;

/// Pickup body radius
pub const PICKUP_RADIUS: f32 = 12.0;

/// Keep-out margin for scattered placement
pub const PLACEMENT_MARGIN: f32 = 100.0;

pub type PickupId = Handle<WeaponPickup>;

/// Rectangular arena bounds starting at the origin
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ArenaBounds {
    pub width: f32,
    pub height: f32,
}

impl ArenaBounds {
    pub fn square(size: f32) -> Self {
        Self {
            width: size,
            height: size,
        }
    }

    pub fn center(&self) -> (f32, f32) {
        (self.width / 2.0, self.height / 2.0)
    }

    pub fn contains(&self, x: f32, y: f32) -> bool {
        (0.0..=self.width).contains(&x) && (0.0..=self.height).contains(&y)
    }

    /// Clamp a circle of `radius` so it stays fully inside
    pub fn clamp_circle(&self, x: f32, y: f32, radius: f32) -> (f32, f32) {
        (
            x.clamp(radius, (self.width - radius).max(radius)),
            y.clamp(radius, (self.height - radius).max(radius)),
        )
    }

    /// Uniform random point at least `PLACEMENT_MARGIN` from every edge
    pub fn random_point<R: Rng + ?Sized>(&self, rng: &mut R) -> (f32, f32) {
        let max_x = (self.width - PLACEMENT_MARGIN).max(PLACEMENT_MARGIN + 1.0);
        let max_y = (self.height - PLACEMENT_MARGIN).max(PLACEMENT_MARGIN + 1.0);
        (
            rng.gen_range(PLACEMENT_MARGIN..max_x),
            rng.gen_range(PLACEMENT_MARGIN..max_y),
        )
    }
}

/// Axis-aligned square obstacle, centered on (x, y)
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Obstacle {
    pub x: f32,
    pub y: f32,
    pub size: f32,
}

impl Obstacle {
    pub fn half_extent(&self) -> f32 {
        self.size / 2.0
    }

    /// Closest point of the obstacle to (px, py)
    pub fn closest_point(&self, px: f32, py: f32) -> (f32, f32) {
        let h = self.half_extent();
        (
            px.clamp(self.x - h, self.x + h),
            py.clamp(self.y - h, self.y + h),
        )
    }

    /// Circle vs rectangle overlap
    pub fn overlaps_circle(&self, cx: f32, cy: f32, radius: f32) -> bool {
        let (qx, qy) = self.closest_point(cx, cy);
        let dx = cx - qx;
        let dy = cy - qy;
        dx * dx + dy * dy <= radius * radius
    }
}

/// Weapon lying on the ground
#[derive(Debug, Clone, Serialize)]
pub struct WeaponPickup {
    pub id: PickupId,
    pub weapon: WeaponClass,
    pub x: f32,
    pub y: f32,
}

/// Scatter `count` obstacles with sides in 50..=150
pub fn scatter_obstacles<R: Rng + ?Sized>(
    bounds: &ArenaBounds,
    count: usize,
    rng: &mut R,
) -> Vec<Obstacle> {
    (0..count)
        .map(|_| {
            let (x, y) = bounds.random_point(rng);
            Obstacle {
                x,
                y,
                size: rng.gen_range(50.0..=150.0),
            }
        })
        .collect()
}

/// Random weapon class and position for one pickup
pub fn random_pickup<R: Rng + ?Sized>(bounds: &ArenaBounds, rng: &mut R) -> (WeaponClass, f32, f32) {
    let (x, y) = bounds.random_point(rng);
    let weapon = WeaponClass::ALL[rng.gen_range(0..WeaponClass::ALL.len())];
    (weapon, x, y)
}
