//! Body-vs-body and body-vs-wall movement constraints

use super::world::{ArenaBounds, Obstacle};

/// Physics helpers for keeping player bodies out of walls and each other
pub struct PhysicsSystem;

impl PhysicsSystem {
    /// Check collision between two circular bodies
    pub fn check_body_collision(
        x1: f32, y1: f32, radius1: f32,
        x2: f32, y2: f32, radius2: f32,
    ) -> bool {
        let dx = x2 - x1;
        let dy = y2 - y1;
        let dist_sq = dx * dx + dy * dy;
        let combined_radius = radius1 + radius2;
        dist_sq <= combined_radius * combined_radius
    }

    /// Resolve collision between two bodies (pushes them apart)
    /// Returns ((new_x1, new_y1), (new_x2, new_y2))
    pub fn resolve_body_collision(
        x1: f32, y1: f32, radius1: f32,
        x2: f32, y2: f32, radius2: f32,
    ) -> ((f32, f32), (f32, f32)) {
        let dx = x2 - x1;
        let dy = y2 - y1;
        let dist = (dx * dx + dy * dy).sqrt();

        if dist < 0.001 {
            // Same position, push apart along x
            return ((x1 - radius1, y1), (x2 + radius2, y2));
        }

        let overlap = radius1 + radius2 - dist;
        if overlap <= 0.0 {
            return ((x1, y1), (x2, y2));
        }

        let nx = dx / dist;
        let ny = dy / dist;
        let push = overlap / 2.0 + 0.1;

        (
            (x1 - nx * push, y1 - ny * push),
            (x2 + nx * push, y2 + ny * push),
        )
    }

    /// Move a circular body out of an obstacle along the shortest axis.
    /// Returns the position unchanged when they do not overlap.
    pub fn push_out_of_obstacle(x: f32, y: f32, radius: f32, obstacle: &Obstacle) -> (f32, f32) {
        if !obstacle.overlaps_circle(x, y, radius) {
            return (x, y);
        }

        let (qx, qy) = obstacle.closest_point(x, y);
        let dx = x - qx;
        let dy = y - qy;
        let dist = (dx * dx + dy * dy).sqrt();

        if dist > 0.001 {
            // Center outside the rectangle: push along the contact normal
            let push = radius - dist;
            return (x + dx / dist * push, y + dy / dist * push);
        }

        // Center inside the rectangle: exit through the nearest face
        let h = obstacle.half_extent();
        let exits = [
            (obstacle.x - h - radius - x, 0.0),
            (obstacle.x + h + radius - x, 0.0),
            (0.0, obstacle.y - h - radius - y),
            (0.0, obstacle.y + h + radius - y),
        ];
        let (ex, ey) = exits
            .into_iter()
            .min_by(|a, b| (a.0.abs() + a.1.abs()).total_cmp(&(b.0.abs() + b.1.abs())))
            .unwrap_or((0.0, 0.0));
        (x + ex, y + ey)
    }

    /// Apply obstacle and bounds constraints to one body
    pub fn constrain_body(
        x: f32,
        y: f32,
        radius: f32,
        obstacles: &[Obstacle],
        bounds: &ArenaBounds,
    ) -> (f32, f32) {
        let (x, y) = obstacles
            .iter()
            .fold((x, y), |(x, y), obstacle| {
                Self::push_out_of_obstacle(x, y, radius, obstacle)
            });
        bounds.clamp_circle(x, y, radius)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overlapping_bodies_are_separated() {
        let ((x1, y1), (x2, y2)) =
            PhysicsSystem::resolve_body_collision(0.0, 0.0, 16.0, 20.0, 0.0, 16.0);
        assert_eq!((y1, y2), (0.0, 0.0));
        assert!(x2 - x1 >= 32.0);
        assert!(!PhysicsSystem::check_body_collision(x1, y1, 16.0, x2, y2, 16.0 - 0.05));
    }

    #[test]
    fn separated_bodies_are_untouched() {
        let result = PhysicsSystem::resolve_body_collision(0.0, 0.0, 16.0, 40.0, 0.0, 16.0);
        assert_eq!(result, ((0.0, 0.0), (40.0, 0.0)));
    }

    #[test]
    fn body_is_pushed_off_wall_face() {
        let wall = Obstacle {
            x: 100.0,
            y: 100.0,
            size: 50.0,
        };
        let (x, y) = PhysicsSystem::push_out_of_obstacle(135.0, 100.0, 16.0, &wall);
        assert!((x - 141.0).abs() < 1e-4);
        assert_eq!(y, 100.0);
    }

    #[test]
    fn embedded_body_exits_nearest_face() {
        let wall = Obstacle {
            x: 100.0,
            y: 100.0,
            size: 50.0,
        };
        let (x, y) = PhysicsSystem::push_out_of_obstacle(100.0, 120.0, 16.0, &wall);
        assert_eq!(x, 100.0);
        assert!((y - 141.0).abs() < 1e-4);
    }

    #[test]
    fn constrain_clamps_to_bounds() {
        let bounds = ArenaBounds::square(500.0);
        assert_eq!(
            PhysicsSystem::constrain_body(-10.0, 600.0, 16.0, &[], &bounds),
            (16.0, 484.0)
        );
    }
}
