//! Geometry helpers shared by the simulation modules

/// Euclidean distance between two points
pub fn distance(x1: f32, y1: f32, x2: f32, y2: f32) -> f32 {
    let dx = x2 - x1;
    let dy = y2 - y1;
    (dx * dx + dy * dy).sqrt()
}

/// Linear interpolation from `start` to `end` by `amount` (0..=1)
pub fn lerp(start: f32, end: f32, amount: f32) -> f32 {
    start + (end - start) * amount
}

/// Clamp `value` into `[min, max]`
pub fn clamp(value: f32, min: f32, max: f32) -> f32 {
    value.max(min).min(max)
}

/// Angle in radians of the vector pointing from (x1, y1) to (x2, y2)
pub fn angle_between(x1: f32, y1: f32, x2: f32, y2: f32) -> f32 {
    (y2 - y1).atan2(x2 - x1)
}

/// Clamp a movement vector to magnitude 1, keeping its direction.
pub fn normalize_move(dx: f32, dy: f32) -> (f32, f32) {
    if !dx.is_finite() || !dy.is_finite() {
        return (0.0, 0.0);
    }
    let len = (dx * dx + dy * dy).sqrt();
    if len > 1.0 {
        (dx / len, dy / len)
    } else {
        (dx, dy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::{FRAC_PI_2, PI};

    #[test]
    fn distance_is_euclidean() {
        assert_eq!(distance(0.0, 0.0, 3.0, 4.0), 5.0);
        assert_eq!(distance(1.0, 1.0, 4.0, 5.0), 5.0);
        assert_eq!(distance(2.0, 2.0, 2.0, 2.0), 0.0);
    }

    #[test]
    fn lerp_hits_endpoints() {
        assert_eq!(lerp(0.0, 10.0, 0.0), 0.0);
        assert_eq!(lerp(0.0, 10.0, 1.0), 10.0);
        assert_eq!(lerp(0.0, 10.0, 0.5), 5.0);
        assert_eq!(lerp(1000.0, 700.0, 1.0), 700.0);
    }

    #[test]
    fn clamp_limits_range() {
        assert_eq!(clamp(5.0, 0.0, 10.0), 5.0);
        assert_eq!(clamp(-5.0, 0.0, 10.0), 0.0);
        assert_eq!(clamp(15.0, 0.0, 10.0), 10.0);
    }

    #[test]
    fn angle_between_axes() {
        assert_eq!(angle_between(0.0, 0.0, 1.0, 0.0), 0.0);
        assert!((angle_between(0.0, 0.0, 0.0, 1.0) - FRAC_PI_2).abs() < 1e-6);
        assert!((angle_between(0.0, 0.0, -1.0, 0.0) - PI).abs() < 1e-6);
    }

    #[test]
    fn diagonal_move_is_normalized() {
        let (dx, dy) = normalize_move(1.0, 1.0);
        assert!(((dx * dx + dy * dy).sqrt() - 1.0).abs() < 1e-6);
        assert_eq!(normalize_move(0.5, 0.0), (0.5, 0.0));
        assert_eq!(normalize_move(f32::NAN, 1.0), (0.0, 0.0));
    }
}
