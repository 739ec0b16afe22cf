fn wrap(angle: f64, lower: f64, span: f64) -> f64 {
    if !angle.is_finite() {
        return 0.0;
    }
    let offset = (angle - lower).rem_euclid(span);
    // rem_euclid can round up to `span` for tiny negative inputs.
    let offset = if offset >= span { 0.0 } else { offset };
    offset + lower
}

/// Wraps to [0, 360). Non-finite input wraps to 0.
pub fn wrap_to_360(angle: f64) -> f64 {
    wrap(angle, 0.0, 360.0)
}

/// Wraps to [-180, 180). Non-finite input wraps to 0.
pub fn wrap_to_180(angle: f64) -> f64 {
    wrap(angle, -180.0, 360.0)
}

/// Wraps to [-90, 90). Non-finite input wraps to 0.
pub fn wrap_to_90(angle: f64) -> f64 {
    wrap(angle, -90.0, 180.0)
}

/// Wraps hours to [0, 24). Non-finite input wraps to 0.
pub fn wrap_to_24(hours: f64) -> f64 {
    wrap(hours, 0.0, 24.0)
}

/// Signed shortest rotation from `a` to `b`, in (-180, 180].
pub fn angular_difference(a: f64, b: f64) -> f64 {
    let diff = wrap_to_180(b - a);
    if diff == -180.0 {
        180.0
    } else {
        diff
    }
}

/// True when `angle` lies on the arc running counter-clockwise from `min` to `max`.
pub fn is_angle_between(angle: f64, min: f64, max: f64) -> bool {
    angular_difference(min, angle) >= 0.0 && angular_difference(max, angle) <= 0.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn wrap_360_stays_in_range() {
        for x in [-1080.5, -360.0, -1e-15, -0.0, 0.0, 45.0, 359.999, 360.0, 721.25, 1e9] {
            let w = wrap_to_360(x);
            assert!((0.0..360.0).contains(&w), "{} -> {}", x, w);
            assert_abs_diff_eq!(wrap_to_360(x + 360.0), w, epsilon = 1e-6);
        }
        assert_eq!(wrap_to_360(-90.0), 270.0);
        assert_eq!(wrap_to_360(370.0), 10.0);
    }

    #[test]
    fn wrap_180_and_90_intervals() {
        assert_eq!(wrap_to_180(180.0), -180.0);
        assert_eq!(wrap_to_180(190.0), -170.0);
        assert_eq!(wrap_to_180(-190.0), 170.0);
        assert_eq!(wrap_to_90(90.0), -90.0);
        assert_eq!(wrap_to_90(100.0), -80.0);
        assert_eq!(wrap_to_90(-100.0), 80.0);
        assert_eq!(wrap_to_24(-1.0), 23.0);
        assert_eq!(wrap_to_24(49.5), 1.5);
    }

    #[test]
    fn non_finite_wraps_to_zero() {
        assert_eq!(wrap_to_360(f64::NAN), 0.0);
        assert_eq!(wrap_to_180(f64::INFINITY), 0.0);
        assert_eq!(wrap_to_24(f64::NEG_INFINITY), 0.0);
    }

    #[test]
    fn angular_difference_is_shortest_signed() {
        assert_eq!(angular_difference(10.0, 10.0), 0.0);
        assert_eq!(angular_difference(350.0, 10.0), 20.0);
        assert_eq!(angular_difference(10.0, 350.0), -20.0);
        assert_eq!(angular_difference(0.0, 180.0), 180.0);
        assert_eq!(angular_difference(180.0, 0.0), 180.0);
        for a in [-720.0, -30.0, 0.0, 90.0, 400.0] {
            for b in [-200.0, 0.0, 33.3, 180.0, 359.0] {
                let d = angular_difference(a, b);
                assert!(d > -180.0 && d <= 180.0, "{} {} -> {}", a, b, d);
            }
        }
    }

    #[test]
    fn angle_between_handles_wraparound() {
        assert!(is_angle_between(5.0, 350.0, 20.0));
        assert!(is_angle_between(355.0, 350.0, 20.0));
        assert!(!is_angle_between(180.0, 350.0, 20.0));
        assert!(is_angle_between(90.0, 0.0, 179.0));
    }
}
