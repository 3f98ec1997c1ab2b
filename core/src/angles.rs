//! Planar angle utilities shared by the motion model and the landmark
//! initialization filter.
//!
//! All angles in this crate are headings in radians, wrapped to the
//! half-open-ish interval [-pi, pi]. Wrapping is done with repeated
//! subtraction rather than a modulo so that values already in range pass
//! through bit-exact.

use std::f64::consts::PI;

/// Wrap an angle to [-pi, pi].
///
/// Idempotent: `wrap_to_pi(wrap_to_pi(a)) == wrap_to_pi(a)` for any finite
/// input. Inputs far outside range take a single `rem_euclid` reduction
/// instead of iterating, so the cost is bounded even for pathological
/// magnitudes.
pub fn wrap_to_pi(angle: f64) -> f64 {
    let mut a = angle;
    if a.abs() > 4.0 * PI {
        a = (a + PI).rem_euclid(2.0 * PI) - PI;
    }
    while a > PI {
        a -= 2.0 * PI;
    }
    while a < -PI {
        a += 2.0 * PI;
    }
    a
}

/// Convert polar coordinates (radius, angle) to a Cartesian (x, y) pair.
pub fn polar_to_cartesian(radius: f64, angle: f64) -> (f64, f64) {
    (radius * angle.cos(), radius * angle.sin())
}

/// Circular mean of two angles.
///
/// Computed as the first angle plus half the wrapped difference, so the
/// result sits on the shorter arc between the two inputs. The naive
/// arithmetic mean would be wrong across the +/-pi seam.
pub fn mean_angle(angle1: f64, angle2: f64) -> f64 {
    let diff = wrap_to_pi(angle2 - angle1);
    wrap_to_pi(angle1 + diff / 2.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn test_wrap_in_range_passthrough() {
        assert_approx_eq!(wrap_to_pi(0.0), 0.0, 1e-12);
        assert_approx_eq!(wrap_to_pi(1.5), 1.5, 1e-12);
        assert_approx_eq!(wrap_to_pi(-3.0), -3.0, 1e-12);
    }

    #[test]
    fn test_wrap_large_angles() {
        assert_approx_eq!(wrap_to_pi(3.0 * PI), PI, 1e-12);
        assert_approx_eq!(wrap_to_pi(-3.0 * PI), -PI, 1e-12);
        assert_approx_eq!(wrap_to_pi(2.0 * PI), 0.0, 1e-12);
        assert_approx_eq!(wrap_to_pi(-2.0 * PI), 0.0, 1e-12);
    }

    #[test]
    fn test_wrap_idempotent_and_bounded() {
        let mut angle = -25.0;
        while angle < 25.0 {
            let wrapped = wrap_to_pi(angle);
            assert!(wrapped >= -PI && wrapped <= PI, "wrap({angle}) = {wrapped}");
            assert_approx_eq!(wrap_to_pi(wrapped), wrapped, 1e-12);
            angle += 0.37;
        }
    }

    #[test]
    fn test_wrap_huge_magnitudes() {
        // Must return promptly and in range, not iterate 2 pi at a time.
        for angle in [1e12, -1e12, 1e9 + 0.5, -7e8] {
            let wrapped = wrap_to_pi(angle);
            assert!(wrapped >= -PI && wrapped <= PI, "wrap({angle}) = {wrapped}");
            assert_approx_eq!(wrap_to_pi(wrapped), wrapped, 1e-12);
        }
    }

    #[test]
    fn test_polar_to_cartesian_axes() {
        let (x, y) = polar_to_cartesian(2.0, 0.0);
        assert_approx_eq!(x, 2.0, 1e-12);
        assert_approx_eq!(y, 0.0, 1e-12);

        let (x, y) = polar_to_cartesian(3.0, PI / 2.0);
        assert_approx_eq!(x, 0.0, 1e-12);
        assert_approx_eq!(y, 3.0, 1e-12);
    }

    #[test]
    fn test_mean_angle_simple() {
        assert_approx_eq!(mean_angle(0.0, 1.0), 0.5, 1e-12);
        assert_approx_eq!(mean_angle(-0.5, 0.5), 0.0, 1e-12);
    }

    #[test]
    fn test_mean_angle_across_seam() {
        // Mean of angles straddling +/-pi must lie on the short arc.
        let mean = mean_angle(PI - 0.1, -PI + 0.1);
        assert_approx_eq!(mean.abs(), PI, 1e-9);
    }
}
