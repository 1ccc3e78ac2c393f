//! Small geometric helpers shared across the engine.
//!
//! Everything here is epsilon-tolerant: the collision algorithms compare
//! nearly-equal floats constantly and must not branch on representation
//! noise.

use glam::Vec2;

/// Tolerance for float comparisons throughout the engine.
pub const EPSILON: f32 = 1e-6;

/// Whether two scalars are equal within [`EPSILON`].
#[must_use]
pub fn approx_eq(a: f32, b: f32) -> bool {
    (a - b).abs() < EPSILON
}

/// Whether a scalar is zero within [`EPSILON`].
#[must_use]
pub fn approx_zero(a: f32) -> bool {
    a.abs() < EPSILON
}

/// Whether two points coincide within [`EPSILON`] per component.
#[must_use]
pub fn approx_eq_point(a: Vec2, b: Vec2) -> bool {
    approx_eq(a.x, b.x) && approx_eq(a.y, b.y)
}

/// 2D cross product (z component of the 3D cross).
#[must_use]
pub fn cross(a: Vec2, b: Vec2) -> f32 {
    a.perp_dot(b)
}

/// Cross of a scalar (angular velocity) with a vector: `s × v`.
#[must_use]
pub fn cross_scalar(s: f32, v: Vec2) -> Vec2 {
    Vec2::new(-s * v.y, s * v.x)
}

/// Rotate a vector by `angle` radians.
#[must_use]
pub fn rotate(v: Vec2, angle: f32) -> Vec2 {
    Vec2::from_angle(angle).rotate(v)
}

/// Unclamped parameter of the projection of `p` onto the line through
/// `a` and `b` (`0` at `a`, `1` at `b`).
///
/// A degenerate segment (coincident endpoints) projects to its start.
#[must_use]
pub fn raw_projection_parameter(a: Vec2, b: Vec2, p: Vec2) -> f32 {
    let ab = b - a;
    let len_sq = ab.length_squared();
    if len_sq < EPSILON * EPSILON {
        return 0.0;
    }
    (p - a).dot(ab) / len_sq
}

/// Projection of `p` onto the segment `a..b`, returning the projected point
/// and the clamped parameter in `[0, 1]`.
#[must_use]
pub fn project_on_segment(a: Vec2, b: Vec2, p: Vec2) -> (Vec2, f32) {
    let t = raw_projection_parameter(a, b, p).clamp(0.0, 1.0);
    (a + (b - a) * t, t)
}

/// Point on the segment `a..b` closest to `p`.
#[must_use]
pub fn closest_point_on_segment(a: Vec2, b: Vec2, p: Vec2) -> Vec2 {
    project_on_segment(a, b, p).0
}

/// Intersection of the infinite lines through `p1..p2` and `p3..p4`.
///
/// `None` when the lines are parallel within tolerance.
#[must_use]
pub fn line_intersection(p1: Vec2, p2: Vec2, p3: Vec2, p4: Vec2) -> Option<Vec2> {
    let d1 = p2 - p1;
    let d2 = p4 - p3;
    let denom = d1.perp_dot(d2);
    if denom.abs() < EPSILON {
        return None;
    }
    let t = (p3 - p1).perp_dot(d2) / denom;
    Some(p1 + d1 * t)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rotate_quarter_turn() {
        let v = rotate(Vec2::X, std::f32::consts::FRAC_PI_2);
        assert!(approx_eq_point(v, Vec2::Y));
    }

    #[test]
    fn cross_scalar_is_perpendicular() {
        let v = cross_scalar(2.0, Vec2::X);
        assert!(approx_eq_point(v, Vec2::new(0.0, 2.0)));
    }

    #[test]
    fn segment_projection_clamps() {
        let a = Vec2::ZERO;
        let b = Vec2::new(2.0, 0.0);
        assert!(approx_eq_point(
            closest_point_on_segment(a, b, Vec2::new(1.0, 5.0)),
            Vec2::new(1.0, 0.0)
        ));
        assert!(approx_eq_point(
            closest_point_on_segment(a, b, Vec2::new(-3.0, 1.0)),
            a
        ));
        let (_, t) = project_on_segment(a, b, Vec2::new(5.0, 0.0));
        assert!(approx_eq(t, 1.0));
        assert!(approx_eq(raw_projection_parameter(a, b, Vec2::new(5.0, 0.0)), 2.5));
    }

    #[test]
    fn line_intersection_crossing_and_parallel() {
        let p = line_intersection(
            Vec2::new(-1.0, 0.0),
            Vec2::new(1.0, 0.0),
            Vec2::new(0.0, -1.0),
            Vec2::new(0.0, 1.0),
        );
        assert!(matches!(p, Some(q) if approx_eq_point(q, Vec2::ZERO)));
        let none = line_intersection(
            Vec2::ZERO,
            Vec2::X,
            Vec2::new(0.0, 1.0),
            Vec2::new(1.0, 1.0),
        );
        assert!(none.is_none());
    }
}
