//! # GJK / EPA Narrow Phase
//!
//! Operates purely on the Minkowski difference of two convex bodies:
//! [`gjk`] decides overlap by trying to enclose the origin in a simplex,
//! [`epa`] expands a terminal simplex to the difference boundary to extract a
//! penetration normal and depth, and [`distance`] converges a two-point
//! simplex to the closest features of two separated bodies.
//!
//! All iteration counts are capped; exhausting the budget returns the best
//! result found so far rather than an error.

use glam::Vec2;

use crate::body::Body;
use crate::math::{
    approx_eq_point, closest_point_on_segment, project_on_segment, raw_projection_parameter,
    EPSILON,
};

/// Iteration cap shared by [`gjk`], [`epa`], and [`distance`].
pub const MAX_ITERATIONS: usize = 20;

/// A support point of the Minkowski difference, remembering where it came
/// from on each body so witness points can be reconstructed later.
#[derive(Copy, Clone, Debug)]
pub struct MinkowskiPoint {
    /// Support point on body A.
    pub point_a: Vec2,
    /// Support point on body B.
    pub point_b: Vec2,
    /// `point_a - point_b`, the point on the Minkowski difference.
    pub value: Vec2,
}

impl MinkowskiPoint {
    fn approx_eq(&self, other: &Self) -> bool {
        approx_eq_point(self.value, other.value)
    }
}

/// Support point of the Minkowski difference `A - B` in direction `dir`.
#[must_use]
pub fn support(a: &Body, b: &Body, dir: Vec2) -> MinkowskiPoint {
    let point_a = a.support(dir);
    let point_b = b.support(-dir);
    MinkowskiPoint {
        point_a,
        point_b,
        value: point_a - point_b,
    }
}

/// An ordered simplex of Minkowski points.
///
/// Holds one or two points while searching; a terminal triangle is stored as
/// four points with the first repeated at the end to close the loop. EPA
/// grows the closed loop in place.
#[derive(Clone, Debug, Default)]
pub struct Simplex {
    /// The simplex vertices; closed (last == first) once at four or more.
    pub points: Vec<MinkowskiPoint>,
}

impl Simplex {
    /// Number of distinct vertices (the closing duplicate is not counted).
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        if self.is_closed() {
            self.points.len() - 1
        } else {
            self.points.len()
        }
    }

    fn is_closed(&self) -> bool {
        self.points.len() >= 4
    }

    fn close(&mut self) {
        debug_assert_eq!(self.points.len(), 3);
        self.points.push(self.points[0]);
    }

    fn contains(&self, p: &MinkowskiPoint) -> bool {
        self.points.iter().any(|q| q.approx_eq(p))
    }

    /// Where the origin lies relative to the (triangle) simplex.
    ///
    /// Containment is strict: an origin on a simplex edge is reported as
    /// `OnEdge` so the caller can distinguish touching from overlapping.
    fn origin_location(&self) -> OriginLocation {
        if self.vertex_count() < 3 {
            return OriginLocation::Outside;
        }
        let mut sign = 0.0f32;
        let mut boundary = None;
        for i in 0..3 {
            let j = (i + 1) % 3;
            let p0 = self.points[i].value;
            let p1 = self.points[j].value;
            let cross = (p1 - p0).perp_dot(-p0);
            if cross.abs() < EPSILON {
                boundary = Some((i, j));
                continue;
            }
            if sign == 0.0 {
                sign = cross.signum();
            } else if cross.signum() != sign {
                return OriginLocation::Outside;
            }
        }
        match boundary {
            Some((i, j)) => OriginLocation::OnEdge(i, j),
            None => OriginLocation::Inside,
        }
    }

    /// Indices of the edge closest to the origin.
    ///
    /// Ties within tolerance are broken by preferring the edge whose
    /// endpoints have the smaller combined squared length, which keeps
    /// degenerate symmetric configurations deterministic.
    #[must_use]
    pub fn closest_edge(&self) -> (usize, usize) {
        let n = self.vertex_count();
        debug_assert!(n >= 2);
        if n == 2 {
            return (0, 1);
        }
        let mut best = (0, 1);
        let mut best_dist = f32::INFINITY;
        let mut best_tie = f32::INFINITY;
        for i in 0..n {
            let j = (i + 1) % n;
            let p = closest_point_on_segment(self.points[i].value, self.points[j].value, Vec2::ZERO);
            let dist = p.length_squared();
            let tie = self.points[i].value.length_squared() + self.points[j].value.length_squared();
            if dist + EPSILON < best_dist || ((dist - best_dist).abs() <= EPSILON && tie < best_tie)
            {
                best = (i, j);
                best_dist = dist;
                best_tie = tie;
            }
        }
        best
    }
}

/// Origin classification for a triangle simplex.
enum OriginLocation {
    /// Strictly inside the triangle.
    Inside,
    /// On the edge between the two given vertex indices.
    OnEdge(usize, usize),
    /// Outside the triangle.
    Outside,
}

/// Overlap test between two convex bodies.
///
/// Overlap is strict: exactly-touching bodies report no collision. Returns
/// the terminal simplex alongside the verdict, a closed triangle enclosing
/// the origin on success and the best simplex found otherwise. Bodies
/// sharing a transform origin fall back to an arbitrary `(1, 1)` initial
/// direction.
#[must_use]
pub fn gjk(a: &Body, b: &Body, max_iterations: usize) -> (bool, Simplex) {
    let mut simplex = Simplex::default();

    let mut dir = b.position - a.position;
    if dir.length_squared() < EPSILON * EPSILON {
        dir = Vec2::new(1.0, 1.0);
    }
    for start_dir in [dir, -dir] {
        let p = support(a, b, start_dir);
        simplex.points.push(p);
        // A support point at the origin puts the origin on the boundary of
        // the difference: the bodies touch without overlapping.
        if approx_eq_point(p.value, Vec2::ZERO) {
            return (false, simplex);
        }
    }

    for _ in 0..max_iterations {
        let (i, j) = simplex.closest_edge();
        let closest =
            closest_point_on_segment(simplex.points[i].value, simplex.points[j].value, Vec2::ZERO);
        dir = -closest;
        if dir.length_squared() < EPSILON * EPSILON {
            // Origin sits on the simplex boundary: search perpendicular so a
            // proper triangle can still form around it.
            dir = (simplex.points[j].value - simplex.points[i].value).perp();
        }

        let p = support(a, b, dir);
        if approx_eq_point(p.value, Vec2::ZERO) {
            return (false, simplex);
        }
        if simplex.contains(&p) {
            return (false, simplex);
        }
        // No progress toward the origin means the origin is outside.
        if p.value.dot(dir) <= 0.0 {
            return (false, simplex);
        }

        simplex.points = vec![simplex.points[i], simplex.points[j], p];
        match simplex.origin_location() {
            OriginLocation::Inside => {
                simplex.close();
                return (true, simplex);
            }
            OriginLocation::OnEdge(i, j) => {
                // The origin lies on a chord of the difference. The overlap
                // is strict only if the difference extends past the chord on
                // both perpendicular sides; otherwise the chord is part of
                // the boundary and the bodies merely touch.
                let n = (simplex.points[j].value - simplex.points[i].value)
                    .perp()
                    .normalize_or_zero();
                let forward = support(a, b, n).value.dot(n);
                let backward = support(a, b, -n).value.dot(-n);
                if forward > EPSILON && backward > EPSILON {
                    simplex.close();
                    return (true, simplex);
                }
                return (false, simplex);
            }
            OriginLocation::Outside => {
                // Keep only the edge closest to the origin and continue.
                let (i, j) = simplex.closest_edge();
                simplex.points = vec![simplex.points[i], simplex.points[j]];
            }
        }
    }
    (false, simplex)
}

/// Penetration data extracted by [`epa`].
#[derive(Copy, Clone, Debug)]
pub struct Penetration {
    /// Unit normal pointing from body B into body A.
    pub normal: Vec2,
    /// Penetration depth along the normal, non-negative.
    pub depth: f32,
    /// Witness point on body A.
    pub point_a: Vec2,
    /// Witness point on body B.
    pub point_b: Vec2,
}

/// Expanding polytope refinement of a terminal GJK simplex.
///
/// Each iteration pushes the polytope edge closest to the origin outward via
/// a support query along its outward normal, until the support point already
/// lies on that edge (the edge is on the Minkowski boundary) or the budget
/// runs out.
#[must_use]
pub fn epa(a: &Body, b: &Body, simplex: &Simplex, max_iterations: usize) -> Penetration {
    // Work on the open polygon (drop the closing duplicate).
    let mut poly: Vec<MinkowskiPoint> = simplex.points[..simplex.vertex_count()].to_vec();
    debug_assert!(poly.len() >= 3);

    for _ in 0..max_iterations {
        let (i, j) = closest_polygon_edge(&poly);
        let normal = outward_normal(&poly, i, j);
        let p = support(a, b, normal);
        if p.approx_eq(&poly[i]) || p.approx_eq(&poly[j]) {
            break;
        }
        // Also stop once the expansion no longer makes measurable progress.
        if (p.value.dot(normal) - poly[i].value.dot(normal)).abs() < EPSILON {
            break;
        }
        // Insert between i and j; a wrapping edge appends at the end.
        let at = if j == 0 { poly.len() } else { j };
        poly.insert(at, p);
    }

    let (i, j) = closest_polygon_edge(&poly);
    let normal = outward_normal(&poly, i, j);
    let depth = normal.dot(poly[i].value).abs();

    // Witness points via barycentric interpolation along the final edge.
    let (_, t) = project_on_segment(poly[i].value, poly[j].value, Vec2::ZERO);
    let point_a = poly[i].point_a + (poly[j].point_a - poly[i].point_a) * t;
    let point_b = poly[i].point_b + (poly[j].point_b - poly[i].point_b) * t;

    Penetration {
        normal: -normal,
        depth,
        point_a,
        point_b,
    }
}

fn closest_polygon_edge(poly: &[MinkowskiPoint]) -> (usize, usize) {
    let mut best = (0, 1 % poly.len());
    let mut best_dist = f32::INFINITY;
    let mut best_tie = f32::INFINITY;
    for i in 0..poly.len() {
        let j = (i + 1) % poly.len();
        let p = closest_point_on_segment(poly[i].value, poly[j].value, Vec2::ZERO);
        let dist = p.length_squared();
        let tie = poly[i].value.length_squared() + poly[j].value.length_squared();
        if dist + EPSILON < best_dist || ((dist - best_dist).abs() <= EPSILON && tie < best_tie) {
            best = (i, j);
            best_dist = dist;
            best_tie = tie;
        }
    }
    best
}

/// Outward normal of polygon edge `(i, j)`, oriented away from the origin.
///
/// When the edge itself passes through the origin the orientation is decided
/// against the rest of the polygon instead.
fn outward_normal(poly: &[MinkowskiPoint], i: usize, j: usize) -> Vec2 {
    let edge = poly[j].value - poly[i].value;
    let mut normal = edge.perp().normalize_or_zero();
    let side = normal.dot(poly[i].value);
    if side.abs() > EPSILON {
        if side < 0.0 {
            normal = -normal;
        }
        return normal;
    }
    // Origin on the edge: flip so the normal points out of the polygon.
    let k = (j + 1) % poly.len();
    if normal.dot(poly[k].value - poly[i].value) > 0.0 {
        normal = -normal;
    }
    normal
}

/// Closest points between two separated convex bodies.
///
/// A fixed-point iteration over a two-point simplex; the returned pair are
/// the witness points on A and B. Interpolation parameters that leave
/// `[0, 1]` fall back to the exact vertex (degenerate or parallel features).
#[must_use]
pub fn distance(a: &Body, b: &Body, max_iterations: usize) -> (Vec2, Vec2) {
    let mut dir = b.position - a.position;
    if dir.length_squared() < EPSILON * EPSILON {
        dir = Vec2::new(1.0, 1.0);
    }
    let mut p1 = support(a, b, dir);
    let mut p2 = support(a, b, -dir);

    for _ in 0..max_iterations {
        let closest = closest_point_on_segment(p1.value, p2.value, Vec2::ZERO);
        dir = -closest;
        if dir.length_squared() < EPSILON * EPSILON {
            break;
        }
        let p = support(a, b, dir);
        if p.approx_eq(&p1) || p.approx_eq(&p2) {
            break;
        }
        // Keep whichever replacement leaves the origin-closest edge.
        let keep_p2 = closest_point_on_segment(p.value, p2.value, Vec2::ZERO).length_squared();
        let keep_p1 = closest_point_on_segment(p1.value, p.value, Vec2::ZERO).length_squared();
        if keep_p2 < keep_p1 {
            p1 = p;
        } else {
            p2 = p;
        }
    }

    let t = raw_projection_parameter(p1.value, p2.value, Vec2::ZERO);
    if t < 0.0 {
        (p1.point_a, p1.point_b)
    } else if t > 1.0 {
        (p2.point_a, p2.point_b)
    } else {
        (
            p1.point_a + (p2.point_a - p1.point_a) * t,
            p1.point_b + (p2.point_b - p1.point_b) * t,
        )
    }
}
