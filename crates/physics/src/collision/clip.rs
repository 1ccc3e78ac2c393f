//! # Contact Manifold Clipping
//!
//! Turns a single penetration normal into up to two contact point pairs for
//! polygon-like shape pairs. One shape contributes the reference edge, the
//! other the incident edge; the incident edge is clipped against the side
//! planes of the reference edge and against the reference face, and the
//! survivors are paired with their projections onto the reference edge.
//!
//! Shapes without vertices (circle, ellipse, capsule, point) never reach this
//! module; the detector falls back to the narrow-phase witness points.

use glam::Vec2;

use crate::body::Body;
use crate::math::{line_intersection, project_on_segment, EPSILON};

/// The clip edge of one body for a given world direction: the edge adjacent
/// to the farthest vertex that is most perpendicular to the direction.
fn clip_edge(body: &Body, dir: Vec2) -> Option<[Vec2; 2]> {
    let locals = body.shape.vertices()?;
    let world: Vec<Vec2> = locals.iter().map(|&v| body.to_world_point(v)).collect();
    let n = world.len();

    let mut best = 0;
    let mut best_dot = world[0].dot(dir);
    for (i, v) in world.iter().enumerate().skip(1) {
        let d = v.dot(dir);
        if d > best_dot {
            best = i;
            best_dot = d;
        }
    }

    let prev = (best + n - 1) % n;
    let next = (best + 1) % n;
    let toward = (world[best] - world[prev]).normalize_or_zero();
    let away = (world[next] - world[best]).normalize_or_zero();
    if toward.dot(dir).abs() <= away.dot(dir).abs() {
        Some([world[prev], world[best]])
    } else {
        Some([world[best], world[next]])
    }
}

/// Clip the incident segment against the plane through `plane_point` that
/// keeps the half-space in direction `keep_dir`.
///
/// An endpoint on the discarded side is replaced by the intersection of the
/// segment with the plane; if the segment is parallel to the plane it is left
/// untouched.
fn clip_side(points: &mut [Vec2; 2], plane_point: Vec2, keep_dir: Vec2) {
    let d0 = (points[0] - plane_point).dot(keep_dir);
    let d1 = (points[1] - plane_point).dot(keep_dir);
    if d0 >= 0.0 && d1 >= 0.0 {
        return;
    }
    if d0 < 0.0 && d1 < 0.0 {
        // The segment lies entirely outside: collapse it onto the plane
        // point so no contact deeper than the reference corner survives.
        points[0] = plane_point;
        points[1] = plane_point;
        return;
    }
    let along_plane = plane_point + keep_dir.perp();
    let replaced = usize::from(d0 >= 0.0);
    if let Some(p) = line_intersection(points[0], points[1], plane_point, along_plane) {
        points[replaced] = p;
    }
}

/// Build the contact manifold for two overlapping polygon-like bodies.
///
/// `normal` is the penetration normal pointing from `b` into `a`. The result
/// is up to two `(point_on_a, point_on_b)` pairs, or empty when the incident
/// edge lies entirely outside the reference face (grazing configurations).
#[must_use]
pub fn clip(a: &Body, b: &Body, normal: Vec2) -> Vec<(Vec2, Vec2)> {
    let Some(edge_a) = clip_edge(a, -normal) else {
        return Vec::new();
    };
    let Some(edge_b) = clip_edge(b, normal) else {
        return Vec::new();
    };

    // The edge with the larger projection onto the normal becomes the
    // reference; the other is clipped against it.
    let along_a = (edge_a[1] - edge_a[0]).normalize_or_zero();
    let along_b = (edge_b[1] - edge_b[0]).normalize_or_zero();
    let (reference, mut incident, swapped) =
        if along_a.dot(normal).abs() >= along_b.dot(normal).abs() {
            (edge_a, edge_b, false)
        } else {
            (edge_b, edge_a, true)
        };

    let ref_dir = (reference[1] - reference[0]).normalize_or_zero();
    clip_side(&mut incident, reference[0], ref_dir);
    clip_side(&mut incident, reference[1], -ref_dir);

    // Containment against the reference face: keep incident points on the
    // reference body's side of its face.
    let face_out = if swapped { normal } else { -normal };
    let d0 = (incident[0] - reference[0]).dot(face_out);
    let d1 = (incident[1] - reference[0]).dot(face_out);
    let keep0 = d0 <= EPSILON;
    let keep1 = d1 <= EPSILON;
    match (keep0, keep1) {
        (false, false) => return Vec::new(),
        (true, true) => {}
        // One survivor: pull the discarded endpoint back onto the face.
        _ => {
            let along_face = reference[0] + face_out.perp();
            if let Some(p) = line_intersection(incident[0], incident[1], reference[0], along_face)
            {
                incident[if keep0 { 1 } else { 0 }] = p;
            } else {
                incident[if keep0 { 1 } else { 0 }] = incident[usize::from(!keep0)];
            }
        }
    }

    let mut pairs = Vec::with_capacity(2);
    for &p in &incident {
        let (on_reference, _) = project_on_segment(reference[0], reference[1], p);
        if swapped {
            pairs.push((p, on_reference));
        } else {
            pairs.push((on_reference, p));
        }
    }
    pairs.dedup_by(|x, y| crate::math::approx_eq_point(x.0, y.0));
    pairs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::Shape;

    fn rect(id: u32, x: f32, y: f32) -> Body {
        let mut body = Body::new(id, Shape::rectangle(2.0, 2.0), 1.0);
        body.position = Vec2::new(x, y);
        body
    }

    #[test]
    fn face_face_produces_two_points() {
        let a = rect(0, 0.0, 0.0);
        let b = rect(1, 1.5, 0.0);
        let normal = Vec2::new(-1.0, 0.0);
        let pairs = clip(&a, &b, normal);
        assert_eq!(pairs.len(), 2);
        for (pa, pb) in &pairs {
            assert!((pa.x - 1.0).abs() < 1e-5);
            assert!((pb.x - 0.5).abs() < 1e-5);
            assert!(((pb.y - pa.y)).abs() < 1e-5);
            // Per-point penetration along the normal.
            assert!(((*pb - *pa).dot(normal) - 0.5).abs() < 1e-5);
        }
    }

    #[test]
    fn clipping_is_deterministic() {
        let a = rect(0, 0.0, 0.0);
        let mut b = rect(1, 1.4, 0.9);
        b.rotation = 0.3;
        let normal = Vec2::new(-1.0, 0.0);
        let first = clip(&a, &b, normal);
        let second = clip(&a, &b, normal);
        assert_eq!(first, second);
    }

    #[test]
    fn offset_boxes_clip_to_overlap_span() {
        let a = rect(0, 0.0, 0.0);
        let b = rect(1, 1.5, 1.0);
        let pairs = clip(&a, &b, Vec2::new(-1.0, 0.0));
        assert!(!pairs.is_empty());
        for (pa, pb) in &pairs {
            // Contact span is limited to the vertical overlap of the faces.
            assert!(pa.y >= -1.0 - 1e-5 && pa.y <= 1.0 + 1e-5);
            assert!(pb.y >= 0.0 - 1e-5 && pb.y <= 2.0 + 1e-5);
        }
    }

    #[test]
    fn incident_edge_beyond_a_side_plane_collapses_to_the_corner() {
        // The incident face sits entirely past the reference edge's side
        // plane; the manifold must degrade to the corner, not report contact
        // depth from unclipped points.
        let a = rect(0, 0.0, 0.0);
        let b = rect(1, 1.5, 2.5);
        let normal = Vec2::new(-1.0, 0.0);
        let pairs = clip(&a, &b, normal);
        for (pa, pb) in &pairs {
            assert!(
                (*pb - *pa).dot(normal).abs() < 1e-5,
                "spurious depth for pair {pa:?} / {pb:?}"
            );
        }
    }

    #[test]
    fn circles_have_no_clip_edge() {
        let mut a = Body::new(0, Shape::Circle { radius: 1.0 }, 1.0);
        let b = rect(1, 1.5, 0.0);
        a.position = Vec2::ZERO;
        assert!(clip(&a, &b, Vec2::new(-1.0, 0.0)).is_empty());
    }
}
