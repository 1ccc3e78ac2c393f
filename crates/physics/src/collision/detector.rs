//! Narrow-phase driver: GJK, then EPA, then manifold clipping.

use glam::Vec2;
use tracing::trace;

use crate::body::{Body, BodyId};
use crate::collision::clip::clip;
use crate::collision::gjk::{epa, gjk, MAX_ITERATIONS};

/// The result of a narrow-phase test between two overlapping bodies.
#[derive(Clone, Debug)]
pub struct Collision {
    /// Lower-id body of the pair.
    pub body_a: BodyId,
    /// Higher-id body of the pair.
    pub body_b: BodyId,
    /// Unit normal pointing from `body_b` into `body_a`.
    pub normal: Vec2,
    /// Maximum penetration depth along the normal.
    pub penetration: f32,
    /// Up to two `(point_on_a, point_on_b)` contact pairs in world space.
    pub pairs: Vec<(Vec2, Vec2)>,
}

/// Test two bodies for overlap and build their contact manifold.
///
/// The pair is canonicalized to lower id first, so the result is independent
/// of argument order. Pairs of shapes that both expose vertices go through
/// edge clipping; anything else (and grazing cases where clipping yields no
/// survivors) falls back to the EPA witness pair.
#[must_use]
pub fn detect(a: &Body, b: &Body) -> Option<Collision> {
    let (a, b) = if a.id <= b.id { (a, b) } else { (b, a) };

    let (hit, simplex) = gjk(a, b, MAX_ITERATIONS);
    if !hit {
        return None;
    }
    let pen = epa(a, b, &simplex, MAX_ITERATIONS);

    let mut pairs = if a.shape.has_vertices() && b.shape.has_vertices() {
        clip(a, b, pen.normal)
    } else {
        Vec::new()
    };
    if pairs.is_empty() {
        pairs.push((pen.point_a, pen.point_b));
    }

    trace!(
        body_a = a.id,
        body_b = b.id,
        depth = pen.depth,
        points = pairs.len(),
        "contact"
    );
    Some(Collision {
        body_a: a.id,
        body_b: b.id,
        normal: pen.normal,
        penetration: pen.depth,
        pairs,
    })
}
