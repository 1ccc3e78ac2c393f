//! # Persistent Contact Constraints
//!
//! [`ContactMaintainer`] keeps one [`ContactConstraint`] per touching body
//! pair across steps. Contact points that persist between steps are matched
//! by local-anchor proximity and inherit their accumulated impulses, which is
//! what lets stacks come to rest in a handful of iterations instead of
//! jittering forever.
//!
//! Velocity solving accumulates a non-negative normal impulse per point and a
//! tangential impulse clamped to the friction cone. Positional overlap is
//! removed by a separate Baumgarte pass operating directly on poses.

use std::collections::HashMap;

use glam::Vec2;
use tracing::debug;

use crate::body::{Body, BodyId};
use crate::collision::Collision;
use crate::math::{cross, EPSILON};

/// Contact points whose local anchors moved less than this between steps are
/// considered the same point and keep their impulses.
const ANCHOR_TOLERANCE: f32 = 0.01;

/// Unordered body-pair key: the lower id occupies the high bits, so the key
/// is identical regardless of argument order.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct PairKey(u64);

impl PairKey {
    /// Build the canonical key for two body ids.
    #[must_use]
    pub fn new(a: BodyId, b: BodyId) -> Self {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        Self((u64::from(lo) << 32) | u64::from(hi))
    }
}

/// Lifecycle of a contact point across steps.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PointState {
    /// Created this step, no inherited impulse.
    New,
    /// Matched an existing point this step; impulses carried over.
    Active,
    /// Not seen this step; skipped by the solver and purged at step end.
    Stale,
}

/// One persistent contact point of a constraint.
#[derive(Copy, Clone, Debug)]
pub struct ContactPoint {
    /// Anchor in body A's local frame.
    pub local_anchor_a: Vec2,
    /// Anchor in body B's local frame.
    pub local_anchor_b: Vec2,
    /// World-space offset from body A's origin, cached at preparation.
    pub r_a: Vec2,
    /// World-space offset from body B's origin, cached at preparation.
    pub r_b: Vec2,
    /// Overlap along the normal at this point, positive when penetrating.
    pub penetration: f32,
    /// Accumulated normal impulse, never negative.
    pub normal_impulse: f32,
    /// Accumulated tangential impulse, bounded by the friction cone.
    pub tangent_impulse: f32,
    /// Effective mass along the normal.
    pub normal_mass: f32,
    /// Effective mass along the tangent.
    pub tangent_mass: f32,
    /// Restitution velocity target, non-negative.
    pub bias: f32,
    /// Lifecycle state.
    pub state: PointState,
}

/// All contact points shared by one body pair.
#[derive(Clone, Debug)]
pub struct ContactConstraint {
    /// Lower-id body of the pair.
    pub body_a: BodyId,
    /// Higher-id body of the pair.
    pub body_b: BodyId,
    /// Unit normal pointing from B into A.
    pub normal: Vec2,
    /// Combined friction coefficient, `sqrt(friction_a * friction_b)`.
    pub friction: f32,
    /// Combined restitution, `min(restitution_a, restitution_b)`.
    pub restitution: f32,
    /// Up to two persistent contact points.
    pub points: Vec<ContactPoint>,
}

/// Persistent contact table keyed by body pair.
#[derive(Debug, Default)]
pub struct ContactMaintainer {
    contacts: HashMap<PairKey, ContactConstraint>,
}

/// Disjoint mutable references to two bodies of a slice.
pub(crate) fn body_pair_mut(bodies: &mut [Body], ia: usize, ib: usize) -> (&mut Body, &mut Body) {
    debug_assert_ne!(ia, ib);
    if ia < ib {
        let (left, right) = bodies.split_at_mut(ib);
        (&mut left[ia], &mut right[0])
    } else {
        let (left, right) = bodies.split_at_mut(ia);
        (&mut right[0], &mut left[ib])
    }
}

impl ContactMaintainer {
    /// Create an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live constraints.
    #[must_use]
    pub fn len(&self) -> usize {
        self.contacts.len()
    }

    /// Whether no constraint is live.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.contacts.is_empty()
    }

    /// Constraint for a body pair, if one is live.
    #[must_use]
    pub fn get(&self, a: BodyId, b: BodyId) -> Option<&ContactConstraint> {
        self.contacts.get(&PairKey::new(a, b))
    }

    /// Iterate over all live constraints.
    pub fn iter(&self) -> impl Iterator<Item = &ContactConstraint> {
        self.contacts.values()
    }

    /// Mark every point stale. Called before the narrow phase; points the
    /// detector confirms this step flip back to active.
    pub fn deactivate_all_points(&mut self) {
        for constraint in self.contacts.values_mut() {
            for point in &mut constraint.points {
                point.state = PointState::Stale;
            }
        }
    }

    /// Drop stale points and empty constraints at the end of a step.
    pub fn clear_inactive_points(&mut self) {
        let before: usize = self.contacts.values().map(|c| c.points.len()).sum();
        for constraint in self.contacts.values_mut() {
            constraint.points.retain(|p| p.state != PointState::Stale);
        }
        self.contacts.retain(|_, c| !c.points.is_empty());
        let after: usize = self.contacts.values().map(|c| c.points.len()).sum();
        if before != after {
            debug!(purged = before - after, "contact points purged");
        }
    }

    /// Fold a fresh narrow-phase result into the table.
    ///
    /// Each manifold point either matches an existing point by local-anchor
    /// proximity (inheriting its accumulated impulses, which are immediately
    /// re-applied as a warm start) or creates a new point. Effective masses
    /// and the restitution bias are re-derived either way.
    pub fn add(&mut self, a: &mut Body, b: &mut Body, collision: &Collision) {
        debug_assert_eq!(collision.body_a, a.id);
        debug_assert_eq!(collision.body_b, b.id);
        let key = PairKey::new(a.id, b.id);
        let normal = collision.normal;
        let tangent = normal.perp();

        let constraint = self
            .contacts
            .entry(key)
            .or_insert_with(|| ContactConstraint {
                body_a: collision.body_a,
                body_b: collision.body_b,
                normal,
                friction: (a.friction * b.friction).sqrt(),
                restitution: a.restitution.min(b.restitution),
                points: Vec::with_capacity(2),
            });
        constraint.normal = normal;
        constraint.friction = (a.friction * b.friction).sqrt();
        constraint.restitution = a.restitution.min(b.restitution);

        for &(point_a, point_b) in &collision.pairs {
            let local_anchor_a = a.to_local_point(point_a);
            let local_anchor_b = b.to_local_point(point_b);
            let r_a = point_a - a.position;
            let r_b = point_b - b.position;
            let penetration = (point_b - point_a).dot(normal);

            let rn_a = cross(r_a, normal);
            let rn_b = cross(r_b, normal);
            let k_normal =
                a.inv_mass + b.inv_mass + a.inv_inertia * rn_a * rn_a + b.inv_inertia * rn_b * rn_b;
            let rt_a = cross(r_a, tangent);
            let rt_b = cross(r_b, tangent);
            let k_tangent =
                a.inv_mass + b.inv_mass + a.inv_inertia * rt_a * rt_a + b.inv_inertia * rt_b * rt_b;
            let normal_mass = if k_normal > EPSILON { 1.0 / k_normal } else { 0.0 };
            let tangent_mass = if k_tangent > EPSILON { 1.0 / k_tangent } else { 0.0 };

            let vn = (a.velocity_at(r_a) - b.velocity_at(r_b)).dot(normal);
            let bias = if vn < 0.0 {
                -constraint.restitution * vn
            } else {
                0.0
            };

            let matched = constraint.points.iter().position(|p| {
                p.state == PointState::Stale
                    && (p.local_anchor_a - local_anchor_a).length() < ANCHOR_TOLERANCE
                    && (p.local_anchor_b - local_anchor_b).length() < ANCHOR_TOLERANCE
            });

            let (normal_impulse, tangent_impulse, state) = if let Some(i) = matched {
                let point = &mut constraint.points[i];
                let inherited = (point.normal_impulse, point.tangent_impulse, PointState::Active);
                point.local_anchor_a = local_anchor_a;
                point.local_anchor_b = local_anchor_b;
                point.r_a = r_a;
                point.r_b = r_b;
                point.penetration = penetration;
                point.normal_mass = normal_mass;
                point.tangent_mass = tangent_mass;
                point.bias = bias;
                point.state = PointState::Active;
                inherited
            } else {
                constraint.points.push(ContactPoint {
                    local_anchor_a,
                    local_anchor_b,
                    r_a,
                    r_b,
                    penetration,
                    normal_impulse: 0.0,
                    tangent_impulse: 0.0,
                    normal_mass,
                    tangent_mass,
                    bias,
                    state: PointState::New,
                });
                (0.0, 0.0, PointState::New)
            };

            // Warm start: carry last step's impulse into this one.
            if state == PointState::Active {
                let impulse = normal * normal_impulse + tangent * tangent_impulse;
                a.apply_impulse(impulse, r_a);
                b.apply_impulse(-impulse, r_b);
            }
        }
    }

    /// One velocity iteration over every live contact point.
    ///
    /// Normal impulses accumulate and are clamped to stay non-negative;
    /// tangential impulses accumulate inside the friction cone
    /// `|tangent| <= friction * normal`.
    pub fn solve_velocity(&mut self, bodies: &mut [Body], index: &HashMap<BodyId, usize>) {
        for constraint in self.contacts.values_mut() {
            let (Some(&ia), Some(&ib)) =
                (index.get(&constraint.body_a), index.get(&constraint.body_b))
            else {
                continue;
            };
            let (a, b) = body_pair_mut(bodies, ia, ib);
            let normal = constraint.normal;
            let tangent = normal.perp();

            for point in &mut constraint.points {
                if point.state == PointState::Stale {
                    continue;
                }

                let dv = a.velocity_at(point.r_a) - b.velocity_at(point.r_b);
                let vn = dv.dot(normal);
                let lambda = -point.normal_mass * (vn - point.bias);
                let total = (point.normal_impulse + lambda).max(0.0);
                let applied = total - point.normal_impulse;
                point.normal_impulse = total;
                let impulse = normal * applied;
                a.apply_impulse(impulse, point.r_a);
                b.apply_impulse(-impulse, point.r_b);

                let dv = a.velocity_at(point.r_a) - b.velocity_at(point.r_b);
                let vt = dv.dot(tangent);
                let lambda = -point.tangent_mass * vt;
                let max_friction = constraint.friction * point.normal_impulse;
                let total =
                    (point.tangent_impulse + lambda).clamp(-max_friction, max_friction);
                let applied = total - point.tangent_impulse;
                point.tangent_impulse = total;
                let impulse = tangent * applied;
                a.apply_impulse(impulse, point.r_a);
                b.apply_impulse(-impulse, point.r_b);
            }
        }
    }

    /// One Baumgarte position iteration.
    ///
    /// Residual overlap beyond `slop` is removed by moving poses directly,
    /// scaled by `bias_factor` per iteration. Sleeping bodies stay put;
    /// static and kinematic bodies are immovable through their zero inverse
    /// masses.
    pub fn solve_position(
        &mut self,
        bodies: &mut [Body],
        index: &HashMap<BodyId, usize>,
        bias_factor: f32,
        slop: f32,
    ) {
        for constraint in self.contacts.values() {
            let (Some(&ia), Some(&ib)) =
                (index.get(&constraint.body_a), index.get(&constraint.body_b))
            else {
                continue;
            };
            let (a, b) = body_pair_mut(bodies, ia, ib);
            if a.sleeping && b.sleeping {
                continue;
            }
            let normal = constraint.normal;

            for point in &constraint.points {
                if point.state == PointState::Stale {
                    continue;
                }
                let world_a = a.to_world_point(point.local_anchor_a);
                let world_b = b.to_world_point(point.local_anchor_b);
                let penetration = (world_b - world_a).dot(normal);
                let correction = bias_factor * (penetration - slop).max(0.0);
                if correction <= 0.0 {
                    continue;
                }

                let r_a = world_a - a.position;
                let r_b = world_b - b.position;
                let rn_a = cross(r_a, normal);
                let rn_b = cross(r_b, normal);
                let k = a.inv_mass
                    + b.inv_mass
                    + a.inv_inertia * rn_a * rn_a
                    + b.inv_inertia * rn_b * rn_b;
                if k <= EPSILON {
                    continue;
                }
                let impulse = normal * (correction / k);
                if !a.sleeping {
                    a.position += impulse * a.inv_mass;
                    a.rotation += a.inv_inertia * cross(r_a, impulse);
                }
                if !b.sleeping {
                    b.position -= impulse * b.inv_mass;
                    b.rotation -= b.inv_inertia * cross(r_b, impulse);
                }
            }
        }
    }
}
