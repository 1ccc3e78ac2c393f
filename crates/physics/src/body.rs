//! # Rigid Body State
//!
//! [`Body`] is the per-object state consumed by every stage of a step: pose
//! and velocities for integration, inverse mass/inertia and material
//! coefficients for the solver, the collision bitmask for broad-phase pair
//! filtering. Ids come from an [`IdAllocator`] owned by the world so that id
//! reuse stays an explicit, local concern.

use glam::Vec2;

use crate::math::{cross, cross_scalar, rotate};
use crate::shapes::Shape;

/// Identifier of a body inside a world.
pub type BodyId = u32;

/// How a body participates in the simulation.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BodyType {
    /// Never moves; infinite mass and inertia.
    Static,
    /// Moves with user-set velocity, unaffected by impulses.
    Kinematic,
    /// Fully simulated.
    Dynamic,
    /// Fully simulated, flagged as fast-moving. Treated like `Dynamic` here;
    /// continuous collision detection is out of scope.
    Bullet,
}

impl BodyType {
    /// Whether impulses may change this body's velocities.
    #[must_use]
    pub fn responds_to_impulses(self) -> bool {
        matches!(self, Self::Dynamic | Self::Bullet)
    }
}

/// A rigid body: shape, pose, velocities, and physical attributes.
#[derive(Clone, Debug)]
pub struct Body {
    /// World-unique id, allocated by the owning world.
    pub id: BodyId,
    /// Collision shape in local space, centered on the body origin.
    pub shape: Shape,
    /// World position of the body origin.
    pub position: Vec2,
    /// Rotation angle in radians.
    pub rotation: f32,
    /// Linear velocity.
    pub velocity: Vec2,
    /// Angular velocity in radians per second.
    pub angular_velocity: f32,
    /// Accumulated force, cleared after each step.
    pub forces: Vec2,
    /// Mass in kilograms.
    pub mass: f32,
    /// Inverse mass; zero for static and kinematic bodies.
    pub inv_mass: f32,
    /// Inverse rotational inertia; zero when the shape has no area.
    pub inv_inertia: f32,
    /// Coulomb friction coefficient.
    pub friction: f32,
    /// Restitution coefficient in `[0, 1]`.
    pub restitution: f32,
    /// Collision filter: two bodies are only tested when the AND of their
    /// masks is non-zero.
    pub bitmask: u32,
    /// Simulation role.
    pub body_type: BodyType,
    /// Sleeping bodies are skipped by detection and positional correction.
    pub sleeping: bool,
}

impl Body {
    /// Create a dynamic body. Inertia is derived from the shape and mass.
    #[must_use]
    pub fn new(id: BodyId, shape: Shape, mass: f32) -> Self {
        let inertia = shape.inertia(mass);
        let inv_inertia = if inertia > 0.0 { 1.0 / inertia } else { 0.0 };
        Self {
            id,
            shape,
            position: Vec2::ZERO,
            rotation: 0.0,
            velocity: Vec2::ZERO,
            angular_velocity: 0.0,
            forces: Vec2::ZERO,
            mass,
            inv_mass: 1.0 / mass,
            inv_inertia,
            friction: 0.5,
            restitution: 0.0,
            bitmask: 1,
            body_type: BodyType::Dynamic,
            sleeping: false,
        }
    }

    /// Change the simulation role, adjusting effective mass terms.
    pub fn set_body_type(&mut self, body_type: BodyType) {
        self.body_type = body_type;
        if body_type.responds_to_impulses() {
            self.inv_mass = if self.mass > 0.0 { 1.0 / self.mass } else { 0.0 };
            let inertia = self.shape.inertia(self.mass);
            self.inv_inertia = if inertia > 0.0 { 1.0 / inertia } else { 0.0 };
        } else {
            self.inv_mass = 0.0;
            self.inv_inertia = 0.0;
        }
    }

    /// Transform a world point into the body frame (relative to the origin).
    #[must_use]
    pub fn to_local_point(&self, world: Vec2) -> Vec2 {
        rotate(world - self.position, -self.rotation)
    }

    /// Transform a body-frame point back into world space.
    #[must_use]
    pub fn to_world_point(&self, local: Vec2) -> Vec2 {
        self.position + rotate(local, self.rotation)
    }

    /// Farthest point of the body's shape in world direction `dir`.
    #[must_use]
    pub fn support(&self, dir: Vec2) -> Vec2 {
        self.shape.support(self.position, self.rotation, dir)
    }

    /// Velocity of the material point at offset `r` from the origin.
    #[must_use]
    pub fn velocity_at(&self, r: Vec2) -> Vec2 {
        self.velocity + cross_scalar(self.angular_velocity, r)
    }

    /// Apply an impulse at offset `r` from the origin, mutating velocities.
    ///
    /// No-op for bodies that do not respond to impulses.
    pub fn apply_impulse(&mut self, impulse: Vec2, r: Vec2) {
        if !self.body_type.responds_to_impulses() {
            return;
        }
        self.velocity += impulse * self.inv_mass;
        self.angular_velocity += self.inv_inertia * cross(r, impulse);
    }
}

/// Free-list id allocator owned by the world.
///
/// Freed ids are recycled before the monotonic counter grows, so long-running
/// worlds with churn keep their id range compact.
#[derive(Clone, Debug, Default)]
pub struct IdAllocator {
    free: Vec<BodyId>,
    next: BodyId,
}

impl IdAllocator {
    /// Create an empty allocator.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            free: Vec::new(),
            next: 0,
        }
    }

    /// Allocate an id, reusing a freed one when available.
    pub fn alloc(&mut self) -> BodyId {
        if let Some(id) = self.free.pop() {
            id
        } else {
            let id = self.next;
            self.next += 1;
            id
        }
    }

    /// Return an id to the pool. The id is assumed to not already be free.
    pub fn free(&mut self, id: BodyId) {
        debug_assert!(id < self.next);
        self.free.push(id);
    }
}
