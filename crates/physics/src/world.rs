//! # World Step Driver
//!
//! [`PhysicsWorld`] owns the bodies, the broad-phase tree, and the persistent
//! contact table, and advances the simulation one fixed step at a time:
//!
//! 1. integrate forces into velocities (gravity, damping)
//! 2. refresh broad-phase leaves and generate candidate pairs
//! 3. filter pairs (bitmask, immovable pairs, sleepers) and run the detector
//! 4. fold manifolds into the contact table (warm start)
//! 5. velocity iterations, position integration, position iterations
//! 6. purge contact points that were not refreshed this step

use std::collections::HashMap;

use glam::Vec2;
use tracing::{debug, trace};

use crate::aabb::Aabb;
use crate::body::{Body, BodyId, BodyType, IdAllocator};
use crate::collision::{detect, DynamicTree};
use crate::error::PhysicsError;
use crate::shapes::Shape;
use crate::solver::contact::{body_pair_mut, ContactMaintainer};

/// Tunable step parameters.
#[derive(Copy, Clone, Debug)]
pub struct WorldConfig {
    /// Gravitational acceleration applied to dynamic bodies.
    pub gravity: Vec2,
    /// Per-step velocity damping multiplier.
    pub damping: f32,
    /// Sequential-impulse velocity iterations per step.
    pub velocity_iterations: usize,
    /// Baumgarte position iterations per step.
    pub position_iterations: usize,
    /// Fraction of residual overlap removed per position iteration.
    pub bias_factor: f32,
    /// Overlap tolerated without positional correction.
    pub penetration_slop: f32,
    /// Broad-phase fat-AABB margin.
    pub aabb_margin: f32,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            gravity: Vec2::new(0.0, -9.8),
            damping: 0.999,
            velocity_iterations: 8,
            position_iterations: 3,
            bias_factor: 0.2,
            penetration_slop: 0.005,
            aabb_margin: 0.1,
        }
    }
}

/// A 2D rigid-body world.
pub struct PhysicsWorld {
    config: WorldConfig,
    bodies: Vec<Body>,
    index: HashMap<BodyId, usize>,
    ids: IdAllocator,
    tree: DynamicTree,
    contacts: ContactMaintainer,
}

impl Default for PhysicsWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl PhysicsWorld {
    /// Create an empty world with default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(WorldConfig::default())
    }

    /// Create an empty world with the given configuration.
    #[must_use]
    pub fn with_config(config: WorldConfig) -> Self {
        Self {
            config,
            bodies: Vec::new(),
            index: HashMap::new(),
            ids: IdAllocator::new(),
            tree: DynamicTree::with_margin(config.aabb_margin),
            contacts: ContactMaintainer::new(),
        }
    }

    /// The active configuration.
    #[must_use]
    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    /// Number of bodies in the world.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    /// Whether the world holds no bodies.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    /// Add a dynamic body at the origin and return its id.
    ///
    /// # Errors
    ///
    /// [`PhysicsError::DegenerateShape`] when the shape fails validation,
    /// [`PhysicsError::InvalidMass`] for a non-positive mass.
    pub fn add_body(&mut self, shape: Shape, mass: f32) -> Result<BodyId, PhysicsError> {
        shape.validate()?;
        if mass <= 0.0 {
            return Err(PhysicsError::InvalidMass(mass));
        }
        let id = self.ids.alloc();
        let body = Body::new(id, shape, mass);
        self.tree.insert(&body);
        self.index.insert(id, self.bodies.len());
        self.bodies.push(body);
        Ok(id)
    }

    /// Add a static body at the given position and return its id.
    ///
    /// # Errors
    ///
    /// [`PhysicsError::DegenerateShape`] when the shape fails validation.
    pub fn add_static_body(&mut self, shape: Shape, position: Vec2) -> Result<BodyId, PhysicsError> {
        shape.validate()?;
        let id = self.ids.alloc();
        let mut body = Body::new(id, shape, 1.0);
        body.position = position;
        body.set_body_type(BodyType::Static);
        self.tree.insert(&body);
        self.index.insert(id, self.bodies.len());
        self.bodies.push(body);
        Ok(id)
    }

    /// Remove a body, freeing its id for reuse.
    ///
    /// # Errors
    ///
    /// [`PhysicsError::UnknownBody`] when the id is not in the world.
    pub fn remove_body(&mut self, id: BodyId) -> Result<(), PhysicsError> {
        let slot = self.index.remove(&id).ok_or(PhysicsError::UnknownBody(id))?;
        self.tree.remove(id);
        self.ids.free(id);
        self.bodies.swap_remove(slot);
        if slot < self.bodies.len() {
            self.index.insert(self.bodies[slot].id, slot);
        }
        Ok(())
    }

    /// Borrow a body by id.
    #[must_use]
    pub fn body(&self, id: BodyId) -> Option<&Body> {
        self.index.get(&id).map(|&i| &self.bodies[i])
    }

    /// Mutably borrow a body by id.
    ///
    /// Pose edits take effect in the broad phase at the next step.
    pub fn body_mut(&mut self, id: BodyId) -> Option<&mut Body> {
        self.index.get(&id).map(|&i| &mut self.bodies[i])
    }

    /// Iterate over all bodies.
    pub fn bodies(&self) -> impl Iterator<Item = &Body> {
        self.bodies.iter()
    }

    /// The persistent contact table, for inspection.
    #[must_use]
    pub fn contacts(&self) -> &ContactMaintainer {
        &self.contacts
    }

    /// Ids of bodies whose fat AABB overlaps the query box.
    #[must_use]
    pub fn query_aabb(&self, aabb: &Aabb) -> Vec<BodyId> {
        self.tree.query(aabb)
    }

    /// Ids of bodies whose fat AABB the ray hits.
    #[must_use]
    pub fn raycast(&self, origin: Vec2, dir: Vec2) -> Vec<BodyId> {
        self.tree.raycast(origin, dir)
    }

    /// Advance the simulation by `dt` seconds.
    pub fn step(&mut self, dt: f32) {
        self.integrate_velocities(dt);

        for body in &self.bodies {
            self.tree.update(body);
        }

        self.contacts.deactivate_all_points();
        let pairs = self.tree.generate();
        trace!(candidates = pairs.len(), "broad phase");

        let mut manifolds = 0usize;
        for (id_a, id_b) in pairs {
            let (Some(&ia), Some(&ib)) = (self.index.get(&id_a), self.index.get(&id_b)) else {
                continue;
            };
            {
                let a = &self.bodies[ia];
                let b = &self.bodies[ib];
                if a.bitmask & b.bitmask == 0 {
                    continue;
                }
                if !a.body_type.responds_to_impulses() && !b.body_type.responds_to_impulses() {
                    continue;
                }
                if a.sleeping && b.sleeping {
                    continue;
                }
            }
            let Some(collision) = detect(&self.bodies[ia], &self.bodies[ib]) else {
                continue;
            };
            let (a, b) = body_pair_mut(&mut self.bodies, ia, ib);
            let (a, b) = if a.id == collision.body_a { (a, b) } else { (b, a) };
            self.contacts.add(a, b, &collision);
            manifolds += 1;
        }
        debug!(manifolds, contacts = self.contacts.len(), "narrow phase");

        for _ in 0..self.config.velocity_iterations {
            self.contacts.solve_velocity(&mut self.bodies, &self.index);
        }

        self.integrate_positions(dt);

        for _ in 0..self.config.position_iterations {
            self.contacts.solve_position(
                &mut self.bodies,
                &self.index,
                self.config.bias_factor,
                self.config.penetration_slop,
            );
        }

        self.contacts.clear_inactive_points();
    }

    fn integrate_velocities(&mut self, dt: f32) {
        for body in &mut self.bodies {
            if body.sleeping {
                body.forces = Vec2::ZERO;
                continue;
            }
            if body.body_type.responds_to_impulses() {
                body.velocity += (self.config.gravity + body.forces * body.inv_mass) * dt;
                body.velocity *= self.config.damping;
                body.angular_velocity *= self.config.damping;
            }
            body.forces = Vec2::ZERO;
        }
    }

    fn integrate_positions(&mut self, dt: f32) {
        for body in &mut self.bodies {
            if body.sleeping || body.body_type == BodyType::Static {
                continue;
            }
            body.position += body.velocity * dt;
            body.rotation += body.angular_velocity * dt;
        }
    }
}
