//! # physics2d
//!
//! A 2D rigid-body collision and contact engine:
//!
//! - **Broad phase**: an AVL-balanced dynamic bounding volume tree over
//!   fattened AABBs ([`DynamicTree`]).
//! - **Narrow phase**: GJK overlap testing, EPA penetration extraction, and a
//!   closest-distance query, all on support functions so every convex shape
//!   shares one code path.
//! - **Manifolds**: reference/incident edge clipping for polygon-like shapes,
//!   witness-point fallback for the rest.
//! - **Solving**: warm-started sequential impulses with Coulomb friction and
//!   a Baumgarte positional pass ([`ContactMaintainer`]).
//!
//! [`PhysicsWorld::step`] drives the whole pipeline; the individual stages
//! are public for callers that only need detection or queries.
//!
//! The simulation is single-threaded and uses `f32` throughout. Numerical
//! degeneracy (zero directions, exhausted iteration budgets, degenerate
//! simplexes) is recovered locally and never surfaces as an error; only
//! malformed input does, as [`PhysicsError`].

#![deny(clippy::all, clippy::pedantic)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::float_cmp,
    clippy::similar_names,
    clippy::many_single_char_names
)]

pub mod aabb;
pub mod body;
pub mod collision;
pub mod error;
pub mod math;
pub mod shapes;
pub mod solver;
pub mod world;

pub use aabb::Aabb;
pub use body::{Body, BodyId, BodyType, IdAllocator};
pub use collision::{detect, distance, epa, gjk, Collision, DynamicTree, Penetration, Simplex};
pub use error::PhysicsError;
pub use shapes::Shape;
pub use solver::{ContactConstraint, ContactMaintainer, ContactPoint, PairKey, PointState};
pub use world::{PhysicsWorld, WorldConfig};
