//! Collision detection: broad-phase tree, GJK/EPA narrow phase, manifold
//! clipping, and the detector that ties them together.

pub mod clip;
pub mod detector;
pub mod gjk;
pub mod tree;

pub use detector::{detect, Collision};
pub use gjk::{distance, epa, gjk, MinkowskiPoint, Penetration, Simplex};
pub use tree::DynamicTree;
