use crate::body::BodyId;

/// Errors surfaced by the world-level API.
///
/// Numerical degeneracy inside the collision algorithms is recovered locally
/// and never reaches this type; these variants cover malformed input only.
#[derive(Debug, thiserror::Error)]
pub enum PhysicsError {
    /// The referenced body does not exist in the world.
    #[error("unknown body id {0}")]
    UnknownBody(BodyId),
    /// A shape failed validation (empty polygon, non-positive radius, ...).
    #[error("degenerate shape: {0}")]
    DegenerateShape(&'static str),
    /// A non-positive mass was supplied for a dynamic body.
    #[error("invalid mass {0}")]
    InvalidMass(f32),
}
