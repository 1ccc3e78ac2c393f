//! Sequential-impulse contact solving with persistent warm-started contacts.

pub mod contact;

pub use contact::{ContactConstraint, ContactMaintainer, ContactPoint, PairKey, PointState};
