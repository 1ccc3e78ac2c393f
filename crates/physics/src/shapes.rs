//! # Convex Shape Primitives
//!
//! Every collider in the engine is one of the [`Shape`] variants defined
//! here. The narrow phase only needs two capabilities from a shape: a
//! support-point query (the farthest point in a world direction) and, for
//! polygon-like shapes, an ordered vertex list for manifold clipping.
//! Variants without a well-defined edge (circle, ellipse, capsule, point)
//! report no vertices and are handled by the caller via witness points.

use glam::Vec2;

use crate::error::PhysicsError;
use crate::math::{rotate, EPSILON};

/// A convex collision primitive in local space, centered on the body origin.
#[derive(Clone, Debug, PartialEq)]
pub enum Shape {
    /// A circle of the given radius.
    Circle {
        /// Radius, must be positive.
        radius: f32,
    },
    /// A convex polygon with counterclockwise winding.
    Polygon {
        /// Local-space vertices, counterclockwise, at least three.
        vertices: Vec<Vec2>,
    },
    /// An axis-aligned ellipse (before body rotation).
    Ellipse {
        /// Half extent along local x.
        half_width: f32,
        /// Half extent along local y.
        half_height: f32,
    },
    /// A capsule: segment along local x with rounded caps.
    Capsule {
        /// Half length of the core segment.
        half_length: f32,
        /// Cap radius, must be positive.
        radius: f32,
    },
    /// A one-dimensional segment.
    Edge {
        /// Segment endpoints in local space.
        points: [Vec2; 2],
    },
    /// A single point at the body origin.
    Point,
}

impl Shape {
    /// Convenience constructor for a segment shape.
    #[must_use]
    pub fn edge(start: Vec2, end: Vec2) -> Self {
        Self::Edge {
            points: [start, end],
        }
    }

    /// Convenience constructor for an axis-aligned rectangle polygon.
    #[must_use]
    pub fn rectangle(width: f32, height: f32) -> Self {
        let hw = width * 0.5;
        let hh = height * 0.5;
        Self::Polygon {
            vertices: vec![
                Vec2::new(-hw, -hh),
                Vec2::new(hw, -hh),
                Vec2::new(hw, hh),
                Vec2::new(-hw, hh),
            ],
        }
    }

    /// Reject malformed primitives before any geometry math runs on them.
    ///
    /// # Errors
    ///
    /// Returns [`PhysicsError::DegenerateShape`] for polygons with fewer than
    /// three vertices, non-positive radii or extents, and zero-length edges.
    pub fn validate(&self) -> Result<(), PhysicsError> {
        match self {
            Self::Circle { radius } => {
                if *radius <= 0.0 {
                    return Err(PhysicsError::DegenerateShape("circle radius must be positive"));
                }
            }
            Self::Polygon { vertices } => {
                if vertices.len() < 3 {
                    return Err(PhysicsError::DegenerateShape("polygon needs at least 3 vertices"));
                }
            }
            Self::Ellipse {
                half_width,
                half_height,
            } => {
                if *half_width <= 0.0 || *half_height <= 0.0 {
                    return Err(PhysicsError::DegenerateShape("ellipse extents must be positive"));
                }
            }
            Self::Capsule {
                half_length,
                radius,
            } => {
                if *half_length <= 0.0 || *radius <= 0.0 {
                    return Err(PhysicsError::DegenerateShape("capsule extents must be positive"));
                }
            }
            Self::Edge { points } => {
                if (points[1] - points[0]).length_squared() < EPSILON * EPSILON {
                    return Err(PhysicsError::DegenerateShape("edge endpoints coincide"));
                }
            }
            Self::Point => {}
        }
        Ok(())
    }

    /// Farthest point of the shape in world direction `dir`, for a body at
    /// `position` rotated by `rotation`.
    ///
    /// A zero direction degrades to the local +x axis rather than erroring.
    #[must_use]
    pub fn support(&self, position: Vec2, rotation: f32, dir: Vec2) -> Vec2 {
        let local_dir = rotate(dir, -rotation);
        let local_dir = if local_dir.length_squared() < EPSILON * EPSILON {
            Vec2::X
        } else {
            local_dir.normalize()
        };
        let local = self.local_support(local_dir);
        position + rotate(local, rotation)
    }

    fn local_support(&self, dir: Vec2) -> Vec2 {
        match self {
            Self::Circle { radius } => dir * *radius,
            Self::Polygon { vertices } => farthest_vertex(vertices, dir),
            Self::Ellipse {
                half_width,
                half_height,
            } => {
                // Gradient-aligned boundary point of (x/a)^2 + (y/b)^2 = 1.
                let a = *half_width;
                let b = *half_height;
                let v = Vec2::new(a * a * dir.x, b * b * dir.y);
                let len = (a * a * dir.x * dir.x + b * b * dir.y * dir.y).sqrt();
                if len < EPSILON {
                    Vec2::new(a, 0.0)
                } else {
                    v / len
                }
            }
            Self::Capsule {
                half_length,
                radius,
            } => {
                let core = Vec2::new(half_length.copysign(dir.x), 0.0);
                core + dir * *radius
            }
            Self::Edge { points } => {
                if points[0].dot(dir) >= points[1].dot(dir) {
                    points[0]
                } else {
                    points[1]
                }
            }
            Self::Point => Vec2::ZERO,
        }
    }

    /// Ordered local-space vertices for polygon-like shapes.
    ///
    /// `None` for shapes without a well-defined edge; those are excluded from
    /// manifold clipping and fall back to narrow-phase witness points.
    #[must_use]
    pub fn vertices(&self) -> Option<&[Vec2]> {
        match self {
            Self::Polygon { vertices } => Some(vertices),
            Self::Edge { points } => Some(points),
            _ => None,
        }
    }

    /// Whether the shape participates in manifold clipping.
    #[must_use]
    pub fn has_vertices(&self) -> bool {
        self.vertices().is_some()
    }

    /// Rotational inertia about the centroid for the given mass.
    ///
    /// Zero-area shapes (edge, point) report zero; bodies built from them get
    /// an infinite effective inertia.
    #[must_use]
    pub fn inertia(&self, mass: f32) -> f32 {
        match self {
            Self::Circle { radius } => 0.5 * mass * radius * radius,
            Self::Polygon { vertices } => polygon_inertia(vertices, mass),
            Self::Ellipse {
                half_width,
                half_height,
            } => 0.25 * mass * (half_width * half_width + half_height * half_height),
            Self::Capsule {
                half_length,
                radius,
            } => {
                // Treated as its bounding rectangle, close enough for solving.
                let w = 2.0 * (half_length + radius);
                let h = 2.0 * radius;
                mass * (w * w + h * h) / 12.0
            }
            Self::Edge { .. } | Self::Point => 0.0,
        }
    }
}

fn farthest_vertex(vertices: &[Vec2], dir: Vec2) -> Vec2 {
    let mut best = vertices[0];
    let mut best_dot = best.dot(dir);
    for &v in &vertices[1..] {
        let d = v.dot(dir);
        if d > best_dot {
            best = v;
            best_dot = d;
        }
    }
    best
}

fn polygon_inertia(vertices: &[Vec2], mass: f32) -> f32 {
    // Standard second moment of a polygon, scaled to the requested mass.
    let mut numer = 0.0;
    let mut denom = 0.0;
    for i in 0..vertices.len() {
        let p0 = vertices[i];
        let p1 = vertices[(i + 1) % vertices.len()];
        let c = p0.perp_dot(p1).abs();
        numer += c * (p0.dot(p0) + p0.dot(p1) + p1.dot(p1));
        denom += c;
    }
    if denom < EPSILON {
        return 0.0;
    }
    mass * numer / (6.0 * denom)
}
