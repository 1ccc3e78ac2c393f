//! Axis-aligned bounding boxes in center/half-extent form.
//!
//! Tight boxes are derived from a shape's support function in the four axis
//! directions, which covers every convex variant with one code path. The
//! broad-phase tree stores these fattened by a margin so that small motions
//! do not force restructuring every step.

use glam::Vec2;

use crate::body::Body;
use crate::math::EPSILON;

/// An axis-aligned box described by its center and half extents.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Aabb {
    /// Center of the box.
    pub center: Vec2,
    /// Half extent along x, non-negative.
    pub half_width: f32,
    /// Half extent along y, non-negative.
    pub half_height: f32,
}

impl Aabb {
    /// Create a box from its center and half extents.
    #[must_use]
    pub fn new(center: Vec2, half_width: f32, half_height: f32) -> Self {
        debug_assert!(half_width >= 0.0 && half_height >= 0.0);
        Self {
            center,
            half_width,
            half_height,
        }
    }

    /// Create a box from min/max corners.
    #[must_use]
    pub fn from_min_max(min: Vec2, max: Vec2) -> Self {
        Self {
            center: (min + max) * 0.5,
            half_width: (max.x - min.x) * 0.5,
            half_height: (max.y - min.y) * 0.5,
        }
    }

    /// Tight box of a body's shape at its current pose.
    #[must_use]
    pub fn from_body(body: &Body) -> Self {
        let right = body.support(Vec2::X).x;
        let left = body.support(-Vec2::X).x;
        let top = body.support(Vec2::Y).y;
        let bottom = body.support(-Vec2::Y).y;
        Self::from_min_max(Vec2::new(left, bottom), Vec2::new(right, top))
    }

    /// Bottom-left corner.
    #[must_use]
    pub fn min(&self) -> Vec2 {
        self.center - Vec2::new(self.half_width, self.half_height)
    }

    /// Top-right corner.
    #[must_use]
    pub fn max(&self) -> Vec2 {
        self.center + Vec2::new(self.half_width, self.half_height)
    }

    /// Perimeter, the surface-area analogue used as the tree cost metric.
    #[must_use]
    pub fn perimeter(&self) -> f32 {
        4.0 * (self.half_width + self.half_height)
    }

    /// Whether two boxes overlap (touching counts).
    #[must_use]
    pub fn overlaps(&self, other: &Self) -> bool {
        (self.center.x - other.center.x).abs() <= self.half_width + other.half_width
            && (self.center.y - other.center.y).abs() <= self.half_height + other.half_height
    }

    /// Whether `other` lies entirely inside this box.
    #[must_use]
    pub fn contains(&self, other: &Self) -> bool {
        let smin = self.min();
        let smax = self.max();
        let omin = other.min();
        let omax = other.max();
        smin.x <= omin.x && smin.y <= omin.y && smax.x >= omax.x && smax.y >= omax.y
    }

    /// Smallest box covering both inputs.
    #[must_use]
    pub fn unite(a: &Self, b: &Self) -> Self {
        let min = a.min().min(b.min());
        let max = a.max().max(b.max());
        Self::from_min_max(min, max)
    }

    /// This box grown by `margin` on every side.
    #[must_use]
    pub fn expand(&self, margin: f32) -> Self {
        Self {
            center: self.center,
            half_width: self.half_width + margin,
            half_height: self.half_height + margin,
        }
    }

    /// Slab test: does the ray from `origin` along `dir` hit this box?
    #[must_use]
    pub fn raycast(&self, origin: Vec2, dir: Vec2) -> bool {
        let min = self.min();
        let max = self.max();
        let mut t_min = 0.0f32;
        let mut t_max = f32::INFINITY;

        for axis in 0..2 {
            let (o, d, lo, hi) = if axis == 0 {
                (origin.x, dir.x, min.x, max.x)
            } else {
                (origin.y, dir.y, min.y, max.y)
            };
            if d.abs() < EPSILON {
                if o < lo || o > hi {
                    return false;
                }
            } else {
                let inv = 1.0 / d;
                let mut t1 = (lo - o) * inv;
                let mut t2 = (hi - o) * inv;
                if t1 > t2 {
                    std::mem::swap(&mut t1, &mut t2);
                }
                t_min = t_min.max(t1);
                t_max = t_max.min(t2);
                if t_min > t_max {
                    return false;
                }
            }
        }
        true
    }
}
