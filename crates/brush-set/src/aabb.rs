//! Axis-aligned bounding box.

use nalgebra::{Point3, Vector3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// An axis-aligned bounding box (AABB).
///
/// [`Aabb::empty`] uses infinite sentinels so that expanding it by any point
/// yields that point. Such a box must not leak to callers; use
/// [`Aabb::degenerate`] as the canonical "nothing here" value instead.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Aabb {
    /// Minimum corner (smallest x, y, z values).
    pub min: Point3<f32>,
    /// Maximum corner (largest x, y, z values).
    pub max: Point3<f32>,
}

impl Aabb {
    /// Creates an AABB from two corners, sorting each axis.
    pub fn new(a: Point3<f32>, b: Point3<f32>) -> Self {
        Self {
            min: Point3::new(a.x.min(b.x), a.y.min(b.y), a.z.min(b.z)),
            max: Point3::new(a.x.max(b.x), a.y.max(b.y), a.z.max(b.z)),
        }
    }

    /// Creates an AABB containing a single point.
    #[inline]
    pub fn from_point(point: Point3<f32>) -> Self {
        Self {
            min: point,
            max: point,
        }
    }

    /// An inverted box (min = +inf, max = -inf), the identity for expansion.
    pub fn empty() -> Self {
        Self {
            min: Point3::new(f32::INFINITY, f32::INFINITY, f32::INFINITY),
            max: Point3::new(f32::NEG_INFINITY, f32::NEG_INFINITY, f32::NEG_INFINITY),
        }
    }

    /// The zero-volume box at the origin, returned for geometry with no vertices.
    pub fn degenerate() -> Self {
        Self::from_point(Point3::origin())
    }

    /// Creates the tightest AABB around the given points.
    ///
    /// Returns [`Aabb::empty`] if the iterator is empty.
    pub fn from_points(points: impl IntoIterator<Item = Point3<f32>>) -> Self {
        let mut aabb = Self::empty();
        for point in points {
            aabb.expand_to_include(&point);
        }
        aabb
    }

    /// Returns true if min > max on any axis.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z
    }

    /// Grows the box to contain `point`.
    pub fn expand_to_include(&mut self, point: &Point3<f32>) {
        self.min = self.min.inf(point);
        self.max = self.max.sup(point);
    }

    /// Returns the smallest box containing both boxes.
    pub fn union(&self, other: &Aabb) -> Aabb {
        Aabb {
            min: self.min.inf(&other.min),
            max: self.max.sup(&other.max),
        }
    }

    /// Width, height and depth. Zero for an empty box.
    pub fn size(&self) -> Vector3<f32> {
        if self.is_empty() {
            Vector3::zeros()
        } else {
            self.max - self.min
        }
    }

    /// Center point of the box.
    pub fn center(&self) -> Point3<f32> {
        nalgebra::center(&self.min, &self.max)
    }

    /// Returns true if `point` lies inside or on the boundary.
    pub fn contains(&self, point: &Point3<f32>) -> bool {
        point.x >= self.min.x
            && point.x <= self.max.x
            && point.y >= self.min.y
            && point.y <= self.max.y
            && point.z >= self.min.z
            && point.z <= self.max.z
    }
}
