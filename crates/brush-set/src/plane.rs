//! Plane representation and classification for brush geometry.

use nalgebra::{Affine3, Matrix3, Point3, Vector3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Default epsilon for plane classification.
/// Points within this distance of the plane are considered "on" the plane.
pub const PLANE_EPSILON: f32 = 1e-5;

/// Ratio of Newell normal length to squared loop radius below which a loop
/// counts as collinear.
const COLLINEAR_TOLERANCE: f32 = 1e-6;

/// Which side of a plane a point lies on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaneSide {
    /// Point is in front of the plane (positive side of normal)
    Front,
    /// Point is behind the plane (negative side of normal)
    Back,
    /// Point lies on the plane (within epsilon tolerance)
    OnPlane,
}

/// Classification of a point set (polygon loop, whole mesh) relative to a plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// No point is behind the plane, at least one is in front
    Front,
    /// No point is in front of the plane, at least one is behind
    Back,
    /// All points are on the plane (coplanar)
    Coplanar,
    /// Points are on both sides (spans the plane)
    Spanning,
}

impl Classification {
    /// Folds per-point sides into a classification.
    ///
    /// An empty set of sides is reported as `Coplanar`.
    pub fn from_sides(sides: impl IntoIterator<Item = PlaneSide>) -> Self {
        let mut front = false;
        let mut back = false;

        for side in sides {
            match side {
                PlaneSide::Front => front = true,
                PlaneSide::Back => back = true,
                PlaneSide::OnPlane => {}
            }
        }

        match (front, back) {
            (false, false) => Classification::Coplanar,
            (true, false) => Classification::Front,
            (false, true) => Classification::Back,
            (true, true) => Classification::Spanning,
        }
    }
}

/// A plane in 3D space, represented as `normal · point = offset`.
///
/// Polygon planes face outward: the normal points away from the brush interior,
/// so interior points have a negative signed distance.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Plane3D {
    normal: Vector3<f32>,
    offset: f32,
}

impl Plane3D {
    /// Creates a new plane from a normal vector and offset.
    /// The normal will be normalized automatically.
    ///
    /// # Panics
    /// Panics if the normal vector has zero length.
    pub fn new(normal: Vector3<f32>, offset: f32) -> Self {
        Self::try_new(normal, offset).expect("Plane normal cannot be zero")
    }

    /// Creates a new plane, returning `None` if the normal has zero length.
    pub fn try_new(normal: Vector3<f32>, offset: f32) -> Option<Self> {
        let norm = normal.norm();
        (norm > f32::EPSILON).then(|| Self {
            normal: normal / norm,
            offset: offset / norm,
        })
    }

    /// Creates a plane from a point and a normal, returning `None` for a zero normal.
    pub fn try_from_point_and_normal(point: Point3<f32>, normal: Vector3<f32>) -> Option<Self> {
        let norm = normal.norm();
        if norm <= f32::EPSILON {
            return None;
        }
        let unit_normal = normal / norm;
        Some(Self {
            normal: unit_normal,
            offset: unit_normal.dot(&point.coords),
        })
    }

    /// Fits a plane through a closed polygon loop using Newell's method.
    ///
    /// The normal follows the loop's winding (counter-clockwise when viewed
    /// from the front) and the plane passes through the loop's centroid.
    /// Returns `None` when fewer than 3 points are given or the loop is
    /// collinear relative to its own size, so tiny but well-shaped faces
    /// still get a plane.
    pub fn try_from_polygon(points: &[Point3<f32>]) -> Option<Self> {
        if points.len() < 3 {
            return None;
        }

        let mut normal: Vector3<f32> = Vector3::zeros();
        let mut centroid = Vector3::zeros();
        for (i, current) in points.iter().enumerate() {
            let next = points[(i + 1) % points.len()];
            normal.x += (current.y - next.y) * (current.z + next.z);
            normal.y += (current.z - next.z) * (current.x + next.x);
            normal.z += (current.x - next.x) * (current.y + next.y);
            centroid += current.coords;
        }
        centroid /= points.len() as f32;

        // The Newell normal is twice the loop area, so compare it against the
        // loop's own size rather than an absolute threshold.
        let radius_squared = points
            .iter()
            .map(|p| (p.coords - centroid).norm_squared())
            .fold(0.0, f32::max);
        let length = normal.norm();
        if !(length > COLLINEAR_TOLERANCE * radius_squared) {
            return None;
        }

        let unit_normal = normal / length;
        Some(Self {
            normal: unit_normal,
            offset: unit_normal.dot(&centroid),
        })
    }

    /// Returns the unit normal vector of the plane.
    #[inline]
    pub fn normal(&self) -> Vector3<f32> {
        self.normal
    }

    /// Returns the signed distance from the origin to the plane along the normal.
    #[inline]
    pub fn offset(&self) -> f32 {
        self.offset
    }

    /// Computes the signed distance from a point to the plane.
    /// - Positive: point is in front (same side as normal)
    /// - Negative: point is behind (opposite side from normal)
    /// - Zero: point is on the plane
    #[inline]
    pub fn signed_distance(&self, point: Point3<f32>) -> f32 {
        self.normal.dot(&point.coords) - self.offset
    }

    /// Classifies which side of the plane a point lies on, with a custom epsilon.
    pub fn classify_point_with_epsilon(&self, point: Point3<f32>, epsilon: f32) -> PlaneSide {
        let dist = self.signed_distance(point);
        if dist > epsilon {
            PlaneSide::Front
        } else if dist < -epsilon {
            PlaneSide::Back
        } else {
            PlaneSide::OnPlane
        }
    }

    /// Classifies a set of points against the plane with a custom epsilon.
    pub fn classify_points<'a>(
        &self,
        points: impl IntoIterator<Item = &'a Point3<f32>>,
        epsilon: f32,
    ) -> Classification {
        Classification::from_sides(
            points
                .into_iter()
                .map(|p| self.classify_point_with_epsilon(*p, epsilon)),
        )
    }

    /// Maps the plane through an affine transform.
    ///
    /// Normals go through the inverse transpose of the linear part, so
    /// non-uniform scales keep them perpendicular. Returns `None` for a
    /// singular transform.
    pub fn transformed(&self, transform: &Affine3<f32>) -> Option<Self> {
        let linear: Matrix3<f32> = transform.matrix().fixed_view::<3, 3>(0, 0).into_owned();
        let normal = linear.try_inverse()?.transpose() * self.normal;
        let point = transform.transform_point(&Point3::from(self.normal * self.offset));
        Self::try_from_point_and_normal(point, normal)
    }

    /// Computes the intersection of a line segment with the plane.
    ///
    /// Returns `Some((t, point))` where:
    /// - `t` is the interpolation parameter (0.0 = start, 1.0 = end)
    /// - `point` is the intersection point
    ///
    /// Returns `None` if the segment is parallel to the plane or doesn't intersect.
    pub fn intersect_segment(
        &self,
        start: Point3<f32>,
        end: Point3<f32>,
    ) -> Option<(f32, Point3<f32>)> {
        let direction = end - start;
        let denom = self.normal.dot(&direction);

        // Segment is parallel to plane
        if denom.abs() < f32::EPSILON {
            return None;
        }

        let t = (self.offset - self.normal.dot(&start.coords)) / denom;

        if !(0.0..=1.0).contains(&t) {
            return None;
        }

        let point = start + direction * t;
        Some((t, point))
    }
}
