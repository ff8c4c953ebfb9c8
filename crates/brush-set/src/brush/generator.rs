//! Brush generators.
//!
//! A generator turns a handful of parameters into complete convex meshes.
//! [`BrushSet::generate`](crate::BrushSet::generate) swaps its contents for
//! the output in one step, so a generator never sees or edits a live set.

use nalgebra::{Point2, Point3, Vector3};

use crate::{BrushError, BrushResult, ConvexMesh, CsgOperation, SurfaceDescriptor};

/// One generated mesh and the operation it should be evaluated with.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedBrush<S = SurfaceDescriptor> {
    /// Geometry of the brush; re-derived and validated by the receiving set.
    pub mesh: ConvexMesh<S>,
    /// How the brush combines with the ones before it.
    pub operation: CsgOperation,
}

impl<S> GeneratedBrush<S> {
    pub fn new(mesh: ConvexMesh<S>, operation: CsgOperation) -> Self {
        Self { mesh, operation }
    }

    pub fn additive(mesh: ConvexMesh<S>) -> Self {
        Self::new(mesh, CsgOperation::Additive)
    }
}

/// Strategy producing the full contents of a brush set.
///
/// Returning an error means nothing usable was produced; the brush set is
/// then cleared rather than partially updated.
pub trait BrushGenerator<S = SurfaceDescriptor> {
    fn generate(&self) -> BrushResult<Vec<GeneratedBrush<S>>>;
}

/// A generator that calls a closure.
pub struct FnGenerator<F> {
    func: F,
}

impl<F> FnGenerator<F> {
    /// Creates a new generator from a closure.
    pub fn new(func: F) -> Self {
        Self { func }
    }
}

impl<S, F> BrushGenerator<S> for FnGenerator<F>
where
    F: Fn() -> BrushResult<Vec<GeneratedBrush<S>>>,
{
    fn generate(&self) -> BrushResult<Vec<GeneratedBrush<S>>> {
        (self.func)()
    }
}

/// A single axis-aligned box.
#[derive(Debug, Clone, PartialEq)]
pub struct BoxGenerator<S = SurfaceDescriptor> {
    pub min: Point3<f32>,
    pub max: Point3<f32>,
    pub surface: S,
    pub operation: CsgOperation,
}

impl<S: Default> Default for BoxGenerator<S> {
    fn default() -> Self {
        Self {
            min: Point3::new(-0.5, -0.5, -0.5),
            max: Point3::new(0.5, 0.5, 0.5),
            surface: S::default(),
            operation: CsgOperation::Additive,
        }
    }
}

impl<S> BoxGenerator<S> {
    /// Checks that the box has positive extent on every axis.
    pub fn validate(&self) -> BrushResult<()> {
        let size = self.max - self.min;
        if size.iter().all(|extent| extent.is_finite() && *extent > 0.0) {
            Ok(())
        } else {
            Err(BrushError::generation(format!(
                "box extent {size:?} must be positive on every axis"
            )))
        }
    }
}

impl<S: Clone> BrushGenerator<S> for BoxGenerator<S> {
    fn generate(&self) -> BrushResult<Vec<GeneratedBrush<S>>> {
        self.validate()?;
        let mesh = ConvexMesh::cuboid(self.min, self.max, self.surface.clone())?;
        Ok(vec![GeneratedBrush::new(mesh, self.operation)])
    }
}

/// A convex 2D outline in the XY plane extruded along +Z.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtrudedShapeGenerator<S = SurfaceDescriptor> {
    /// Outline points, either winding; collinear runs are rejected.
    pub shape: Vec<Point2<f32>>,
    pub depth: f32,
    pub surface: S,
    pub operation: CsgOperation,
}

impl<S: Default> Default for ExtrudedShapeGenerator<S> {
    fn default() -> Self {
        Self {
            shape: vec![
                Point2::new(-0.5, -0.5),
                Point2::new(0.5, -0.5),
                Point2::new(0.5, 0.5),
                Point2::new(-0.5, 0.5),
            ],
            depth: 1.0,
            surface: S::default(),
            operation: CsgOperation::Additive,
        }
    }
}

impl<S> ExtrudedShapeGenerator<S> {
    /// Checks depth and outline, returning the outline in counter-clockwise order.
    pub fn validate(&self) -> BrushResult<Vec<Point2<f32>>> {
        if !(self.depth.is_finite() && self.depth > 0.0) {
            return Err(BrushError::generation(format!(
                "extrusion depth {} must be positive",
                self.depth
            )));
        }
        let count = self.shape.len();
        if count < 3 {
            return Err(BrushError::generation(format!(
                "outline needs at least 3 points, got {count}"
            )));
        }

        let turns: Vec<f32> = (0..count)
            .map(|i| {
                let a = self.shape[i];
                let b = self.shape[(i + 1) % count];
                let c = self.shape[(i + 2) % count];
                (b - a).perp(&(c - b))
            })
            .collect();

        let mut outline = self.shape.clone();
        if turns.iter().all(|turn| *turn > f32::EPSILON) {
            Ok(outline)
        } else if turns.iter().all(|turn| *turn < -f32::EPSILON) {
            outline.reverse();
            Ok(outline)
        } else {
            Err(BrushError::generation(
                "outline must be strictly convex without repeated or collinear points",
            ))
        }
    }
}

impl<S: Clone> BrushGenerator<S> for ExtrudedShapeGenerator<S> {
    fn generate(&self) -> BrushResult<Vec<GeneratedBrush<S>>> {
        let outline = self.validate()?;
        let count = outline.len();

        let vertices: Vec<Point3<f32>> = outline
            .iter()
            .map(|p| Point3::new(p.x, p.y, 0.0))
            .chain(outline.iter().map(|p| Point3::new(p.x, p.y, self.depth)))
            .collect();

        let mut loops = Vec::with_capacity(count + 2);
        // Bottom faces -Z, so it runs the outline backwards
        loops.push(((0..count).rev().collect(), self.surface.clone()));
        loops.push(((count..2 * count).collect(), self.surface.clone()));
        for i in 0..count {
            let j = (i + 1) % count;
            loops.push((vec![i, j, count + j, count + i], self.surface.clone()));
        }

        let mesh = ConvexMesh::from_polygon_loops(vertices, loops)?;
        Ok(vec![GeneratedBrush::new(mesh, self.operation)])
    }
}

/// A staircase of solid steps, one box brush per step.
///
/// Steps climb along +Y and advance along +Z; every step reaches down to
/// the floor at `y = 0`.
#[derive(Debug, Clone, PartialEq)]
pub struct StairsGenerator<S = SurfaceDescriptor> {
    pub step_count: usize,
    /// Width (x), rise (y) and run (z) of a single step.
    pub step_size: Vector3<f32>,
    pub surface: S,
}

impl<S: Default> Default for StairsGenerator<S> {
    fn default() -> Self {
        Self {
            step_count: 4,
            step_size: Vector3::new(1.0, 0.25, 0.3),
            surface: S::default(),
        }
    }
}

impl<S> StairsGenerator<S> {
    pub fn validate(&self) -> BrushResult<()> {
        if self.step_count == 0 {
            return Err(BrushError::generation("stairs need at least one step"));
        }
        if !self
            .step_size
            .iter()
            .all(|extent| extent.is_finite() && *extent > 0.0)
        {
            return Err(BrushError::generation(format!(
                "step size {:?} must be positive on every axis",
                self.step_size
            )));
        }
        Ok(())
    }
}

impl<S: Clone> BrushGenerator<S> for StairsGenerator<S> {
    fn generate(&self) -> BrushResult<Vec<GeneratedBrush<S>>> {
        self.validate()?;
        let (width, rise, run) = (self.step_size.x, self.step_size.y, self.step_size.z);

        (0..self.step_count)
            .map(|step| {
                let k = step as f32;
                let min = Point3::new(0.0, 0.0, k * run);
                let max = Point3::new(width, (k + 1.0) * rise, (k + 1.0) * run);
                ConvexMesh::cuboid(min, max, self.surface.clone()).map(GeneratedBrush::additive)
            })
            .collect()
    }
}
