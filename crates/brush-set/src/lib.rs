//! Convex brush geometry for CSG level editing.
//!
//! Brushes are closed convex meshes in half-edge form. Each [`ConvexMesh`]
//! keeps a plane per polygon and an owning polygon per half-edge in step with
//! its raw data. A [`BrushSet`] pairs meshes with [`CsgOperation`] tags, can
//! be regenerated wholesale, cut by a plane, and bounded under a transform.
//!
//! ```
//! use brush_set::{BrushSet, CsgOperation, ConvexMesh, Plane3D, SurfaceDescriptor, TracingSink};
//! use nalgebra::{Affine3, Point3, Vector3};
//!
//! let cube = ConvexMesh::cuboid(
//!     Point3::new(-1.0, -1.0, -1.0),
//!     Point3::new(1.0, 1.0, 1.0),
//!     SurfaceDescriptor::default(),
//! )?;
//! let mut set = BrushSet::new();
//! set.push(cube, CsgOperation::Additive)?;
//!
//! set.cut(&Plane3D::new(Vector3::x(), 0.0), SurfaceDescriptor::with_material(1), &mut TracingSink);
//! let bounds = set.calculate_bounds(&Affine3::identity());
//! assert!(bounds.max.x.abs() < 1e-6);
//! # Ok::<(), brush_set::BrushError>(())
//! ```

mod aabb;
mod brush;
mod diagnostics;
mod error;
mod mesh;
mod params;
mod plane;
mod surface;

pub use aabb::Aabb;
pub use brush::{
    BoxGenerator, BrushGenerator, BrushSet, BrushSetId, BrushSetRegistry, CsgOperation, CutSummary,
    ExtrudedShapeGenerator, FnGenerator, GeneratedBrush, InstanceMirror, MirrorAction, MirrorSync,
    StairsGenerator,
};
pub use diagnostics::{CollectingSink, Diagnostic, DiagnosticSink, FnSink, TracingSink};
pub use error::{BrushError, BrushResult};
pub use mesh::{ConvexMesh, CutOutcome, HalfEdge, Polygon};
pub use params::BrushParams;
pub use plane::{Classification, Plane3D, PlaneSide, PLANE_EPSILON};
pub use surface::SurfaceDescriptor;
