//! Brush sets: ordered convex meshes paired with CSG operation tags.
//!
//! A [`BrushSet`] is the aggregate an editor entity owns. It is replaced
//! wholesale by a [`BrushGenerator`], cut in place by planes, and signals
//! content changes that a [`MirrorSync`] turns into create/update/destroy
//! calls on an external [`InstanceMirror`].
//!
//! # Architecture
//!
//! - [`BrushSet`]: meshes + operations, kept index-aligned
//! - [`BrushGenerator`]: strategy trait producing a fresh set of brushes
//! - [`MirrorSync`]: drives an [`InstanceMirror`] from the dirty flag
//! - [`BrushSetRegistry`]: explicit owning collection with lifecycle hooks

mod generator;
mod mirror;
mod operation;
mod registry;
mod set;

pub use generator::{
    BoxGenerator, BrushGenerator, ExtrudedShapeGenerator, FnGenerator, GeneratedBrush,
    StairsGenerator,
};
pub use mirror::{InstanceMirror, MirrorAction, MirrorSync};
pub use operation::CsgOperation;
pub use registry::{BrushSetId, BrushSetRegistry};
pub use set::{BrushSet, CutSummary};
