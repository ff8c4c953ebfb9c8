//! Default per-polygon surface payload.

use nalgebra::Vector2;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Material and texturing data attached to a brush polygon.
///
/// Brush geometry never interprets this; it is stored on polygons and copied
/// onto capping polygons created by a cut. Any `Clone` type can stand in for
/// it through the `S` parameter of [`ConvexMesh`](crate::ConvexMesh).
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SurfaceDescriptor {
    pub material: u32,
    pub smoothing_group: u32,
    pub uv_offset: Vector2<f32>,
    pub uv_scale: Vector2<f32>,
    pub uv_rotation: f32,
}

impl SurfaceDescriptor {
    /// A descriptor using `material` with identity UV mapping.
    pub fn with_material(material: u32) -> Self {
        Self {
            material,
            ..Default::default()
        }
    }
}

impl Default for SurfaceDescriptor {
    fn default() -> Self {
        Self {
            material: 0,
            smoothing_group: 0,
            uv_offset: Vector2::zeros(),
            uv_scale: Vector2::new(1.0, 1.0),
            uv_rotation: 0.0,
        }
    }
}
