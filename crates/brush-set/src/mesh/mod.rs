//! Convex brush meshes stored as half-edge polygon loops.
//!
//! A [`ConvexMesh`] owns its raw data (vertices, half-edges, polygons) and two
//! derived tables that are recomputed from it, never edited by hand:
//!
//! - one [`Plane3D`] per polygon (`None` when the polygon is degenerate)
//! - the owning polygon of every half-edge
//!
//! # Layout
//!
//! Half-edges of a polygon are stored contiguously, starting at
//! `first_edge`. The successor of a half-edge is the next one in that range,
//! wrapping back to `first_edge`. Each half-edge records its origin vertex and
//! the index of its twin on the neighbouring polygon, which runs the opposite
//! direction. Loops wind counter-clockwise seen from outside the brush.

mod builder;
mod cut;
mod validate;

pub use cut::CutOutcome;

use nalgebra::{Affine3, Point3};
use tracing::debug;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{Aabb, BrushError, BrushResult, Plane3D, SurfaceDescriptor};

/// One directed traversal of a polygon edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct HalfEdge {
    /// Vertex this half-edge starts at.
    pub vertex: usize,
    /// Opposite half-edge on the adjacent polygon.
    pub twin: usize,
}

/// A polygon record: a contiguous run of half-edges plus its surface payload.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Polygon<S = SurfaceDescriptor> {
    /// Index of the first half-edge of the loop.
    pub first_edge: usize,
    /// Number of half-edges, and so of vertices, in the loop.
    pub edge_count: usize,
    /// Payload carried along unchanged, copied by cuts.
    pub surface: S,
}

impl<S> Polygon<S> {
    /// Range of half-edge indices forming this polygon's loop.
    #[inline]
    pub fn edges(&self) -> std::ops::Range<usize> {
        self.first_edge..self.first_edge.saturating_add(self.edge_count)
    }

    /// Successor of `edge` within this polygon's loop.
    #[inline]
    pub(crate) fn next_edge(&self, edge: usize) -> usize {
        if edge + 1 >= self.edges().end {
            self.first_edge
        } else {
            edge + 1
        }
    }
}

/// A single convex polyhedron.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ConvexMesh<S = SurfaceDescriptor> {
    vertices: Vec<Point3<f32>>,
    half_edges: Vec<HalfEdge>,
    polygons: Vec<Polygon<S>>,
    planes: Vec<Option<Plane3D>>,
    half_edge_polygon_indices: Vec<Option<usize>>,
}

impl<S> Default for ConvexMesh<S> {
    fn default() -> Self {
        Self {
            vertices: Vec::new(),
            half_edges: Vec::new(),
            polygons: Vec::new(),
            planes: Vec::new(),
            half_edge_polygon_indices: Vec::new(),
        }
    }
}

impl<S> ConvexMesh<S> {
    /// Creates an empty mesh.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a mesh from raw data and derives planes and half-edge indices.
    ///
    /// No structural checks are made here and nothing is returned for
    /// degenerate polygons: the `None` entries in [`ConvexMesh::planes`] are
    /// the only signal. Call [`ConvexMesh::update_derived`] for the error, or
    /// [`ConvexMesh::check_topology`] for a full check.
    pub fn from_parts(
        vertices: Vec<Point3<f32>>,
        half_edges: Vec<HalfEdge>,
        polygons: Vec<Polygon<S>>,
    ) -> Self {
        let mut mesh = Self {
            vertices,
            half_edges,
            polygons,
            planes: Vec::new(),
            half_edge_polygon_indices: Vec::new(),
        };
        if let Err(err) = mesh.update_derived() {
            debug!(%err, "raw mesh has degenerate polygons");
        }
        mesh
    }

    #[inline]
    pub fn vertices(&self) -> &[Point3<f32>] {
        &self.vertices
    }

    #[inline]
    pub fn half_edges(&self) -> &[HalfEdge] {
        &self.half_edges
    }

    #[inline]
    pub fn polygons(&self) -> &[Polygon<S>] {
        &self.polygons
    }

    /// Derived plane per polygon; `None` marks a degenerate polygon.
    #[inline]
    pub fn planes(&self) -> &[Option<Plane3D>] {
        &self.planes
    }

    /// Derived owning polygon per half-edge.
    #[inline]
    pub fn half_edge_polygon_indices(&self) -> &[Option<usize>] {
        &self.half_edge_polygon_indices
    }

    /// Returns the number of polygons.
    #[inline]
    pub fn len(&self) -> usize {
        self.polygons.len()
    }

    /// A mesh without polygons is empty and counts as absent.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.polygons.is_empty()
    }

    /// Resets the mesh to the empty state. Calling it again has no effect.
    pub fn clear(&mut self) {
        self.vertices.clear();
        self.half_edges.clear();
        self.polygons.clear();
        self.planes.clear();
        self.half_edge_polygon_indices.clear();
    }

    /// Polygon owning a half-edge, from the derived index table.
    pub fn polygon_of_half_edge(&self, edge: usize) -> Option<usize> {
        self.half_edge_polygon_indices.get(edge).copied().flatten()
    }

    /// Successor of a half-edge around its polygon.
    pub fn next_half_edge(&self, edge: usize) -> Option<usize> {
        let polygon = self.polygons.get(self.polygon_of_half_edge(edge)?)?;
        Some(polygon.next_edge(edge))
    }

    /// Vertex indices around a polygon, in winding order.
    ///
    /// Yields nothing for an out-of-range polygon or half-edge range.
    pub fn polygon_vertex_indices(&self, polygon: usize) -> impl Iterator<Item = usize> + '_ {
        self.polygon_edges(polygon).iter().map(|edge| edge.vertex)
    }

    /// Vertex positions around a polygon, skipping dangling vertex indices.
    pub fn polygon_vertices(&self, polygon: usize) -> impl Iterator<Item = Point3<f32>> + '_ {
        self.polygon_vertex_indices(polygon)
            .filter_map(|vertex| self.vertices.get(vertex).copied())
    }

    fn polygon_edges(&self, polygon: usize) -> &[HalfEdge] {
        self.polygons
            .get(polygon)
            .and_then(|p| self.half_edges.get(p.edges()))
            .unwrap_or(&[])
    }

    /// Mutable access to a polygon's surface payload.
    ///
    /// Surfaces do not feed any derived data, so editing them is always safe.
    pub fn surface_mut(&mut self, polygon: usize) -> Option<&mut S> {
        self.polygons.get_mut(polygon).map(|p| &mut p.surface)
    }

    /// Edits vertex positions in place and re-derives planes and indices.
    pub fn edit_vertices<F>(&mut self, edit: F) -> BrushResult<()>
    where
        F: FnOnce(&mut [Point3<f32>]),
    {
        edit(&mut self.vertices);
        self.update_derived()
    }

    /// Recomputes planes, then immediately the half-edge polygon indices.
    pub fn update_derived(&mut self) -> BrushResult<()> {
        let planes = self.recompute_planes();
        self.recompute_half_edge_polygon_indices();
        planes
    }

    /// Derives one outward plane per polygon from its vertex loop.
    ///
    /// Every polygon is processed. Polygons with fewer than 3 non-collinear
    /// vertices get a `None` plane and the first of them is reported.
    pub fn recompute_planes(&mut self) -> BrushResult<()> {
        let mut first_degenerate = None;
        let mut loop_points = Vec::new();
        let planes: Vec<Option<Plane3D>> = (0..self.polygons.len())
            .map(|polygon| {
                loop_points.clear();
                loop_points.extend(self.polygon_vertices(polygon));
                let plane = Plane3D::try_from_polygon(&loop_points);
                if plane.is_none() && first_degenerate.is_none() {
                    first_degenerate = Some(polygon);
                }
                plane
            })
            .collect();
        self.planes = planes;

        match first_degenerate {
            Some(polygon) => Err(BrushError::DegeneratePolygon { polygon }),
            None => Ok(()),
        }
    }

    /// Rebuilds the half-edge to polygon map.
    ///
    /// Half-edges not covered by any polygon are left as `None`.
    pub fn recompute_half_edge_polygon_indices(&mut self) {
        let mut indices = vec![None; self.half_edges.len()];
        for (index, polygon) in self.polygons.iter().enumerate() {
            for edge in polygon.edges() {
                if let Some(slot) = indices.get_mut(edge) {
                    *slot = Some(index);
                }
            }
        }
        self.half_edge_polygon_indices = indices;
    }

    /// Tightest box around all vertices after applying `transform`.
    ///
    /// Returns [`Aabb::empty`] for a mesh without vertices.
    pub fn bounds(&self, transform: &Affine3<f32>) -> Aabb {
        Aabb::from_points(self.vertices.iter().map(|v| transform.transform_point(v)))
    }
}

impl<S: Clone> ConvexMesh<S> {
    /// Creates an axis-aligned box spanning `min`..`max`, every face using `surface`.
    pub fn cuboid(min: Point3<f32>, max: Point3<f32>, surface: S) -> BrushResult<Self> {
        let (min, max) = (min.inf(&max), min.sup(&max));
        let corners = vec![
            Point3::new(min.x, min.y, min.z), // 0: left-bottom-back
            Point3::new(max.x, min.y, min.z), // 1: right-bottom-back
            Point3::new(max.x, max.y, min.z), // 2: right-top-back
            Point3::new(min.x, max.y, min.z), // 3: left-top-back
            Point3::new(min.x, min.y, max.z), // 4: left-bottom-front
            Point3::new(max.x, min.y, max.z), // 5: right-bottom-front
            Point3::new(max.x, max.y, max.z), // 6: right-top-front
            Point3::new(min.x, max.y, max.z), // 7: left-top-front
        ];

        // Counter-clockwise viewed from outside
        let faces: [[usize; 4]; 6] = [
            [4, 5, 6, 7], // front (+Z)
            [1, 0, 3, 2], // back (-Z)
            [0, 4, 7, 3], // left (-X)
            [5, 1, 2, 6], // right (+X)
            [7, 6, 2, 3], // top (+Y)
            [0, 1, 5, 4], // bottom (-Y)
        ];

        let loops = faces
            .iter()
            .map(|face| (face.to_vec(), surface.clone()))
            .collect();
        Self::from_polygon_loops(corners, loops)
    }
}
