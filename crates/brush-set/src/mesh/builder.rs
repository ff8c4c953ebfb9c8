//! Construction of half-edge meshes from plain vertex loops.

use std::collections::HashMap;

use nalgebra::Point3;

use super::{ConvexMesh, HalfEdge, Polygon};
use crate::{BrushError, BrushResult};

/// Placeholder twin before edges are matched.
const UNMATCHED: usize = usize::MAX;

impl<S> ConvexMesh<S> {
    /// Builds a closed half-edge mesh from polygon vertex loops.
    ///
    /// Each loop lists vertex indices counter-clockwise seen from outside.
    /// Twins are matched by reversed directed edges, so every edge `a -> b`
    /// must appear exactly once and its reverse `b -> a` exactly once.
    /// Planes and half-edge indices are derived before returning.
    pub fn from_polygon_loops(
        vertices: Vec<Point3<f32>>,
        loops: Vec<(Vec<usize>, S)>,
    ) -> BrushResult<Self> {
        let edge_total = loops.iter().map(|(ring, _)| ring.len()).sum();
        let mut half_edges = Vec::with_capacity(edge_total);
        let mut polygons = Vec::with_capacity(loops.len());
        let mut directed: HashMap<(usize, usize), usize> = HashMap::with_capacity(edge_total);

        for (polygon, (ring, surface)) in loops.into_iter().enumerate() {
            if ring.len() < 3 {
                return Err(BrushError::DegeneratePolygon { polygon });
            }

            let first_edge = half_edges.len();
            for (i, &from) in ring.iter().enumerate() {
                let to = ring[(i + 1) % ring.len()];
                if from >= vertices.len() || to >= vertices.len() {
                    return Err(BrushError::topology(format!(
                        "polygon {polygon} references vertex beyond {}",
                        vertices.len()
                    )));
                }
                if from == to {
                    return Err(BrushError::DegeneratePolygon { polygon });
                }

                let edge = half_edges.len();
                if directed.insert((from, to), edge).is_some() {
                    return Err(BrushError::topology(format!(
                        "directed edge {from} -> {to} is used by more than one polygon"
                    )));
                }
                half_edges.push(HalfEdge {
                    vertex: from,
                    twin: UNMATCHED,
                });
            }

            polygons.push(Polygon {
                first_edge,
                edge_count: ring.len(),
                surface,
            });
        }

        for polygon in &polygons {
            for edge in polygon.edges() {
                let from = half_edges[edge].vertex;
                let to = half_edges[polygon.next_edge(edge)].vertex;
                let twin = directed.get(&(to, from)).copied().ok_or_else(|| {
                    BrushError::topology(format!("edge {from} -> {to} has no twin"))
                })?;
                half_edges[edge].twin = twin;
            }
        }

        let mut mesh = Self {
            vertices,
            half_edges,
            polygons,
            planes: Vec::new(),
            half_edge_polygon_indices: Vec::new(),
        };
        mesh.update_derived()?;
        Ok(mesh)
    }
}
