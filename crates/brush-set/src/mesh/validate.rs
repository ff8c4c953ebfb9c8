//! Structural validation of convex meshes.

use tracing::debug;

use super::ConvexMesh;
use crate::{BrushError, BrushResult, DiagnosticSink};

impl<S> ConvexMesh<S> {
    /// Checks the structural invariants and returns the first violation.
    ///
    /// - the mesh has vertices and polygons
    /// - every polygon has at least 3 edges and a valid derived plane
    /// - every half-edge belongs to exactly one polygon
    /// - vertex and twin indices are in range, twins are mutual and run the
    ///   opposite direction
    pub fn check_topology(&self) -> BrushResult<()> {
        if self.vertices.is_empty() {
            return Err(BrushError::topology("mesh has no vertices"));
        }
        if self.polygons.is_empty() {
            return Err(BrushError::topology("mesh has no polygons"));
        }

        let edge_total = self.half_edges.len();
        let mut owner = vec![None; edge_total];
        for (index, polygon) in self.polygons.iter().enumerate() {
            if polygon.edge_count < 3 {
                return Err(BrushError::DegeneratePolygon { polygon: index });
            }
            let edges = polygon.edges();
            if edges.end > edge_total {
                return Err(BrushError::topology(format!(
                    "polygon {index} references half-edges {}..{} beyond {edge_total}",
                    edges.start, edges.end
                )));
            }
            for edge in edges {
                if owner[edge].replace(index).is_some() {
                    return Err(BrushError::topology(format!(
                        "half-edge {edge} belongs to more than one polygon"
                    )));
                }
            }
        }

        for (index, half_edge) in self.half_edges.iter().enumerate() {
            let Some(polygon) = owner[index] else {
                return Err(BrushError::topology(format!(
                    "half-edge {index} belongs to no polygon"
                )));
            };
            if half_edge.vertex >= self.vertices.len() {
                return Err(BrushError::topology(format!(
                    "half-edge {index} starts at missing vertex {}",
                    half_edge.vertex
                )));
            }
            let twin = half_edge.twin;
            if twin >= edge_total {
                return Err(BrushError::topology(format!(
                    "half-edge {index} has missing twin {twin}"
                )));
            }
            if twin == index {
                return Err(BrushError::topology(format!(
                    "half-edge {index} is its own twin"
                )));
            }
            if self.half_edges[twin].twin != index {
                return Err(BrushError::topology(format!(
                    "half-edge {index} and {twin} are not mutual twins"
                )));
            }
            let next = self.polygons[polygon].next_edge(index);
            if self.half_edges[twin].vertex != self.half_edges[next].vertex {
                return Err(BrushError::topology(format!(
                    "twin {twin} of half-edge {index} does not run the opposite direction"
                )));
            }
        }

        if self.planes.len() != self.polygons.len() {
            return Err(BrushError::topology(format!(
                "{} derived planes for {} polygons",
                self.planes.len(),
                self.polygons.len()
            )));
        }
        if let Some(polygon) = self.planes.iter().position(Option::is_none) {
            return Err(BrushError::DegeneratePolygon { polygon });
        }

        Ok(())
    }

    /// Returns whether the mesh passes [`ConvexMesh::check_topology`].
    ///
    /// With `strict` set, a failure is reported to `sink` under `mesh_index`.
    /// Nothing is modified; callers clear or drop a mesh that fails.
    pub fn validate<D>(&self, mesh_index: usize, strict: bool, sink: &mut D) -> bool
    where
        D: DiagnosticSink + ?Sized,
    {
        match self.check_topology() {
            Ok(()) => true,
            Err(err) => {
                debug!(mesh = mesh_index, %err, "mesh failed validation");
                if strict {
                    sink.report_error(mesh_index, &err.to_string());
                }
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use nalgebra::Point3;

    use super::*;
    use crate::mesh::tests::make_cube;
    use crate::mesh::{HalfEdge, Polygon};
    use crate::CollectingSink;

    #[test]
    fn cube_passes() {
        let cube = make_cube(1.0);
        assert_eq!(cube.check_topology(), Ok(()));

        let mut sink = CollectingSink::new();
        assert!(cube.validate(0, true, &mut sink));
        assert!(sink.is_empty());
    }

    #[test]
    fn empty_mesh_fails() {
        let mesh: ConvexMesh = ConvexMesh::new();
        assert!(matches!(
            mesh.check_topology(),
            Err(BrushError::InvalidTopology { .. })
        ));
    }

    #[test]
    fn broken_twin_is_reported_when_strict() {
        let cube = make_cube(1.0);
        let mut half_edges = cube.half_edges().to_vec();
        half_edges[0].twin = 1;
        let broken =
            ConvexMesh::from_parts(cube.vertices().to_vec(), half_edges, cube.polygons().to_vec());

        let mut sink = CollectingSink::new();
        assert!(!broken.validate(4, true, &mut sink));
        let reports = sink.into_diagnostics();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].mesh_index, 4);
        assert!(reports[0].message.contains("half-edge"));
    }

    #[test]
    fn lenient_validation_stays_silent() {
        let cube = make_cube(1.0);
        let mut half_edges = cube.half_edges().to_vec();
        half_edges[3].vertex = 100;
        let broken =
            ConvexMesh::from_parts(cube.vertices().to_vec(), half_edges, cube.polygons().to_vec());

        let mut sink = CollectingSink::new();
        assert!(!broken.validate(0, false, &mut sink));
        assert!(sink.is_empty());
    }

    #[test]
    fn two_edge_polygon_fails() {
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
        ];
        let half_edges = vec![
            HalfEdge { vertex: 0, twin: 1 },
            HalfEdge { vertex: 1, twin: 0 },
        ];
        let polygons = vec![Polygon {
            first_edge: 0,
            edge_count: 2,
            surface: (),
        }];
        let mesh = ConvexMesh::from_parts(vertices, half_edges, polygons);

        assert_eq!(
            mesh.check_topology(),
            Err(BrushError::DegeneratePolygon { polygon: 0 })
        );
        assert_eq!(mesh.planes(), &[None]);
    }

    #[test]
    fn uncovered_half_edge_fails() {
        let cube = make_cube(1.0);
        let mut half_edges = cube.half_edges().to_vec();
        half_edges.push(HalfEdge { vertex: 0, twin: 0 });
        let mesh =
            ConvexMesh::from_parts(cube.vertices().to_vec(), half_edges, cube.polygons().to_vec());

        let err = mesh.check_topology().unwrap_err();
        assert!(err.to_string().contains("belongs to no polygon"));
    }
}
