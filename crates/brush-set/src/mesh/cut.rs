//! Cutting convex meshes by a plane.

use std::collections::HashMap;

use nalgebra::{Point3, Vector3};

use super::ConvexMesh;
use crate::{BrushError, BrushResult, Classification, Plane3D, PlaneSide, PLANE_EPSILON};

/// Result of a successful cut on a single mesh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CutOutcome {
    /// The mesh lies entirely on the kept side of the plane.
    Unchanged,
    /// The mesh straddled the plane and now ends at a capping polygon.
    Split,
}

impl<S: Clone> ConvexMesh<S> {
    /// Cuts the mesh by a plane, keeping the part behind it.
    ///
    /// The kept side is `signed_distance <= epsilon`, so the plane normal points
    /// into the discarded half-space and becomes the outward normal of the
    /// capping polygon.
    ///
    /// # Return values by classification
    ///
    /// - **Back / Coplanar**: `Ok(Unchanged)`, the mesh is untouched
    /// - **Spanning**: `Ok(Split)`, the mesh is replaced by its kept part plus a
    ///   capping polygon carrying `surface`
    /// - **Front**: `Err(EmptyAfterCut)`, the mesh is cleared
    ///
    /// Any other error means the clipped geometry could not be rebuilt
    /// consistently; the mesh is left untouched in that case.
    pub fn cut(&mut self, plane: &Plane3D, surface: S) -> BrushResult<CutOutcome> {
        self.cut_with_epsilon(plane, surface, PLANE_EPSILON)
    }

    /// [`ConvexMesh::cut`] with a custom on-plane tolerance.
    pub fn cut_with_epsilon(
        &mut self,
        plane: &Plane3D,
        surface: S,
        epsilon: f32,
    ) -> BrushResult<CutOutcome> {
        if self.is_empty() {
            return Err(BrushError::EmptyAfterCut);
        }
        self.check_topology()?;

        match plane.classify_points(&self.vertices, epsilon) {
            Classification::Back | Classification::Coplanar => Ok(CutOutcome::Unchanged),
            Classification::Front => {
                self.clear();
                Err(BrushError::EmptyAfterCut)
            }
            Classification::Spanning => {
                let sides: Vec<PlaneSide> = self
                    .vertices
                    .iter()
                    .map(|v| plane.classify_point_with_epsilon(*v, epsilon))
                    .collect();
                *self = self.split_kept_side(plane, &sides, surface)?;
                Ok(CutOutcome::Split)
            }
        }
    }

    /// Clips every polygon against the plane and closes the section with a cap.
    ///
    /// Walks each polygon loop like Sutherland-Hodgman, keeping back and
    /// on-plane vertices and inserting one shared intersection vertex per
    /// crossing edge, so neighbouring polygons agree on the new vertices.
    fn split_kept_side(
        &self,
        plane: &Plane3D,
        sides: &[PlaneSide],
        surface: S,
    ) -> BrushResult<Self> {
        let mut section = SectionBuilder::new(&self.vertices, plane, sides);
        let mut loops: Vec<(Vec<usize>, S)> = Vec::with_capacity(self.polygons.len() + 1);

        for (index, polygon) in self.polygons.iter().enumerate() {
            let ring: Vec<usize> = self.polygon_vertex_indices(index).collect();
            let mut kept = Vec::with_capacity(ring.len() + 1);

            for (i, &current) in ring.iter().enumerate() {
                let next = ring[(i + 1) % ring.len()];

                if sides[current] != PlaneSide::Front {
                    kept.push(section.keep(current));
                }

                let crosses = matches!(
                    (sides[current], sides[next]),
                    (PlaneSide::Front, PlaneSide::Back) | (PlaneSide::Back, PlaneSide::Front)
                );
                if crosses {
                    kept.push(section.crossing(current, next)?);
                }
            }

            kept.dedup();
            if kept.len() > 1 && kept.first() == kept.last() {
                kept.pop();
            }

            // Polygons reduced to an on-plane edge or point vanish
            if kept.len() >= 3 {
                loops.push((kept, polygon.surface.clone()));
            }
        }

        let cap = section.cap_loop(&loops)?;
        loops.push((cap, surface));

        let (vertices, loops) = section.compact(loops);
        Self::from_polygon_loops(vertices, loops)
    }
}

/// Accumulates the vertices of a cut mesh.
struct SectionBuilder<'a> {
    source: &'a [Point3<f32>],
    plane: &'a Plane3D,
    sides: &'a [PlaneSide],
    vertices: Vec<Point3<f32>>,
    kept: Vec<Option<usize>>,
    crossings: HashMap<(usize, usize), usize>,
    on_plane: Vec<usize>,
}

impl<'a> SectionBuilder<'a> {
    fn new(source: &'a [Point3<f32>], plane: &'a Plane3D, sides: &'a [PlaneSide]) -> Self {
        Self {
            source,
            plane,
            sides,
            vertices: Vec::with_capacity(source.len()),
            kept: vec![None; source.len()],
            crossings: HashMap::new(),
            on_plane: Vec::new(),
        }
    }

    /// New index of a kept original vertex.
    fn keep(&mut self, original: usize) -> usize {
        if let Some(index) = self.kept[original] {
            return index;
        }
        let index = self.vertices.len();
        self.vertices.push(self.source[original]);
        self.kept[original] = Some(index);
        if self.sides[original] == PlaneSide::OnPlane {
            self.on_plane.push(index);
        }
        index
    }

    /// New index of the intersection vertex on edge `a`-`b`, shared by both directions.
    fn crossing(&mut self, a: usize, b: usize) -> BrushResult<usize> {
        let key = (a.min(b), a.max(b));
        if let Some(&index) = self.crossings.get(&key) {
            return Ok(index);
        }

        let (_, point) = self
            .plane
            .intersect_segment(self.source[key.0], self.source[key.1])
            .ok_or_else(|| {
                BrushError::topology(format!("edge {} - {} does not cross the plane", key.0, key.1))
            })?;

        let index = self.vertices.len();
        self.vertices.push(point);
        self.crossings.insert(key, index);
        self.on_plane.push(index);
        Ok(index)
    }

    /// Orders the on-plane vertices used by kept polygons into the capping loop.
    ///
    /// The section of a convex mesh is convex, so sorting by angle around its
    /// centroid gives the boundary order. Counter-clockwise about the plane
    /// normal makes the cap face out of the kept part.
    fn cap_loop<S>(&self, loops: &[(Vec<usize>, S)]) -> BrushResult<Vec<usize>> {
        let mut used = vec![false; self.vertices.len()];
        for (ring, _) in loops {
            for &vertex in ring {
                used[vertex] = true;
            }
        }

        let mut cap: Vec<usize> = self
            .on_plane
            .iter()
            .copied()
            .filter(|&vertex| used[vertex])
            .collect();
        if cap.len() < 3 {
            return Err(BrushError::DegeneratePolygon {
                polygon: loops.len(),
            });
        }

        let normal = self.plane.normal();
        let reference = if normal.x.abs() < 0.9 {
            Vector3::x()
        } else {
            Vector3::y()
        };
        let u = normal.cross(&reference).normalize();
        let v = normal.cross(&u);

        let centroid: Vector3<f32> =
            cap.iter().map(|&i| self.vertices[i].coords).sum::<Vector3<f32>>() / cap.len() as f32;
        let angle = |vertex: usize| {
            let offset = self.vertices[vertex].coords - centroid;
            offset.dot(&v).atan2(offset.dot(&u))
        };
        cap.sort_by(|&a, &b| angle(a).total_cmp(&angle(b)));

        Ok(cap)
    }

    /// Drops vertices no polygon references and renumbers the loops.
    fn compact<S>(self, loops: Vec<(Vec<usize>, S)>) -> (Vec<Point3<f32>>, Vec<(Vec<usize>, S)>) {
        let mut remap = vec![None; self.vertices.len()];
        let mut vertices = Vec::with_capacity(self.vertices.len());
        for (ring, _) in &loops {
            for &vertex in ring {
                if remap[vertex].is_none() {
                    remap[vertex] = Some(vertices.len());
                    vertices.push(self.vertices[vertex]);
                }
            }
        }

        let loops = loops
            .into_iter()
            .map(|(ring, surface)| {
                let ring = ring
                    .into_iter()
                    .filter_map(|vertex| remap[vertex])
                    .collect();
                (ring, surface)
            })
            .collect();
        (vertices, loops)
    }
}
