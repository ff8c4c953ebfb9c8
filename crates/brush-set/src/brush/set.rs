//! Brush set container, regeneration and cutting.

use nalgebra::Affine3;
use tracing::{debug, trace, warn};

use super::generator::BrushGenerator;
use super::operation::CsgOperation;
use crate::{
    Aabb, BrushError, BrushParams, BrushResult, ConvexMesh, CutOutcome, DiagnosticSink, Plane3D,
    SurfaceDescriptor, TracingSink,
};

/// An ordered set of convex brushes with their CSG operations.
///
/// `meshes` and `operations` always have the same length; entry `i` of one
/// belongs to entry `i` of the other. Meshes without polygons are never
/// stored, and an empty set is simply one with no entries.
///
/// Every content change bumps [`BrushSet::revision`] and sets the dirty flag
/// that [`MirrorSync`](crate::MirrorSync) consumes.
#[derive(Debug, Clone)]
pub struct BrushSet<S = SurfaceDescriptor> {
    meshes: Vec<ConvexMesh<S>>,
    operations: Vec<CsgOperation>,
    params: BrushParams,
    revision: u64,
    dirty: bool,
}

/// What a [`BrushSet::cut`] did to each brush.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CutSummary {
    /// Brushes entirely on the kept side.
    pub unchanged: usize,
    /// Brushes that straddled the plane and were capped.
    pub split: usize,
    /// Original indices of removed brushes, ascending.
    pub removed: Vec<usize>,
}

impl<S> Default for BrushSet<S> {
    fn default() -> Self {
        Self::with_params(BrushParams::default())
    }
}

impl<S> BrushSet<S> {
    /// Creates an empty brush set with default parameters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty brush set with the given parameters.
    pub fn with_params(params: BrushParams) -> Self {
        Self {
            meshes: Vec::new(),
            operations: Vec::new(),
            params,
            revision: 0,
            dirty: false,
        }
    }

    #[inline]
    pub fn params(&self) -> &BrushParams {
        &self.params
    }

    #[inline]
    pub fn meshes(&self) -> &[ConvexMesh<S>] {
        &self.meshes
    }

    #[inline]
    pub fn operations(&self) -> &[CsgOperation] {
        &self.operations
    }

    /// Returns the number of brushes.
    #[inline]
    pub fn len(&self) -> usize {
        self.meshes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.meshes.is_empty()
    }

    /// Returns a brush and its operation.
    pub fn get(&self, index: usize) -> Option<(&ConvexMesh<S>, CsgOperation)> {
        Some((self.meshes.get(index)?, *self.operations.get(index)?))
    }

    /// Iterates over brushes paired with their operations.
    pub fn iter(&self) -> impl Iterator<Item = (&ConvexMesh<S>, CsgOperation)> + '_ {
        self.meshes.iter().zip(self.operations.iter().copied())
    }

    /// Number of content changes so far.
    #[inline]
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Returns true if contents changed since the last [`BrushSet::take_dirty`].
    #[inline]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Returns the dirty flag and resets it.
    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    /// Raises the contents-modified signal.
    ///
    /// Every mutating method calls this itself; owners only need it after
    /// changes made outside the set (for example a reloaded surface library).
    pub fn notify_contents_modified(&mut self) {
        self.revision += 1;
        self.dirty = true;
        trace!(revision = self.revision, brushes = self.meshes.len(), "brush set modified");
    }

    /// Empties the set. Calling it on an empty set only raises the signal.
    pub fn clear(&mut self) {
        self.clear_entries();
        self.notify_contents_modified();
    }

    fn clear_entries(&mut self) {
        self.meshes.clear();
        self.operations.clear();
    }

    fn remove_entry(&mut self, index: usize) -> (ConvexMesh<S>, CsgOperation) {
        (self.meshes.remove(index), self.operations.remove(index))
    }

    /// Replaces every brush with `meshes`, all tagged [`CsgOperation::Additive`].
    ///
    /// Previous operations are discarded, not carried over by position.
    /// `None` is the same as [`BrushSet::clear`]. Derived data is recomputed
    /// and meshes that are empty or invalid are skipped, with failures logged
    /// through [`TracingSink`].
    pub fn replace_all(&mut self, meshes: Option<Vec<ConvexMesh<S>>>) {
        let Some(meshes) = meshes else {
            self.clear();
            return;
        };

        let supplied = meshes.len();
        self.operations = vec![CsgOperation::Additive; supplied];
        self.meshes = meshes;
        self.normalize(&mut TracingSink);
        if self.meshes.len() != supplied {
            debug!(
                supplied,
                kept = self.meshes.len(),
                "skipped unusable meshes while replacing brushes"
            );
        }
        self.notify_contents_modified();
    }

    /// Appends a brush after re-deriving and checking it.
    ///
    /// A mesh that is empty or fails validation is rejected with its error
    /// and the set stays untouched. With strict validation the rejection is
    /// also reported through [`TracingSink`].
    pub fn push(&mut self, mut mesh: ConvexMesh<S>, operation: CsgOperation) -> BrushResult<()> {
        let index = self.meshes.len();
        if let Err(err) = mesh.update_derived().and_then(|()| mesh.check_topology()) {
            if self.params.strict_validation {
                TracingSink.report_error(index, &err.to_string());
            }
            return Err(err);
        }

        self.meshes.push(mesh);
        self.operations.push(operation);
        self.notify_contents_modified();
        Ok(())
    }

    /// Removes a brush, keeping the order of the others.
    pub fn remove(&mut self, index: usize) -> Option<(ConvexMesh<S>, CsgOperation)> {
        if index >= self.meshes.len() {
            return None;
        }
        let entry = self.remove_entry(index);
        self.notify_contents_modified();
        Some(entry)
    }

    /// Changes the operation of one brush. Returns false for a bad index.
    pub fn set_operation(&mut self, index: usize, operation: CsgOperation) -> bool {
        match self.operations.get_mut(index) {
            Some(slot) => {
                *slot = operation;
                self.notify_contents_modified();
                true
            }
            None => false,
        }
    }

    /// Regenerates the whole set from `generator`.
    ///
    /// On success the output replaces every brush; each mesh is then
    /// re-derived and validated, and a mesh that fails is reported to `sink`
    /// (when strict validation is on) and dropped with its operation. On
    /// failure the set is cleared and `GenerationFailed` returned. Either way
    /// the contents-modified signal is raised exactly once.
    pub fn generate<G, D>(&mut self, generator: &G, sink: &mut D) -> BrushResult<()>
    where
        G: BrushGenerator<S> + ?Sized,
        D: DiagnosticSink + ?Sized,
    {
        let result = match generator.generate() {
            Ok(brushes) => {
                (self.meshes, self.operations) = brushes
                    .into_iter()
                    .map(|brush| (brush.mesh, brush.operation))
                    .unzip();
                self.normalize(sink);
                debug!(brushes = self.meshes.len(), "generated brush set");
                Ok(())
            }
            Err(err) => {
                warn!(%err, "brush generation failed, clearing brush set");
                self.clear_entries();
                Err(match err {
                    BrushError::GenerationFailed { .. } => err,
                    other => BrushError::generation(other.to_string()),
                })
            }
        };
        self.notify_contents_modified();
        result
    }

    /// Re-derives every mesh and drops the ones that are empty or invalid.
    fn normalize<D>(&mut self, sink: &mut D)
    where
        D: DiagnosticSink + ?Sized,
    {
        let strict = self.params.strict_validation;
        for index in (0..self.meshes.len()).rev() {
            let mesh = &mut self.meshes[index];
            if mesh.is_empty() {
                self.remove_entry(index);
                continue;
            }

            let usable = match mesh.update_derived() {
                Ok(()) => mesh.validate(index, strict, sink),
                Err(err) => {
                    if strict {
                        sink.report_error(index, &err.to_string());
                    }
                    false
                }
            };
            if !usable {
                warn!(mesh = index, "dropping invalid generated brush");
                self.remove_entry(index);
            }
        }

        if self.meshes.is_empty() {
            self.clear_entries();
        }
    }

    /// Smallest box around every vertex of every brush after `transform`.
    ///
    /// An empty set yields [`Aabb::degenerate`], never an infinite box.
    pub fn calculate_bounds(&self, transform: &Affine3<f32>) -> Aabb {
        let bounds = self
            .meshes
            .iter()
            .fold(Aabb::empty(), |bounds, mesh| bounds.union(&mesh.bounds(transform)));
        if bounds.is_empty() {
            Aabb::degenerate()
        } else {
            bounds
        }
    }
}

impl<S: Clone> BrushSet<S> {
    /// Cuts every brush by `plane`, keeping the part behind it.
    ///
    /// Split brushes get a capping polygon carrying `surface`. Brushes that
    /// end up empty, or whose cut cannot be rebuilt consistently, are removed
    /// together with their operation; the latter are also reported to `sink`.
    /// Brushes are visited from the back so removals never shift an
    /// unvisited index.
    pub fn cut<D>(&mut self, plane: &Plane3D, surface: S, sink: &mut D) -> CutSummary
    where
        D: DiagnosticSink + ?Sized,
    {
        let epsilon = self.params.plane_epsilon;
        let mut summary = CutSummary::default();

        for index in (0..self.meshes.len()).rev() {
            match self.meshes[index].cut_with_epsilon(plane, surface.clone(), epsilon) {
                Ok(CutOutcome::Unchanged) => summary.unchanged += 1,
                Ok(CutOutcome::Split) => summary.split += 1,
                Err(BrushError::EmptyAfterCut) => {
                    debug!(mesh = index, "brush removed by cut");
                    self.remove_entry(index);
                    summary.removed.push(index);
                }
                Err(err) => {
                    warn!(mesh = index, %err, "brush cut failed, removing brush");
                    sink.report_error(index, &err.to_string());
                    self.remove_entry(index);
                    summary.removed.push(index);
                }
            }
        }
        summary.removed.reverse();

        if self.meshes.is_empty() {
            self.clear_entries();
        }
        self.notify_contents_modified();
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::tests::make_cube;
    use crate::{BoxGenerator, CollectingSink, FnGenerator, GeneratedBrush};
    use approx::assert_relative_eq;
    use nalgebra::{Matrix4, Point3, Vector3};

    fn make_box(min: [f32; 3], max: [f32; 3]) -> ConvexMesh {
        ConvexMesh::cuboid(
            Point3::new(min[0], min[1], min[2]),
            Point3::new(max[0], max[1], max[2]),
            SurfaceDescriptor::default(),
        )
        .unwrap()
    }

    fn cap() -> SurfaceDescriptor {
        SurfaceDescriptor::with_material(3)
    }

    fn assert_aligned(set: &BrushSet) {
        assert_eq!(set.meshes().len(), set.operations().len());
    }

    #[test]
    fn new_set_is_empty_and_clean() {
        let set: BrushSet = BrushSet::new();
        assert!(set.is_empty());
        assert_eq!(set.revision(), 0);
        assert!(!set.is_dirty());
        assert_aligned(&set);
    }

    #[test]
    fn generate_replaces_contents_and_signals_once() {
        let mut set = BrushSet::new();
        set.push(make_cube(1.0), CsgOperation::Subtractive).unwrap();
        let before = set.revision();

        let generator = FnGenerator::new(|| -> BrushResult<Vec<GeneratedBrush>> {
            Ok(vec![
                GeneratedBrush::additive(make_cube(1.0)),
                GeneratedBrush::new(make_cube(2.0), CsgOperation::Intersecting),
            ])
        });
        set.generate(&generator, &mut TracingSink).unwrap();

        assert_eq!(set.len(), 2);
        assert_eq!(
            set.operations(),
            &[CsgOperation::Additive, CsgOperation::Intersecting]
        );
        assert_eq!(set.revision(), before + 1);
        assert!(set.is_dirty());
        assert_aligned(&set);
    }

    #[test]
    fn failed_generation_empties_set() {
        let mut set = BrushSet::new();
        set.push(make_cube(1.0), CsgOperation::Additive).unwrap();

        let generator = FnGenerator::new(|| -> BrushResult<Vec<GeneratedBrush>> {
            Err(BrushError::generation("broken parameters"))
        });
        let result = set.generate(&generator, &mut TracingSink);

        assert!(matches!(result, Err(BrushError::GenerationFailed { .. })));
        assert!(set.meshes().is_empty());
        assert!(set.operations().is_empty());
    }

    #[test]
    fn generator_errors_are_reported_as_generation_failures() {
        let mut set: BrushSet = BrushSet::new();
        let generator = BoxGenerator {
            min: Point3::new(1.0, 0.0, 0.0),
            max: Point3::new(0.0, 1.0, 1.0),
            ..BoxGenerator::default()
        };
        let result = set.generate(&generator, &mut TracingSink);
        assert!(matches!(result, Err(BrushError::GenerationFailed { .. })));
        assert!(set.is_empty());
    }

    #[test]
    fn generate_drops_invalid_meshes_and_reports() {
        let mut set = BrushSet::new();
        let generator = FnGenerator::new(|| -> BrushResult<Vec<GeneratedBrush>> {
            let cube = make_cube(1.0);
            let mut half_edges = cube.half_edges().to_vec();
            half_edges[0].twin = 0;
            let broken = ConvexMesh::from_parts(
                cube.vertices().to_vec(),
                half_edges,
                cube.polygons().to_vec(),
            );
            Ok(vec![
                GeneratedBrush::new(make_cube(1.0), CsgOperation::Subtractive),
                GeneratedBrush::additive(broken),
                GeneratedBrush::additive(ConvexMesh::new()),
                GeneratedBrush::new(make_cube(2.0), CsgOperation::Intersecting),
            ])
        });

        let mut sink = CollectingSink::new();
        set.generate(&generator, &mut sink).unwrap();

        assert_eq!(set.len(), 2);
        assert_eq!(
            set.operations(),
            &[CsgOperation::Subtractive, CsgOperation::Intersecting]
        );
        let reports = sink.into_diagnostics();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].mesh_index, 1);
    }

    #[test]
    fn generate_with_only_invalid_meshes_is_empty() {
        let mut set: BrushSet = BrushSet::with_params(BrushParams::tolerant());
        let generator = FnGenerator::new(|| -> BrushResult<Vec<GeneratedBrush>> {
            Ok(vec![GeneratedBrush::additive(ConvexMesh::new())])
        });

        let mut sink = CollectingSink::new();
        set.generate(&generator, &mut sink).unwrap();
        assert!(set.is_empty());
        assert!(sink.is_empty());
    }

    #[test]
    fn replace_all_resets_operations() {
        let mut set = BrushSet::new();
        set.push(make_cube(1.0), CsgOperation::Subtractive).unwrap();
        set.push(make_cube(2.0), CsgOperation::Intersecting).unwrap();

        set.replace_all(Some(vec![make_cube(3.0), ConvexMesh::new(), make_cube(4.0)]));

        assert_eq!(set.len(), 2);
        assert_eq!(set.operations(), &[CsgOperation::Additive; 2]);
        assert_aligned(&set);
    }

    #[test]
    fn replace_all_with_none_clears() {
        let mut set = BrushSet::new();
        set.push(make_cube(1.0), CsgOperation::Additive).unwrap();
        let before = set.revision();

        set.replace_all(None);

        assert!(set.is_empty());
        assert!(set.operations().is_empty());
        assert_eq!(set.revision(), before + 1);
    }

    #[test]
    fn clear_is_idempotent_and_signals() {
        let mut set = BrushSet::new();
        set.push(make_cube(1.0), CsgOperation::Additive).unwrap();

        set.clear();
        let after_once = set.revision();
        set.clear();

        assert!(set.is_empty());
        assert!(set.operations().is_empty());
        assert_eq!(set.revision(), after_once + 1);
    }

    #[test]
    fn single_entry_edits_keep_alignment() {
        let mut set = BrushSet::new();
        assert!(set.push(ConvexMesh::new(), CsgOperation::Additive).is_err());
        set.push(make_cube(1.0), CsgOperation::Additive).unwrap();
        set.push(make_cube(2.0), CsgOperation::Additive).unwrap();

        assert!(set.set_operation(1, CsgOperation::Subtractive));
        assert!(!set.set_operation(5, CsgOperation::Subtractive));

        let (removed, operation) = set.remove(0).unwrap();
        assert_eq!(removed, make_cube(1.0));
        assert_eq!(operation, CsgOperation::Additive);
        assert_eq!(set.get(0).unwrap().1, CsgOperation::Subtractive);
        assert!(set.remove(3).is_none());
        assert_aligned(&set);
    }

    #[test]
    fn push_rejects_invalid_meshes() {
        let cube = make_cube(1.0);
        let mut half_edges = cube.half_edges().to_vec();
        half_edges[2].twin = 2;
        let broken =
            ConvexMesh::from_parts(cube.vertices().to_vec(), half_edges, cube.polygons().to_vec());

        let mut set = BrushSet::new();
        let result = set.push(broken, CsgOperation::Additive);

        assert!(matches!(result, Err(BrushError::InvalidTopology { .. })));
        assert!(set.is_empty());
        assert_eq!(set.revision(), 0);
        assert!(!set.is_dirty());
    }

    #[test]
    fn push_rederives_planes() {
        let cube = make_cube(1.0);
        let mut moved: Vec<Point3<f32>> = cube.vertices().to_vec();
        for vertex in &mut moved {
            vertex.x += 5.0;
        }
        let mut polygons = cube.polygons().to_vec();
        polygons[0].surface = cap();
        let mesh = ConvexMesh::from_parts(moved, cube.half_edges().to_vec(), polygons);

        let mut set = BrushSet::new();
        set.push(mesh, CsgOperation::Additive).unwrap();

        let stored = &set.meshes()[0];
        assert_eq!(stored.planes().len(), stored.polygons().len());
        assert!(stored.planes().iter().all(Option::is_some));
        assert_relative_eq!(set.calculate_bounds(&Affine3::identity()).min.x, 4.0);
    }

    #[test]
    fn cut_missing_every_brush_is_identity() {
        let mut set = BrushSet::new();
        set.push(make_cube(1.0), CsgOperation::Additive).unwrap();
        set.push(make_box([2.0, 2.0, 2.0], [3.0, 3.0, 3.0]), CsgOperation::Subtractive).unwrap();
        let meshes = set.meshes().to_vec();
        let operations = set.operations().to_vec();

        let summary = set.cut(&Plane3D::new(Vector3::x(), 10.0), cap(), &mut TracingSink);

        assert_eq!(summary.unchanged, 2);
        assert!(summary.removed.is_empty());
        assert_eq!(set.meshes(), meshes.as_slice());
        assert_eq!(set.operations(), operations.as_slice());
    }

    #[test]
    fn cut_removing_everything_matches_clear() {
        let mut set = BrushSet::new();
        set.push(make_cube(1.0), CsgOperation::Additive).unwrap();
        set.push(make_cube(2.0), CsgOperation::Subtractive).unwrap();

        let summary = set.cut(&Plane3D::new(Vector3::x(), -5.0), cap(), &mut TracingSink);

        let mut cleared: BrushSet = BrushSet::new();
        cleared.clear();
        assert_eq!(summary.removed, vec![0, 1]);
        assert_eq!(set.meshes(), cleared.meshes());
        assert_eq!(set.operations(), cleared.operations());
        assert!(set.is_empty());
    }

    #[test]
    fn cube_cut_scenario() {
        let mut set = BrushSet::new();
        set.push(make_cube(1.0), CsgOperation::Additive).unwrap();

        let summary = set.cut(&Plane3D::new(Vector3::x(), 0.0), cap(), &mut TracingSink);

        assert_eq!(summary.split, 1);
        assert_eq!(set.len(), 1);
        let mesh = &set.meshes()[0];
        assert_eq!(mesh.len(), 6);
        assert_eq!(
            mesh.polygons()
                .iter()
                .filter(|polygon| polygon.surface == cap())
                .count(),
            1
        );

        let bounds = set.calculate_bounds(&Affine3::identity());
        assert_relative_eq!(bounds.min, Point3::new(-1.0, -1.0, -1.0));
        assert_relative_eq!(bounds.max, Point3::new(0.0, 1.0, 1.0));
    }

    #[test]
    fn cut_removing_first_brush_keeps_second() {
        let mut set = BrushSet::new();
        let first = make_box([1.0, -1.0, -1.0], [3.0, 1.0, 1.0]);
        let second = make_box([-3.0, -1.0, -1.0], [-1.0, 1.0, 1.0]);
        set.push(first, CsgOperation::Additive).unwrap();
        set.push(second.clone(), CsgOperation::Subtractive).unwrap();

        let summary = set.cut(&Plane3D::new(Vector3::x(), 0.0), cap(), &mut TracingSink);

        assert_eq!(summary.removed, vec![0]);
        assert_eq!(set.len(), 1);
        assert_eq!(set.meshes()[0], second);
        assert_eq!(set.operations(), &[CsgOperation::Subtractive]);
    }

    #[test]
    fn cut_preserves_order_of_survivors() {
        let mut set = BrushSet::new();
        set.push(make_box([-3.0, 0.0, 0.0], [-2.0, 1.0, 1.0]), CsgOperation::Additive).unwrap();
        set.push(make_box([2.0, 0.0, 0.0], [3.0, 1.0, 1.0]), CsgOperation::Subtractive).unwrap();
        set.push(make_box([-1.0, 0.0, 0.0], [1.0, 1.0, 1.0]), CsgOperation::Intersecting).unwrap();
        set.push(make_box([4.0, 0.0, 0.0], [5.0, 1.0, 1.0]), CsgOperation::Subtractive).unwrap();

        let summary = set.cut(&Plane3D::new(Vector3::x(), 0.0), cap(), &mut TracingSink);

        assert_eq!(summary.removed, vec![1, 3]);
        assert_eq!(summary.unchanged, 1);
        assert_eq!(summary.split, 1);
        assert_eq!(
            set.operations(),
            &[CsgOperation::Additive, CsgOperation::Intersecting]
        );
        assert_aligned(&set);
    }

    #[test]
    fn cut_reports_broken_brushes() {
        let cube = make_cube(1.0);
        let mut half_edges = cube.half_edges().to_vec();
        half_edges[5].twin = 5;
        let broken =
            ConvexMesh::from_parts(cube.vertices().to_vec(), half_edges, cube.polygons().to_vec());

        let mut set = BrushSet::new();
        set.push(make_cube(1.0), CsgOperation::Additive).unwrap();
        // Bypasses `push`, which would refuse the broken mesh
        set.meshes.push(broken);
        set.operations.push(CsgOperation::Subtractive);

        let mut sink = CollectingSink::new();
        let summary = set.cut(&Plane3D::new(Vector3::x(), 0.0), cap(), &mut sink);

        assert_eq!(summary.removed, vec![1]);
        assert_eq!(set.len(), 1);
        assert_eq!(sink.diagnostics().len(), 1);
        assert_eq!(sink.diagnostics()[0].mesh_index, 1);
    }

    #[test]
    fn cut_signals_even_when_nothing_changes() {
        let mut set: BrushSet = BrushSet::new();
        set.cut(&Plane3D::new(Vector3::x(), 0.0), cap(), &mut TracingSink);
        assert_eq!(set.revision(), 1);
        assert!(set.take_dirty());
        assert!(!set.is_dirty());
    }

    #[test]
    fn bounds_of_empty_set_are_degenerate() {
        let set: BrushSet = BrushSet::new();
        let bounds = set.calculate_bounds(&Affine3::identity());
        assert_eq!(bounds, Aabb::degenerate());
        assert_eq!(bounds.min, bounds.max);
        assert!(bounds.min.iter().all(|c| c.is_finite()));
    }

    #[test]
    fn bounds_follow_transform() {
        let mut set = BrushSet::new();
        set.push(make_cube(1.0), CsgOperation::Additive).unwrap();
        set.push(make_box([2.0, 0.0, 0.0], [3.0, 1.0, 1.0]), CsgOperation::Additive).unwrap();

        let scale = Affine3::from_matrix_unchecked(Matrix4::new_nonuniform_scaling(&Vector3::new(
            2.0, 1.0, 1.0,
        )));
        let bounds = set.calculate_bounds(&scale);
        assert_relative_eq!(bounds.min, Point3::new(-2.0, -1.0, -1.0));
        assert_relative_eq!(bounds.max, Point3::new(6.0, 1.0, 1.0));
    }
}
