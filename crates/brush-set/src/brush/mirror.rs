//! Keeping external per-brush instances in step with a brush set.

use tracing::debug;

use super::set::BrushSet;
use crate::{ConvexMesh, SurfaceDescriptor};

/// Receiver for per-brush instance changes, such as a renderer or a physics
/// world holding one object per brush.
pub trait InstanceMirror<S = SurfaceDescriptor> {
    /// Creates one instance per mesh, in order.
    fn create_all(&mut self, meshes: &[ConvexMesh<S>]);

    /// Refreshes existing instances; `meshes` has as many entries as were
    /// last created.
    fn update_all(&mut self, meshes: &[ConvexMesh<S>]);

    /// Drops every instance.
    fn destroy_all(&mut self);
}

/// What a [`MirrorSync::sync`] call asked the mirror to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MirrorAction {
    /// The set was clean, or stayed empty.
    None,
    Created,
    Updated,
    /// The brush count changed, so instances were destroyed and recreated.
    Recreated,
    Destroyed,
}

/// Tracks how many instances a mirror currently holds for one brush set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MirrorSync {
    mirrored: usize,
}

impl MirrorSync {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of instances the mirror holds.
    #[inline]
    pub fn mirrored_count(&self) -> usize {
        self.mirrored
    }

    /// Forwards pending changes of `set` to `mirror`.
    ///
    /// Does nothing unless the set is dirty; the dirty flag is consumed.
    pub fn sync<S, M>(&mut self, set: &mut BrushSet<S>, mirror: &mut M) -> MirrorAction
    where
        M: InstanceMirror<S> + ?Sized,
    {
        if !set.take_dirty() {
            return MirrorAction::None;
        }

        let meshes = set.meshes();
        let action = match (self.mirrored, meshes.len()) {
            (0, 0) => MirrorAction::None,
            (_, 0) => {
                mirror.destroy_all();
                MirrorAction::Destroyed
            }
            (0, _) => {
                mirror.create_all(meshes);
                MirrorAction::Created
            }
            (before, now) if before == now => {
                mirror.update_all(meshes);
                MirrorAction::Updated
            }
            _ => {
                mirror.destroy_all();
                mirror.create_all(meshes);
                MirrorAction::Recreated
            }
        };

        debug!(
            before = self.mirrored,
            after = meshes.len(),
            ?action,
            "synced brush instances"
        );
        self.mirrored = meshes.len();
        action
    }

    /// Destroys all instances, for when the brush set goes away.
    pub fn release<S, M>(&mut self, mirror: &mut M)
    where
        M: InstanceMirror<S> + ?Sized,
    {
        if self.mirrored > 0 {
            mirror.destroy_all();
            self.mirrored = 0;
        }
    }
}
