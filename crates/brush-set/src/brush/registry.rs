//! Ownership of brush sets attached to a host, keyed by id.

use std::collections::BTreeMap;
use std::fmt;

use tracing::{debug, warn};

use super::mirror::{InstanceMirror, MirrorAction, MirrorSync};
use super::set::BrushSet;
use crate::SurfaceDescriptor;

/// Handle to a brush set inside a [`BrushSetRegistry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BrushSetId(u64);

impl fmt::Display for BrushSetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "brush-set#{}", self.0)
    }
}

#[derive(Debug)]
struct Entry<S> {
    set: BrushSet<S>,
    sync: MirrorSync,
}

/// Brush sets attached to a host, each paired with the state of its mirror.
///
/// Attaching, detaching and content changes are the host lifecycle hooks;
/// [`BrushSetRegistry::sync_all`] then forwards every pending change to the
/// mirrors.
#[derive(Debug)]
pub struct BrushSetRegistry<S = SurfaceDescriptor> {
    entries: BTreeMap<BrushSetId, Entry<S>>,
    next_id: u64,
}

impl<S> Default for BrushSetRegistry<S> {
    fn default() -> Self {
        Self {
            entries: BTreeMap::new(),
            next_id: 0,
        }
    }
}

impl<S> BrushSetRegistry<S> {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Takes ownership of `set` and marks it for an initial sync.
    pub fn on_attach(&mut self, mut set: BrushSet<S>) -> BrushSetId {
        let id = BrushSetId(self.next_id);
        self.next_id += 1;

        set.notify_contents_modified();
        debug!(%id, brushes = set.len(), "brush set attached");
        self.entries.insert(
            id,
            Entry {
                set,
                sync: MirrorSync::new(),
            },
        );
        id
    }

    /// Releases the mirror's instances and hands the set back.
    pub fn on_detach<M>(&mut self, id: BrushSetId, mirror: &mut M) -> Option<BrushSet<S>>
    where
        M: InstanceMirror<S> + ?Sized,
    {
        let mut entry = self.entries.remove(&id)?;
        entry.sync.release::<S, M>(mirror);
        debug!(%id, "brush set detached");
        Some(entry.set)
    }

    /// Marks a set as changed from outside. Returns false for an unknown id.
    pub fn on_content_changed(&mut self, id: BrushSetId) -> bool {
        match self.entries.get_mut(&id) {
            Some(entry) => {
                entry.set.notify_contents_modified();
                true
            }
            None => false,
        }
    }

    pub fn get(&self, id: BrushSetId) -> Option<&BrushSet<S>> {
        self.entries.get(&id).map(|entry| &entry.set)
    }

    pub fn get_mut(&mut self, id: BrushSetId) -> Option<&mut BrushSet<S>> {
        self.entries.get_mut(&id).map(|entry| &mut entry.set)
    }

    /// Ids of sets with changes not yet synced, ascending.
    pub fn dirty_ids(&self) -> Vec<BrushSetId> {
        self.entries
            .iter()
            .filter(|(_, entry)| entry.set.is_dirty())
            .map(|(id, _)| *id)
            .collect()
    }

    /// Syncs every dirty set with its mirror from `mirrors`.
    ///
    /// Sets without a mirror stay dirty and are skipped. Returns the action
    /// taken for each set that was synced.
    pub fn sync_all<M>(
        &mut self,
        mirrors: &mut BTreeMap<BrushSetId, M>,
    ) -> Vec<(BrushSetId, MirrorAction)>
    where
        M: InstanceMirror<S>,
    {
        let mut actions = Vec::new();
        for (id, entry) in &mut self.entries {
            if !entry.set.is_dirty() {
                continue;
            }
            let Some(mirror) = mirrors.get_mut(id) else {
                warn!(%id, "dirty brush set has no mirror");
                continue;
            };
            let action = entry.sync.sync(&mut entry.set, mirror);
            actions.push((*id, action));
        }
        actions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::brush::mirror::tests::RecordingMirror;
    use crate::mesh::tests::make_cube;
    use crate::CsgOperation;

    fn set_with_cubes(count: usize) -> BrushSet {
        let mut set = BrushSet::new();
        for i in 0..count {
            set.push(make_cube(1.0 + i as f32), CsgOperation::Additive).unwrap();
        }
        set
    }

    #[test]
    fn attach_assigns_distinct_ids() {
        let mut registry = BrushSetRegistry::new();
        let a = registry.on_attach(set_with_cubes(1));
        let b = registry.on_attach(set_with_cubes(2));

        assert_ne!(a, b);
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.get(b).unwrap().len(), 2);
        assert_eq!(registry.dirty_ids(), vec![a, b]);
    }

    #[test]
    fn sync_all_creates_then_idles() {
        let mut registry = BrushSetRegistry::new();
        let id = registry.on_attach(set_with_cubes(2));
        let mut mirrors = BTreeMap::from([(id, RecordingMirror::default())]);

        assert_eq!(registry.sync_all(&mut mirrors), vec![(id, MirrorAction::Created)]);
        assert!(registry.sync_all(&mut mirrors).is_empty());
        assert!(registry.dirty_ids().is_empty());

        assert!(registry.on_content_changed(id));
        assert_eq!(registry.sync_all(&mut mirrors), vec![(id, MirrorAction::Updated)]);
        assert_eq!(mirrors[&id].calls, ["create 2", "update 2"]);
    }

    #[test]
    fn edits_through_get_mut_are_synced() {
        let mut registry = BrushSetRegistry::new();
        let id = registry.on_attach(set_with_cubes(1));
        let mut mirrors = BTreeMap::from([(id, RecordingMirror::default())]);
        registry.sync_all(&mut mirrors);

        registry.get_mut(id).unwrap().clear();
        assert_eq!(registry.sync_all(&mut mirrors), vec![(id, MirrorAction::Destroyed)]);
    }

    #[test]
    fn set_without_mirror_stays_dirty() {
        let mut registry = BrushSetRegistry::new();
        let id = registry.on_attach(set_with_cubes(1));
        let mut mirrors: BTreeMap<BrushSetId, RecordingMirror> = BTreeMap::new();

        assert!(registry.sync_all(&mut mirrors).is_empty());
        assert_eq!(registry.dirty_ids(), vec![id]);
    }

    #[test]
    fn detach_releases_instances() {
        let mut registry = BrushSetRegistry::new();
        let id = registry.on_attach(set_with_cubes(1));
        let mut mirrors = BTreeMap::from([(id, RecordingMirror::default())]);
        registry.sync_all(&mut mirrors);

        let mirror = mirrors.get_mut(&id).unwrap();
        let set = registry.on_detach(id, mirror).unwrap();
        assert_eq!(set.len(), 1);
        assert!(registry.is_empty());
        assert_eq!(mirror.calls, ["create 1", "destroy"]);

        assert!(registry.on_detach(id, mirror).is_none());
        assert!(!registry.on_content_changed(id));
    }
}
