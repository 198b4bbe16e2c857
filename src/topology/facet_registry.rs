//! FacetRegistry: find-or-create map from vertex cycles to facet indices.
//!
//! Polygons share edges and polyhedra share facets. The registry gives every
//! distinct boundary loop (compared with [`VertexCycle`] equality) exactly one
//! index in a backing [`EntityIndexSet`], so edges and facets can carry
//! attributes like any other entity.
//!
//! Each entry counts how many times it was requested through
//! [`find_or_create`](FacetRegistry::find_or_create). [`remove`](FacetRegistry::remove)
//! releases one reference and [`remove_isolated`](FacetRegistry::remove_isolated)
//! drops every entry nobody references any more.

use hashbrown::HashMap;
use hashbrown::hash_map::Entry;
use parking_lot::{Mutex, MutexGuard};
use serde::{Deserialize, Serialize};

use crate::data::attribute_store::AttributeStore;
use crate::data::registry::{AttributeRegistry, StoreRecord};
use crate::debug_invariants::{DebugInvariants, ensure};
use crate::mesh_error::MeshError;
use crate::topology::entity_set::EntityIndexSet;
use crate::topology::index::{self, NO_ID};
use crate::topology::vertex_cycle::{CycleVertices, VertexCycle};

/// Registry of unique vertex cycles.
#[derive(Clone, Debug)]
pub struct FacetRegistry<C: CycleVertices> {
    ids: HashMap<VertexCycle<C>, usize>,
    facets: EntityIndexSet,
    vertices: Vec<C>,
    counters: Vec<usize>,
}

/// Persisted form of a [`FacetRegistry`]; keys are rebuilt on load.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct FacetRegistryRecord<C: CycleVertices> {
    pub vertices: Vec<C>,
    pub counters: Vec<usize>,
    pub attributes: StoreRecord,
}

/// Polygon edges, keyed by their two end vertices.
pub type EdgeRegistry = FacetRegistry<[usize; 2]>;

/// Polyhedron facets, keyed by their vertex loop.
pub type PolyhedronFacetRegistry = FacetRegistry<Vec<usize>>;

impl<C: CycleVertices> FacetRegistry<C> {
    /// Empty registry whose entities are called `kind` ("edge", "facet", ..).
    pub fn new(kind: &'static str) -> Self {
        Self {
            ids: HashMap::new(),
            facets: EntityIndexSet::new(kind),
            vertices: Vec::new(),
            counters: Vec::new(),
        }
    }

    #[inline]
    pub fn nb_facets(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Index of the facet matching `vertices`, in any rotation or direction.
    pub fn find(&self, vertices: &C) -> Option<usize> {
        self.ids.get(&VertexCycle::new(vertices.clone())).copied()
    }

    /// Index of the facet matching `vertices`, created if unknown.
    ///
    /// Every call adds one reference to the returned facet.
    pub fn find_or_create(&mut self, vertices: C) -> usize {
        let key = VertexCycle::new(vertices);
        match self.ids.entry(key) {
            Entry::Occupied(entry) => {
                let id = *entry.get();
                self.counters[id] += 1;
                id
            }
            Entry::Vacant(entry) => {
                let id = self.facets.create();
                self.vertices.push(entry.key().vertices().clone());
                self.counters.push(1);
                entry.insert(id);
                id
            }
        }
    }

    /// Replace the vertex at `position` of the loop `old_vertices` by
    /// `new_vertex` and return the index of the resulting facet.
    ///
    /// One reference moves from the old facet to the new one. When the old
    /// facet had no other user and the new loop is not registered yet, the
    /// entry is re-keyed in place so it keeps its index and attributes.
    ///
    /// # Errors
    /// `FacetNotFound` if `old_vertices` is not registered.
    pub fn update_vertex(
        &mut self,
        old_vertices: &C,
        position: usize,
        new_vertex: usize,
    ) -> Result<usize, MeshError> {
        let old_key = VertexCycle::new(old_vertices.clone());
        let id = self
            .ids
            .get(&old_key)
            .copied()
            .ok_or_else(|| MeshError::FacetNotFound(old_vertices.as_ref().to_vec()))?;
        let mut updated = old_vertices.clone();
        updated.as_mut()[position] = new_vertex;
        let new_key = VertexCycle::new(updated);
        if new_key == old_key {
            return Ok(id);
        }
        if let Some(&existing) = self.ids.get(&new_key) {
            self.counters[existing] += 1;
            self.release(id);
            return Ok(existing);
        }
        if self.counters[id] <= 1 {
            self.ids.remove(&old_key);
            self.vertices[id] = new_key.vertices().clone();
            self.ids.insert(new_key, id);
            return Ok(id);
        }
        self.release(id);
        Ok(self.find_or_create(new_key.into_vertices()))
    }

    fn release(&mut self, id: usize) {
        self.counters[id] = self.counters[id].saturating_sub(1);
    }

    /// Release one reference to the facet matching `vertices`.
    /// Returns the references left; the entry itself stays until
    /// [`remove_isolated`](Self::remove_isolated).
    ///
    /// # Errors
    /// `FacetNotFound` if `vertices` is not registered.
    pub fn remove(&mut self, vertices: &C) -> Result<usize, MeshError> {
        let id = self
            .find(vertices)
            .ok_or_else(|| MeshError::FacetNotFound(vertices.as_ref().to_vec()))?;
        self.release(id);
        Ok(self.counters[id])
    }

    /// Number of references held on facet `id`.
    pub fn counter(&self, id: usize) -> usize {
        self.counters[id]
    }

    /// Delete every facet without references.
    pub fn remove_isolated(&mut self) -> Result<Vec<usize>, MeshError> {
        let to_delete: Vec<bool> = self.counters.iter().map(|&c| c == 0).collect();
        self.delete(&to_delete)
    }

    /// Delete the flagged facets, whatever their reference count.
    ///
    /// # Errors
    /// `MaskLengthMismatch` if the mask does not have one entry per facet.
    pub fn delete(&mut self, to_delete: &[bool]) -> Result<Vec<usize>, MeshError> {
        let old2new = self.facets.delete(to_delete)?;
        if index::is_identity(&old2new) {
            return Ok(old2new);
        }
        index::compact(&mut self.vertices, to_delete);
        index::compact(&mut self.counters, to_delete);
        self.ids.retain(|_, id| {
            *id = old2new[*id];
            *id != NO_ID
        });
        self.debug_assert_invariants();
        Ok(old2new)
    }

    /// Reorder the facets; `permutation[new] = old`.
    ///
    /// # Errors
    /// `InvalidPermutation` if `permutation` is not a bijection on the facets.
    pub fn permute(&mut self, permutation: &[usize]) -> Result<Vec<usize>, MeshError> {
        let old2new = self.facets.permute(permutation)?;
        index::permute(&mut self.vertices, permutation);
        index::permute(&mut self.counters, permutation);
        for id in self.ids.values_mut() {
            *id = old2new[*id];
        }
        Ok(old2new)
    }

    /// Follow a vertex deletion or permutation: every stored loop is
    /// translated through `vertex_old2new`. Facets touching a removed vertex
    /// are deleted; the returned mapping describes that facet deletion.
    pub fn update_vertices(&mut self, vertex_old2new: &[usize]) -> Result<Vec<usize>, MeshError> {
        let mut to_delete = vec![false; self.vertices.len()];
        for (vertices, deleted) in self.vertices.iter_mut().zip(to_delete.iter_mut()) {
            for v in vertices.as_mut() {
                *v = index::remap(vertex_old2new, *v);
            }
            *deleted = vertices.as_ref().contains(&NO_ID);
        }
        let old2new = self.facets.delete(&to_delete)?;
        index::compact(&mut self.vertices, &to_delete);
        index::compact(&mut self.counters, &to_delete);
        self.rebuild_keys();
        log::trace!(
            "remapped {} {} loops",
            self.vertices.len(),
            self.facets.kind()
        );
        self.debug_assert_invariants();
        Ok(old2new)
    }

    fn rebuild_keys(&mut self) {
        self.ids.clear();
        self.ids.reserve(self.vertices.len());
        for (id, vertices) in self.vertices.iter_mut().enumerate() {
            let key = VertexCycle::new(vertices.clone());
            *vertices = key.vertices().clone();
            self.ids.insert(key, id);
        }
    }

    /// Stored loop of facet `id`, rotated to start at its minimum vertex.
    pub fn facet_vertices(&self, id: usize) -> &C {
        debug_assert!(id < self.vertices.len(), "facet {id} out of range");
        &self.vertices[id]
    }

    /// `(index, loop)` for every facet, in index order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &C)> + '_ {
        self.vertices.iter().enumerate()
    }

    pub fn entities(&self) -> &EntityIndexSet {
        &self.facets
    }

    pub fn attributes(&self) -> &AttributeStore {
        self.facets.attributes()
    }

    pub fn attributes_mut(&mut self) -> &mut AttributeStore {
        self.facets.attributes_mut()
    }

    /// Become a copy of `other`, attributes and reference counts included.
    ///
    /// # Errors
    /// `NonEmptyTarget` if this registry already holds facets.
    pub fn copy_from(&mut self, other: &FacetRegistry<C>) -> Result<(), MeshError> {
        self.facets.copy_from(&other.facets)?;
        self.ids = other.ids.clone();
        self.vertices = other.vertices.clone();
        self.counters = other.counters.clone();
        Ok(())
    }

    pub fn to_record(&self) -> Result<FacetRegistryRecord<C>, MeshError> {
        Ok(FacetRegistryRecord {
            vertices: self.vertices.clone(),
            counters: self.counters.clone(),
            attributes: self.attributes().to_record()?,
        })
    }

    /// Rebuild a registry of `kind` entities from its record.
    ///
    /// # Errors
    /// Attribute decoding errors, or `InvariantViolation` if the record holds
    /// duplicate loops or mismatched lengths.
    pub fn from_record(
        kind: &'static str,
        record: FacetRegistryRecord<C>,
        registry: &AttributeRegistry,
    ) -> Result<Self, MeshError> {
        let mut facets = EntityIndexSet::new(kind);
        facets.create_many(record.vertices.len());
        *facets.attributes_mut() = AttributeStore::from_record(record.attributes, registry)?;
        let mut loaded = Self {
            ids: HashMap::new(),
            facets,
            vertices: record.vertices,
            counters: record.counters,
        };
        loaded.rebuild_keys();
        loaded.validate_invariants()?;
        Ok(loaded)
    }
}

impl<C: CycleVertices> DebugInvariants for FacetRegistry<C> {
    fn validate_invariants(&self) -> Result<(), MeshError> {
        let n = self.vertices.len();
        ensure(self.facets.len() == n && self.counters.len() == n, || {
            format!(
                "{} {} loops, {} counters, {} entities",
                n,
                self.facets.kind(),
                self.counters.len(),
                self.facets.len()
            )
        })?;
        ensure(self.ids.len() == n, || {
            format!("{} keys for {n} {} loops", self.ids.len(), self.facets.kind())
        })?;
        for (key, &id) in &self.ids {
            ensure(id < n && VertexCycle::new(self.vertices[id].clone()) == *key, || {
                format!("key {:?} points at {} {id}", key.vertices(), self.facets.kind())
            })?;
        }
        self.facets.validate_invariants()
    }
}

/// A registry shared between threads: the lookup-or-insert sequence runs
/// under a single lock.
#[derive(Debug)]
pub struct SyncFacetRegistry<C: CycleVertices> {
    inner: Mutex<FacetRegistry<C>>,
}

impl<C: CycleVertices> SyncFacetRegistry<C> {
    pub fn new(registry: FacetRegistry<C>) -> Self {
        Self {
            inner: Mutex::new(registry),
        }
    }

    pub fn find(&self, vertices: &C) -> Option<usize> {
        self.inner.lock().find(vertices)
    }

    pub fn find_or_create(&self, vertices: C) -> usize {
        self.inner.lock().find_or_create(vertices)
    }

    /// Exclusive access for batches of operations.
    pub fn lock(&self) -> MutexGuard<'_, FacetRegistry<C>> {
        self.inner.lock()
    }

    pub fn into_inner(self) -> FacetRegistry<C> {
        self.inner.into_inner()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rotations_and_reflections_share_one_id() {
        let mut registry = FacetRegistry::<[usize; 3]>::new("facet");
        let id = registry.find_or_create([3, 7, 1]);
        for cycle in [[7, 1, 3], [1, 3, 7], [1, 7, 3]] {
            assert_eq!(registry.find_or_create(cycle), id);
        }
        assert_eq!(registry.nb_facets(), 1);
        assert_eq!(registry.counter(id), 4);
        assert_eq!(registry.facet_vertices(id), &[1, 3, 7]);
    }

    #[test]
    fn references_are_counted() {
        let mut registry = EdgeRegistry::new("edge");
        assert_eq!(registry.find_or_create([0, 1]), 0);
        registry.find_or_create([1, 0]);
        registry.find_or_create([1, 2]);
        assert_eq!(registry.remove(&[0, 1]).unwrap(), 1);
        assert_eq!(registry.remove_isolated().unwrap(), vec![0, 1]);
        assert_eq!(registry.remove(&[1, 0]).unwrap(), 0);
        let old2new = registry.remove_isolated().unwrap();
        assert_eq!(old2new, vec![NO_ID, 0]);
        assert_eq!(registry.find(&[0, 1]), None);
        assert_eq!(registry.find(&[2, 1]), Some(0));
        assert!(matches!(
            registry.remove(&[5, 6]),
            Err(MeshError::FacetNotFound(_))
        ));
    }

    #[test]
    fn update_vertex_keeps_index_and_attributes() {
        let mut registry = EdgeRegistry::new("edge");
        let e = registry.find_or_create([4, 9]);
        registry
            .attributes_mut()
            .find_or_create_variable("fault", false)
            .unwrap()
            .set_value(e, true);
        assert_eq!(registry.update_vertex(&[4, 9], 1, 2).unwrap(), e);
        assert_eq!(registry.find(&[2, 4]), Some(e));
        assert_eq!(registry.find(&[4, 9]), None);
        assert!(*registry.attributes().variable::<bool>("fault").unwrap().value(e));
    }

    #[test]
    fn update_vertex_of_shared_edge_splits_it() {
        let mut registry = EdgeRegistry::new("edge");
        let shared = registry.find_or_create([0, 1]);
        registry.find_or_create([1, 0]);
        let moved = registry.update_vertex(&[0, 1], 0, 5).unwrap();
        assert_ne!(moved, shared);
        assert_eq!(registry.counter(shared), 1);
        assert_eq!(registry.counter(moved), 1);
        // Merging into an existing loop.
        assert_eq!(registry.update_vertex(&[1, 5], 1, 0).unwrap(), shared);
        assert_eq!(registry.counter(shared), 2);
        assert_eq!(registry.counter(moved), 0);
    }

    #[test]
    fn vertex_deletion_drops_touching_facets() {
        let mut registry = PolyhedronFacetRegistry::new("facet");
        registry.find_or_create(vec![0, 1, 2]);
        registry.find_or_create(vec![1, 2, 3]);
        registry.find_or_create(vec![2, 3, 4, 5]);
        let vertex_old2new = index::mapping_after_deletion(&[true, false, false, false, false, false]);
        let old2new = registry.update_vertices(&vertex_old2new).unwrap();
        assert_eq!(old2new, vec![NO_ID, 0, 1]);
        assert_eq!(registry.find(&vec![0, 1, 2]), Some(0));
        assert_eq!(registry.facet_vertices(1), &vec![1, 2, 3, 4]);
        registry.validate_invariants().unwrap();
    }

    #[test]
    fn permute_and_copy() {
        let mut registry = EdgeRegistry::new("edge");
        registry.find_or_create([0, 1]);
        registry.find_or_create([1, 2]);
        registry.find_or_create([2, 0]);
        assert_eq!(registry.permute(&[2, 0, 1]).unwrap(), vec![1, 2, 0]);
        assert_eq!(registry.find(&[0, 2]), Some(0));
        assert!(registry.permute(&[0, 0, 1]).is_err());

        let mut copy = EdgeRegistry::new("edge");
        copy.copy_from(&registry).unwrap();
        assert_eq!(copy.find(&[1, 0]), Some(1));
        assert!(matches!(
            copy.copy_from(&registry),
            Err(MeshError::NonEmptyTarget { kind: "edge", len: 3 })
        ));
    }

    #[test]
    fn sync_registry_deduplicates_across_threads() {
        let shared = SyncFacetRegistry::new(EdgeRegistry::new("edge"));
        std::thread::scope(|s| {
            for t in 0..4 {
                let shared = &shared;
                s.spawn(move || {
                    for v in 0..16 {
                        if t % 2 == 0 {
                            shared.find_or_create([v, v + 1]);
                        } else {
                            shared.find_or_create([v + 1, v]);
                        }
                    }
                });
            }
        });
        let registry = shared.into_inner();
        assert_eq!(registry.nb_facets(), 16);
        assert!((0..16).all(|e| registry.counter(e) == 4));
    }
}
