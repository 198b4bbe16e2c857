//! EntityIndexSet: the dense index range of one entity kind.
//!
//! A set owns the range `[0, n)` of one homogeneous kind of entity (vertices,
//! edges, polygons, polyhedra, registry facets) together with its
//! [`AttributeStore`]. Creation appends contiguous indices; deletion compacts
//! immediately (no tombstones) and permutation reorders. Both return the
//! `old2new` mapping dependents need to remap their references.

use crate::data::attribute::AttributeKey;
use crate::data::attribute_store::AttributeStore;
use crate::debug_invariants::DebugInvariants;
use crate::mesh_error::MeshError;

/// Dense index range plus the attributes attached to it.
#[derive(Clone, Debug)]
pub struct EntityIndexSet {
    kind: &'static str,
    attributes: AttributeStore,
}

impl EntityIndexSet {
    /// Empty set; `kind` names the entities in error messages ("vertex", "polygon", ..).
    pub fn new(kind: &'static str) -> Self {
        Self {
            kind,
            attributes: AttributeStore::new(),
        }
    }

    pub fn kind(&self) -> &'static str {
        self.kind
    }

    /// Number of live entities.
    #[inline]
    pub fn len(&self) -> usize {
        self.attributes.nb_elements()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn attributes(&self) -> &AttributeStore {
        &self.attributes
    }

    /// Attribute access for value edits and column management; the element
    /// count itself only changes through this set.
    pub fn attributes_mut(&mut self) -> &mut AttributeStore {
        &mut self.attributes
    }

    /// Append one entity, returning its index.
    pub fn create(&mut self) -> usize {
        self.create_many(1)
    }

    /// Append `count` contiguous entities, returning the first new index.
    pub fn create_many(&mut self, count: usize) -> usize {
        self.attributes.create_elements(count, AttributeKey::new())
    }

    pub fn reserve(&mut self, capacity: usize) {
        self.attributes.reserve(capacity, AttributeKey::new());
    }

    /// Remove every entity flagged in `to_delete` and compact the range.
    ///
    /// # Errors
    /// `MaskLengthMismatch` if the mask does not have one entry per entity.
    pub fn delete(&mut self, to_delete: &[bool]) -> Result<Vec<usize>, MeshError> {
        let old2new = self
            .attributes
            .delete_elements(to_delete, AttributeKey::new())?;
        log::trace!(
            "deleted {} {} entities, {} left",
            old2new.len() - self.len(),
            self.kind,
            self.len()
        );
        Ok(old2new)
    }

    /// Reorder the range; `permutation[new] = old`.
    ///
    /// # Errors
    /// `InvalidPermutation` if `permutation` is not a bijection on `[0, len)`.
    pub fn permute(&mut self, permutation: &[usize]) -> Result<Vec<usize>, MeshError> {
        self.attributes
            .permute_elements(permutation, AttributeKey::new())
    }

    /// Become a copy of `other`.
    ///
    /// # Errors
    /// `NonEmptyTarget` if this set already holds entities.
    pub fn copy_from(&mut self, other: &EntityIndexSet) -> Result<(), MeshError> {
        if !self.is_empty() {
            return Err(MeshError::NonEmptyTarget {
                kind: self.kind,
                len: self.len(),
            });
        }
        self.attributes
            .copy_from(&other.attributes, AttributeKey::new())
    }
}

impl DebugInvariants for EntityIndexSet {
    fn validate_invariants(&self) -> Result<(), MeshError> {
        self.attributes.validate_invariants()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::index::NO_ID;

    fn vertices_with_ids(n: usize) -> EntityIndexSet {
        let mut set = EntityIndexSet::new("vertex");
        set.create_many(n);
        let ids = set
            .attributes_mut()
            .find_or_create_variable("id", 0usize)
            .unwrap();
        for i in 0..n {
            ids.set_value(i, 100 + i);
        }
        set
    }

    #[test]
    fn create_returns_first_index() {
        let mut set = EntityIndexSet::new("edge");
        assert_eq!(set.create(), 0);
        assert_eq!(set.create_many(3), 1);
        assert_eq!(set.create_many(0), 4);
        assert_eq!(set.len(), 4);
    }

    #[test]
    fn delete_first_of_six() {
        let mut set = vertices_with_ids(6);
        let mut mask = vec![false; 6];
        mask[0] = true;
        let old2new = set.delete(&mask).unwrap();
        assert_eq!(set.len(), 5);
        assert_eq!(old2new[0], NO_ID);
        let ids = set.attributes().variable::<usize>("id").unwrap();
        assert_eq!(*ids.value(old2new[5]), 105);
    }

    #[test]
    fn non_bijective_permutation_is_rejected() {
        let mut set = vertices_with_ids(3);
        assert!(matches!(
            set.permute(&[1, 1, 2]),
            Err(MeshError::InvalidPermutation(_))
        ));
        let old2new = set.permute(&[1, 2, 0]).unwrap();
        assert_eq!(old2new, vec![2, 0, 1]);
        let ids = set.attributes().variable::<usize>("id").unwrap();
        assert_eq!(ids.values(), &[101, 102, 100]);
    }

    #[test]
    fn copy_into_non_empty_set_fails() {
        let source = vertices_with_ids(2);
        let mut target = EntityIndexSet::new("vertex");
        target.copy_from(&source).unwrap();
        assert_eq!(target.len(), 2);
        assert_eq!(
            target.copy_from(&source),
            Err(MeshError::NonEmptyTarget {
                kind: "vertex",
                len: 2
            })
        );
    }
}
