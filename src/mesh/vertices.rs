//! Vertex range with coordinates, shared by every concrete mesh.

use serde::{Deserialize, Serialize};

use crate::data::attribute_store::AttributeStore;
use crate::data::registry::{AttributeRegistry, StoreRecord};
use crate::debug_invariants::{DebugInvariants, ensure};
use crate::mesh::point::{CoordinateProvider, Point};
use crate::mesh_error::MeshError;
use crate::topology::entity_set::EntityIndexSet;
use crate::topology::index;

/// Vertices of a mesh: an index range, its attributes and one point each.
#[derive(Clone, Debug)]
pub struct MeshVertices<const D: usize> {
    set: EntityIndexSet,
    points: Vec<Point<D>>,
}

/// Persisted form of [`MeshVertices`].
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct VerticesRecord<const D: usize> {
    pub points: Vec<Point<D>>,
    pub attributes: StoreRecord,
}

impl<const D: usize> Default for MeshVertices<D> {
    fn default() -> Self {
        Self {
            set: EntityIndexSet::new("vertex"),
            points: Vec::new(),
        }
    }
}

impl<const D: usize> MeshVertices<D> {
    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn point(&self, vertex: usize) -> &Point<D> {
        debug_assert!(vertex < self.len(), "vertex {vertex} out of range");
        &self.points[vertex]
    }

    pub fn points(&self) -> &[Point<D>] {
        &self.points
    }

    pub fn attributes(&self) -> &AttributeStore {
        self.set.attributes()
    }

    pub fn attributes_mut(&mut self) -> &mut AttributeStore {
        self.set.attributes_mut()
    }

    pub(crate) fn create_points(&mut self, points: &[Point<D>]) -> usize {
        let first = self.set.create_many(points.len());
        self.points.extend_from_slice(points);
        first
    }

    pub(crate) fn create_vertices(&mut self, count: usize) -> usize {
        let first = self.set.create_many(count);
        self.points.resize(first + count, Point::origin());
        first
    }

    pub(crate) fn set_point(&mut self, vertex: usize, point: Point<D>) {
        debug_assert!(vertex < self.len(), "vertex {vertex} out of range");
        self.points[vertex] = point;
    }

    pub(crate) fn reserve(&mut self, capacity: usize) {
        self.set.reserve(capacity);
        self.points.reserve(capacity.saturating_sub(self.points.len()));
    }

    pub(crate) fn delete(&mut self, to_delete: &[bool]) -> Result<Vec<usize>, MeshError> {
        let old2new = self.set.delete(to_delete)?;
        index::compact(&mut self.points, to_delete);
        Ok(old2new)
    }

    pub(crate) fn permute(&mut self, permutation: &[usize]) -> Result<Vec<usize>, MeshError> {
        let old2new = self.set.permute(permutation)?;
        index::permute(&mut self.points, permutation);
        Ok(old2new)
    }

    pub(crate) fn copy_from(&mut self, other: &MeshVertices<D>) -> Result<(), MeshError> {
        self.set.copy_from(&other.set)?;
        self.points = other.points.clone();
        Ok(())
    }

    pub fn to_record(&self) -> Result<VerticesRecord<D>, MeshError> {
        Ok(VerticesRecord {
            points: self.points.clone(),
            attributes: self.attributes().to_record()?,
        })
    }

    pub(crate) fn from_record(
        record: VerticesRecord<D>,
        registry: &AttributeRegistry,
    ) -> Result<Self, MeshError> {
        let mut vertices = Self::default();
        vertices.create_points(&record.points);
        let attributes = AttributeStore::from_record(record.attributes, registry)?;
        ensure(attributes.nb_elements() == vertices.len(), || {
            format!(
                "{} vertex attribute slots for {} points",
                attributes.nb_elements(),
                vertices.len()
            )
        })?;
        *vertices.set.attributes_mut() = attributes;
        Ok(vertices)
    }
}

impl<const D: usize> CoordinateProvider<D> for MeshVertices<D> {
    fn nb_points(&self) -> usize {
        self.len()
    }

    fn point(&self, vertex: usize) -> &Point<D> {
        MeshVertices::point(self, vertex)
    }
}

impl<const D: usize> DebugInvariants for MeshVertices<D> {
    fn validate_invariants(&self) -> Result<(), MeshError> {
        ensure(self.set.len() == self.points.len(), || {
            format!("{} vertices, {} points", self.set.len(), self.points.len())
        })?;
        self.set.validate_invariants()
    }
}
