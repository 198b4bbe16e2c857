//! PointSet: vertices with coordinates and nothing else.

use serde::{Deserialize, Serialize};

use crate::data::attribute::{AttributeKey, AttributeLinearInterpolation};
use crate::data::attribute_store::AttributeStore;
use crate::data::registry::AttributeRegistry;
use crate::debug_invariants::DebugInvariants;
use crate::mesh::passkey::BuilderKey;
use crate::mesh::point::{CoordinateProvider, Point};
use crate::mesh::snapshot::MeshSnapshot;
use crate::mesh::vertices::{MeshVertices, VerticesRecord};
use crate::mesh_error::MeshError;

/// Unconnected points in `D` dimensions.
#[derive(Clone, Debug, Default)]
pub struct PointSet<const D: usize> {
    vertices: MeshVertices<D>,
}

pub type PointSet2D = PointSet<2>;
pub type PointSet3D = PointSet<3>;

impl<const D: usize> PointSet<D> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn builder(&mut self) -> PointSetBuilder<'_, D> {
        PointSetBuilder { set: self }
    }

    pub fn nb_vertices(&self) -> usize {
        self.vertices.len()
    }

    pub fn point(&self, vertex: usize) -> &Point<D> {
        self.vertices.point(vertex)
    }

    pub fn points(&self) -> &[Point<D>] {
        self.vertices.points()
    }

    pub fn vertex_attributes(&self) -> &AttributeStore {
        self.vertices.attributes()
    }

    pub fn vertex_attributes_mut(&mut self) -> &mut AttributeStore {
        self.vertices.attributes_mut()
    }

    pub fn create_points(&mut self, points: &[Point<D>], _: BuilderKey) -> usize {
        self.vertices.create_points(points)
    }

    pub fn create_vertices(&mut self, count: usize, _: BuilderKey) -> usize {
        self.vertices.create_vertices(count)
    }

    pub fn set_point(&mut self, vertex: usize, point: Point<D>, _: BuilderKey) {
        self.vertices.set_point(vertex, point);
    }

    pub fn delete_vertices(
        &mut self,
        to_delete: &[bool],
        _: BuilderKey,
    ) -> Result<Vec<usize>, MeshError> {
        let old2new = self.vertices.delete(to_delete)?;
        self.debug_assert_invariants();
        Ok(old2new)
    }

    pub fn permute_vertices(
        &mut self,
        permutation: &[usize],
        _: BuilderKey,
    ) -> Result<Vec<usize>, MeshError> {
        self.vertices.permute(permutation)
    }

    pub fn copy_from(&mut self, other: &PointSet<D>, _: BuilderKey) -> Result<(), MeshError> {
        self.vertices.copy_from(&other.vertices)
    }
}

/// Structural editor of a [`PointSet`].
#[derive(Debug)]
pub struct PointSetBuilder<'a, const D: usize> {
    set: &'a mut PointSet<D>,
}

impl<const D: usize> PointSetBuilder<'_, D> {
    pub fn create_point(&mut self, point: Point<D>) -> usize {
        self.set.create_points(&[point], BuilderKey::new())
    }

    pub fn create_points(&mut self, points: &[Point<D>]) -> usize {
        self.set.create_points(points, BuilderKey::new())
    }

    pub fn create_vertices(&mut self, count: usize) -> usize {
        self.set.create_vertices(count, BuilderKey::new())
    }

    pub fn set_point(&mut self, vertex: usize, point: Point<D>) {
        self.set.set_point(vertex, point, BuilderKey::new());
    }

    pub fn delete_vertices(&mut self, to_delete: &[bool]) -> Result<Vec<usize>, MeshError> {
        self.set.delete_vertices(to_delete, BuilderKey::new())
    }

    pub fn permute_vertices(&mut self, permutation: &[usize]) -> Result<Vec<usize>, MeshError> {
        self.set.permute_vertices(permutation, BuilderKey::new())
    }

    pub fn copy(&mut self, other: &PointSet<D>) -> Result<(), MeshError> {
        self.set.copy_from(other, BuilderKey::new())
    }

    pub fn assign_vertex_attribute_value(&mut self, from: usize, to: usize) {
        self.set
            .vertex_attributes_mut()
            .assign_attribute_value(from, to, AttributeKey::new());
    }

    pub fn interpolate_vertex_attribute_value(
        &mut self,
        interpolation: &AttributeLinearInterpolation,
        to: usize,
    ) {
        self.set
            .vertex_attributes_mut()
            .interpolate_attribute_value(interpolation, to, AttributeKey::new());
    }
}

impl<const D: usize> CoordinateProvider<D> for PointSet<D> {
    fn nb_points(&self) -> usize {
        self.nb_vertices()
    }

    fn point(&self, vertex: usize) -> &Point<D> {
        self.vertices.point(vertex)
    }
}

impl<const D: usize> DebugInvariants for PointSet<D> {
    fn validate_invariants(&self) -> Result<(), MeshError> {
        self.vertices.validate_invariants()
    }
}

/// Persisted form of a [`PointSet`].
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PointSetRecord<const D: usize> {
    pub vertices: VerticesRecord<D>,
}

impl<const D: usize> MeshSnapshot for PointSet<D> {
    type Record = PointSetRecord<D>;

    fn to_snapshot(&self) -> Result<Self::Record, MeshError> {
        Ok(PointSetRecord {
            vertices: self.vertices.to_record()?,
        })
    }

    fn from_snapshot(record: Self::Record, registry: &AttributeRegistry) -> Result<Self, MeshError> {
        Ok(Self {
            vertices: MeshVertices::from_record(record.vertices, registry)?,
        })
    }
}
