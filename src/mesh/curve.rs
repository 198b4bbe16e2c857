//! EdgedCurve: vertices joined by straight edges.
//!
//! Edges are plain vertex pairs with no orientation constraint; a curve can
//! branch or leave vertices isolated.

use serde::{Deserialize, Serialize};

use crate::data::attribute::{AttributeKey, AttributeValue, ReadOnlyAttribute};
use crate::data::attribute_store::AttributeStore;
use crate::data::registry::{AttributeRegistry, StoreRecord};
use crate::debug_invariants::{DebugInvariants, ensure};
use crate::mesh::passkey::BuilderKey;
use crate::mesh::point::{CoordinateProvider, Point};
use crate::mesh::snapshot::MeshSnapshot;
use crate::mesh::vertices::{MeshVertices, VerticesRecord};
use crate::mesh_error::MeshError;
use crate::topology::entity_set::EntityIndexSet;
use crate::topology::index;

/// Polyline network in `D` dimensions.
#[derive(Clone, Debug)]
pub struct EdgedCurve<const D: usize> {
    vertices: MeshVertices<D>,
    edges: EntityIndexSet,
    edge_vertices: Vec<[usize; 2]>,
}

pub type EdgedCurve2D = EdgedCurve<2>;
pub type EdgedCurve3D = EdgedCurve<3>;

impl<const D: usize> Default for EdgedCurve<D> {
    fn default() -> Self {
        Self {
            vertices: MeshVertices::default(),
            edges: EntityIndexSet::new("edge"),
            edge_vertices: Vec::new(),
        }
    }
}

impl<const D: usize> EdgedCurve<D> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn builder(&mut self) -> CurveBuilder<'_, D> {
        CurveBuilder { curve: self }
    }

    pub fn nb_vertices(&self) -> usize {
        self.vertices.len()
    }

    pub fn nb_edges(&self) -> usize {
        self.edge_vertices.len()
    }

    pub fn point(&self, vertex: usize) -> &Point<D> {
        self.vertices.point(vertex)
    }

    pub fn edge_vertices(&self, edge: usize) -> [usize; 2] {
        debug_assert!(edge < self.nb_edges(), "edge {edge} out of range");
        self.edge_vertices[edge]
    }

    /// Edges with `vertex` as an end point.
    pub fn edges_around_vertex(&self, vertex: usize) -> Vec<usize> {
        self.edge_vertices
            .iter()
            .enumerate()
            .filter(|(_, ends)| ends.contains(&vertex))
            .map(|(edge, _)| edge)
            .collect()
    }

    pub fn edge_length(&self, edge: usize) -> f64 {
        let [a, b] = self.edge_vertices(edge);
        self.point(a).distance(self.point(b))
    }

    pub fn edge_barycenter(&self, edge: usize) -> Point<D> {
        let [a, b] = self.edge_vertices(edge);
        (*self.point(a) + *self.point(b)) / 2.0
    }

    pub fn vertex_attributes(&self) -> &AttributeStore {
        self.vertices.attributes()
    }

    pub fn vertex_attributes_mut(&mut self) -> &mut AttributeStore {
        self.vertices.attributes_mut()
    }

    pub fn edge_attributes(&self) -> &AttributeStore {
        self.edges.attributes()
    }

    pub fn edge_attributes_mut(&mut self) -> &mut AttributeStore {
        self.edges.attributes_mut()
    }

    /// Value of vertex attribute `name` at `vertex`.
    pub fn vertex_attribute<T: AttributeValue>(&self, name: &str, vertex: usize) -> Result<&T, MeshError> {
        Ok(self.vertex_attributes().find_attribute::<T>(name)?.value(vertex))
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

    /// # Errors
    /// `InvalidElement` if an end vertex does not exist or both ends coincide.
    pub fn create_edge(&mut self, ends: [usize; 2], _: BuilderKey) -> Result<usize, MeshError> {
        if let Some(&bad) = ends.iter().find(|&&v| v >= self.nb_vertices()) {
            return Err(MeshError::InvalidElement(format!(
                "edge uses vertex {bad} of {}",
                self.nb_vertices()
            )));
        }
        if ends[0] == ends[1] {
            return Err(MeshError::InvalidElement(format!(
                "degenerate edge on vertex {}",
                ends[0]
            )));
        }
        let id = self.edges.create();
        self.edge_vertices.push(ends);
        Ok(id)
    }

    pub fn set_edge_vertex(&mut self, edge: usize, end: usize, vertex: usize, _: BuilderKey) {
        debug_assert!(vertex < self.nb_vertices() && end < 2);
        self.edge_vertices[edge][end] = vertex;
    }

    pub fn delete_edges(&mut self, to_delete: &[bool], _: BuilderKey) -> Result<Vec<usize>, MeshError> {
        self.do_delete_edges(to_delete)
    }

    fn do_delete_edges(&mut self, to_delete: &[bool]) -> Result<Vec<usize>, MeshError> {
        let old2new = self.edges.delete(to_delete)?;
        index::compact(&mut self.edge_vertices, to_delete);
        self.debug_assert_invariants();
        Ok(old2new)
    }

    pub fn permute_edges(&mut self, permutation: &[usize], _: BuilderKey) -> Result<Vec<usize>, MeshError> {
        let old2new = self.edges.permute(permutation)?;
        index::permute(&mut self.edge_vertices, permutation);
        Ok(old2new)
    }

    /// Delete the flagged vertices and every edge touching one of them.
    pub fn delete_vertices(
        &mut self,
        to_delete: &[bool],
        _: BuilderKey,
    ) -> Result<Vec<usize>, MeshError> {
        index::check_mask(to_delete, self.nb_vertices())?;
        let dead_edges: Vec<bool> = self
            .edge_vertices
            .iter()
            .map(|ends| ends.iter().any(|&v| to_delete[v]))
            .collect();
        if dead_edges.contains(&true) {
            self.do_delete_edges(&dead_edges)?;
        }
        let old2new = self.vertices.delete(to_delete)?;
        self.remap_vertices(&old2new);
        self.debug_assert_invariants();
        Ok(old2new)
    }

    /// Delete every vertex no edge uses.
    pub fn delete_isolated_vertices(&mut self, key: BuilderKey) -> Result<Vec<usize>, MeshError> {
        let mut isolated = vec![true; self.nb_vertices()];
        for &v in self.edge_vertices.iter().flatten() {
            isolated[v] = false;
        }
        self.delete_vertices(&isolated, key)
    }

    pub fn permute_vertices(
        &mut self,
        permutation: &[usize],
        _: BuilderKey,
    ) -> Result<Vec<usize>, MeshError> {
        let old2new = self.vertices.permute(permutation)?;
        self.remap_vertices(&old2new);
        Ok(old2new)
    }

    pub fn copy_from(&mut self, other: &EdgedCurve<D>, _: BuilderKey) -> Result<(), MeshError> {
        self.vertices.copy_from(&other.vertices)?;
        self.edges.copy_from(&other.edges)?;
        self.edge_vertices = other.edge_vertices.clone();
        Ok(())
    }

    fn remap_vertices(&mut self, old2new: &[usize]) {
        for v in self.edge_vertices.iter_mut().flatten() {
            *v = old2new[*v];
        }
    }
}

/// Structural editor of an [`EdgedCurve`].
#[derive(Debug)]
pub struct CurveBuilder<'a, const D: usize> {
    curve: &'a mut EdgedCurve<D>,
}

impl<const D: usize> CurveBuilder<'_, D> {
    pub fn create_point(&mut self, point: Point<D>) -> usize {
        self.curve.create_points(&[point], BuilderKey::new())
    }

    pub fn create_points(&mut self, points: &[Point<D>]) -> usize {
        self.curve.create_points(points, BuilderKey::new())
    }

    pub fn create_vertices(&mut self, count: usize) -> usize {
        self.curve.create_vertices(count, BuilderKey::new())
    }

    pub fn set_point(&mut self, vertex: usize, point: Point<D>) {
        self.curve.set_point(vertex, point, BuilderKey::new());
    }

    pub fn create_edge(&mut self, v0: usize, v1: usize) -> Result<usize, MeshError> {
        self.curve.create_edge([v0, v1], BuilderKey::new())
    }

    /// Create one edge per consecutive pair of `vertices`; returns the first edge.
    pub fn create_polyline(&mut self, vertices: &[usize]) -> Result<usize, MeshError> {
        let first = self.curve.nb_edges();
        for pair in vertices.windows(2) {
            self.create_edge(pair[0], pair[1])?;
        }
        Ok(first)
    }

    pub fn set_edge_vertex(&mut self, edge: usize, end: usize, vertex: usize) {
        self.curve
            .set_edge_vertex(edge, end, vertex, BuilderKey::new());
    }

    pub fn delete_edges(&mut self, to_delete: &[bool]) -> Result<Vec<usize>, MeshError> {
        self.curve.delete_edges(to_delete, BuilderKey::new())
    }

    pub fn permute_edges(&mut self, permutation: &[usize]) -> Result<Vec<usize>, MeshError> {
        self.curve.permute_edges(permutation, BuilderKey::new())
    }

    pub fn delete_vertices(&mut self, to_delete: &[bool]) -> Result<Vec<usize>, MeshError> {
        self.curve.delete_vertices(to_delete, BuilderKey::new())
    }

    pub fn delete_isolated_vertices(&mut self) -> Result<Vec<usize>, MeshError> {
        self.curve.delete_isolated_vertices(BuilderKey::new())
    }

    pub fn permute_vertices(&mut self, permutation: &[usize]) -> Result<Vec<usize>, MeshError> {
        self.curve.permute_vertices(permutation, BuilderKey::new())
    }

    pub fn copy(&mut self, other: &EdgedCurve<D>) -> Result<(), MeshError> {
        self.curve.copy_from(other, BuilderKey::new())
    }

    pub fn assign_vertex_attribute_value(&mut self, from: usize, to: usize) {
        self.curve
            .vertex_attributes_mut()
            .assign_attribute_value(from, to, AttributeKey::new());
    }
}

impl<const D: usize> CoordinateProvider<D> for EdgedCurve<D> {
    fn nb_points(&self) -> usize {
        self.nb_vertices()
    }

    fn point(&self, vertex: usize) -> &Point<D> {
        self.vertices.point(vertex)
    }
}

impl<const D: usize> DebugInvariants for EdgedCurve<D> {
    fn validate_invariants(&self) -> Result<(), MeshError> {
        self.vertices.validate_invariants()?;
        self.edges.validate_invariants()?;
        ensure(self.edges.len() == self.edge_vertices.len(), || {
            format!(
                "{} edge entities for {} edges",
                self.edges.len(),
                self.edge_vertices.len()
            )
        })?;
        let nb_vertices = self.nb_vertices();
        ensure(
            self.edge_vertices.iter().flatten().all(|&v| v < nb_vertices),
            || "an edge references a missing vertex".to_string(),
        )
    }
}

/// Persisted form of an [`EdgedCurve`].
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct EdgedCurveRecord<const D: usize> {
    pub vertices: VerticesRecord<D>,
    pub edges: Vec<[usize; 2]>,
    pub edge_attributes: StoreRecord,
}

impl<const D: usize> MeshSnapshot for EdgedCurve<D> {
    type Record = EdgedCurveRecord<D>;

    fn to_snapshot(&self) -> Result<Self::Record, MeshError> {
        Ok(EdgedCurveRecord {
            vertices: self.vertices.to_record()?,
            edges: self.edge_vertices.clone(),
            edge_attributes: self.edge_attributes().to_record()?,
        })
    }

    fn from_snapshot(record: Self::Record, registry: &AttributeRegistry) -> Result<Self, MeshError> {
        let mut curve = Self {
            vertices: MeshVertices::from_record(record.vertices, registry)?,
            ..Self::default()
        };
        curve.edges.create_many(record.edges.len());
        let attributes = AttributeStore::from_record(record.edge_attributes, registry)?;
        ensure(attributes.nb_elements() == record.edges.len(), || {
            format!(
                "{} edge attribute slots for {} edges",
                attributes.nb_elements(),
                record.edges.len()
            )
        })?;
        *curve.edges.attributes_mut() = attributes;
        curve.edge_vertices = record.edges;
        curve.validate_invariants()?;
        Ok(curve)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn zigzag() -> EdgedCurve2D {
        let mut curve = EdgedCurve2D::new();
        let mut builder = curve.builder();
        builder.create_points(&[
            Point::new([0.0, 0.0]),
            Point::new([3.0, 4.0]),
            Point::new([6.0, 0.0]),
            Point::new([9.0, 4.0]),
        ]);
        builder.create_polyline(&[0, 1, 2, 3]).unwrap();
        curve
    }

    #[test]
    fn polyline_edges_and_lengths() {
        let curve = zigzag();
        assert_eq!(curve.nb_edges(), 3);
        assert_eq!(curve.edge_length(1), 5.0);
        assert_eq!(curve.edges_around_vertex(2), vec![1, 2]);
        assert_eq!(curve.edge_barycenter(0), Point::new([1.5, 2.0]));
    }

    #[test]
    fn deleting_a_vertex_drops_incident_edges() {
        let mut curve = zigzag();
        curve.edge_attributes_mut()
            .find_or_create_variable("tag", 0u8)
            .unwrap()
            .set_value(2, 7);
        curve.builder().delete_vertices(&[false, true, false, false]).unwrap();
        assert_eq!(curve.nb_vertices(), 3);
        assert_eq!(curve.nb_edges(), 1);
        assert_eq!(curve.edge_vertices(0), [1, 2]);
        let tags = curve.edge_attributes().variable::<u8>("tag").unwrap();
        assert_eq!(tags.values(), &[7]);
    }

    #[test]
    fn unused_vertices_go_away() {
        let mut curve = zigzag();
        let mut builder = curve.builder();
        builder.create_point(Point::new([1.0, 1.0]));
        builder.delete_edges(&[true, false, false]).unwrap();
        let old2new = builder.delete_isolated_vertices().unwrap();
        assert_eq!(old2new, vec![index::NO_ID, 0, 1, 2, index::NO_ID]);
        assert_eq!(curve.nb_vertices(), 3);
        assert_eq!(curve.edge_vertices(0), [0, 1]);
        assert_eq!(curve.edge_vertices(1), [1, 2]);
    }

    #[test]
    fn degenerate_and_dangling_edges_are_rejected() {
        let mut curve = zigzag();
        let mut builder = curve.builder();
        assert!(builder.create_edge(1, 1).is_err());
        assert!(builder.create_edge(1, 9).is_err());
        assert_eq!(curve.nb_edges(), 3);
    }
}
