//! Builders: the only way outside code edits mesh structure.
//!
//! A builder holds the unique `&mut` borrow of its mesh and forwards every
//! call with a fresh [`BuilderKey`]. While it lives, nothing else can read or
//! write the mesh; drop it (or let it go out of scope) to read again.

use crate::algs::adjacency::{AdjacencyOptions, AdjacencySummary};
use crate::data::attribute::{AttributeKey, AttributeLinearInterpolation};
use crate::mesh::element::{ElementShape, Polygonal, Polyhedral, TETRAHEDRON_FACETS};
use crate::mesh::element_mesh::ElementMesh;
use crate::mesh::passkey::BuilderKey;
use crate::mesh::point::Point;
use crate::mesh_error::MeshError;

/// Structural editor of an [`ElementMesh`].
#[derive(Debug)]
pub struct MeshBuilder<'a, S: ElementShape, const D: usize> {
    mesh: &'a mut ElementMesh<S, D>,
}

pub type SurfaceMeshBuilder<'a, const D: usize> = MeshBuilder<'a, Polygonal, D>;
pub type SolidMeshBuilder<'a, const D: usize> = MeshBuilder<'a, Polyhedral, D>;

impl<'a, S: ElementShape, const D: usize> MeshBuilder<'a, S, D> {
    pub fn new(mesh: &'a mut ElementMesh<S, D>) -> Self {
        Self { mesh }
    }

    /// Read access to the mesh being built.
    pub fn mesh(&self) -> &ElementMesh<S, D> {
        self.mesh
    }

    pub fn create_point(&mut self, point: Point<D>) -> usize {
        self.mesh.create_points(&[point], BuilderKey::new())
    }

    /// Append `points`; returns the index of the first one.
    pub fn create_points(&mut self, points: &[Point<D>]) -> usize {
        self.mesh.create_points(points, BuilderKey::new())
    }

    /// Append `count` vertices at the origin.
    pub fn create_vertices(&mut self, count: usize) -> usize {
        self.mesh.create_vertices(count, BuilderKey::new())
    }

    pub fn set_point(&mut self, vertex: usize, point: Point<D>) {
        self.mesh.set_point(vertex, point, BuilderKey::new());
    }

    pub fn reserve_vertices(&mut self, capacity: usize) {
        self.mesh.reserve_vertices(capacity, BuilderKey::new());
    }

    pub fn reserve_elements(&mut self, capacity: usize) {
        self.mesh.reserve_elements(capacity, BuilderKey::new());
    }

    pub fn create_element(
        &mut self,
        vertices: Vec<usize>,
        layout: S::Layout,
    ) -> Result<usize, MeshError> {
        self.mesh.create_element(vertices, layout, BuilderKey::new())
    }

    pub fn set_element_vertex(
        &mut self,
        element: usize,
        local: usize,
        vertex: usize,
    ) -> Result<(), MeshError> {
        self.mesh
            .set_element_vertex(element, local, vertex, BuilderKey::new())
    }

    pub fn replace_vertex(&mut self, old_vertex: usize, new_vertex: usize) -> Result<(), MeshError> {
        self.mesh
            .replace_vertex(old_vertex, new_vertex, BuilderKey::new())
    }

    pub fn set_adjacent(&mut self, element: usize, facet: usize, adjacent: usize) {
        self.mesh
            .set_adjacent(element, facet, adjacent, BuilderKey::new());
    }

    pub fn unset_adjacent(&mut self, element: usize, facet: usize) {
        self.mesh.unset_adjacent(element, facet, BuilderKey::new());
    }

    /// Adjacencies of every element, failing on non-manifold facets.
    pub fn compute_adjacencies(&mut self) -> Result<AdjacencySummary, MeshError> {
        self.compute_adjacencies_with(AdjacencyOptions::default())
    }

    pub fn compute_adjacencies_with(
        &mut self,
        options: AdjacencyOptions,
    ) -> Result<AdjacencySummary, MeshError> {
        self.mesh.compute_adjacencies(options, BuilderKey::new())
    }

    /// Adjacencies among `elements` only.
    pub fn compute_adjacencies_for(
        &mut self,
        elements: &[usize],
        options: AdjacencyOptions,
    ) -> Result<AdjacencySummary, MeshError> {
        self.mesh
            .compute_adjacencies_for(elements, options, BuilderKey::new())
    }

    pub fn delete_elements(&mut self, to_delete: &[bool]) -> Result<Vec<usize>, MeshError> {
        self.mesh.delete_elements(to_delete, BuilderKey::new())
    }

    pub fn permute_elements(&mut self, permutation: &[usize]) -> Result<Vec<usize>, MeshError> {
        self.mesh.permute_elements(permutation, BuilderKey::new())
    }

    pub fn delete_vertices(&mut self, to_delete: &[bool]) -> Result<Vec<usize>, MeshError> {
        self.mesh.delete_vertices(to_delete, BuilderKey::new())
    }

    /// Delete the vertices no element uses; returns the vertex `old2new`.
    pub fn delete_isolated_vertices(&mut self) -> Result<Vec<usize>, MeshError> {
        self.mesh.delete_isolated_vertices(BuilderKey::new())
    }

    pub fn permute_vertices(&mut self, permutation: &[usize]) -> Result<Vec<usize>, MeshError> {
        self.mesh.permute_vertices(permutation, BuilderKey::new())
    }

    pub fn copy(&mut self, other: &ElementMesh<S, D>) -> Result<(), MeshError> {
        self.mesh.copy_from(other, BuilderKey::new())
    }

    /// Copy every assignable vertex attribute value of `from` into `to`.
    pub fn assign_vertex_attribute_value(&mut self, from: usize, to: usize) {
        self.mesh
            .vertex_attributes_mut()
            .assign_attribute_value(from, to, AttributeKey::new());
    }

    /// Fill every interpolable vertex attribute of `to` from other vertices.
    pub fn interpolate_vertex_attribute_value(
        &mut self,
        interpolation: &AttributeLinearInterpolation,
        to: usize,
    ) {
        self.mesh
            .vertex_attributes_mut()
            .interpolate_attribute_value(interpolation, to, AttributeKey::new());
    }

    pub fn assign_element_attribute_value(&mut self, from: usize, to: usize) {
        self.mesh
            .element_attributes_mut()
            .assign_attribute_value(from, to, AttributeKey::new());
    }
}

impl<const D: usize> MeshBuilder<'_, Polygonal, D> {
    pub fn create_polygon(&mut self, vertices: &[usize]) -> Result<usize, MeshError> {
        self.create_element(vertices.to_vec(), ())
    }

    pub fn create_triangle(&mut self, vertices: [usize; 3]) -> Result<usize, MeshError> {
        self.create_polygon(&vertices)
    }

    /// Register every polygon edge; no-op if already enabled.
    pub fn enable_edges(&mut self) {
        self.mesh.enable_facet_registry(BuilderKey::new());
    }

    pub fn disable_edges(&mut self) {
        self.mesh.disable_facet_registry(BuilderKey::new());
    }
}

impl<const D: usize> MeshBuilder<'_, Polyhedral, D> {
    /// Polyhedron with explicit facets given as local vertex positions.
    pub fn create_polyhedron(
        &mut self,
        vertices: &[usize],
        facets: Vec<Vec<usize>>,
    ) -> Result<usize, MeshError> {
        self.create_element(vertices.to_vec(), facets)
    }

    pub fn create_tetrahedron(&mut self, vertices: [usize; 4]) -> Result<usize, MeshError> {
        let facets = TETRAHEDRON_FACETS.iter().map(|f| f.to_vec()).collect();
        self.create_polyhedron(&vertices, facets)
    }

    /// Register every polyhedron facet; no-op if already enabled.
    pub fn enable_facets(&mut self) {
        self.mesh.enable_facet_registry(BuilderKey::new());
    }

    pub fn disable_facets(&mut self) {
        self.mesh.disable_facet_registry(BuilderKey::new());
    }

    /// Register every polyhedron edge; no-op if already enabled.
    pub fn enable_edges(&mut self) {
        self.mesh.enable_edge_registry(BuilderKey::new());
    }

    pub fn disable_edges(&mut self) {
        self.mesh.disable_edge_registry(BuilderKey::new());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::element_mesh::{SolidMesh3D, SurfaceMesh3D};
    use crate::topology::index::NO_ID;

    #[test]
    fn builder_reports_through_mesh() {
        let mut mesh = SurfaceMesh3D::new();
        let mut builder = mesh.builder();
        let first = builder.create_vertices(4);
        assert_eq!(first, 0);
        builder.set_point(3, Point::new([1.0, 1.0, 0.0]));
        builder.create_triangle([0, 1, 3]).unwrap();
        assert_eq!(builder.mesh().nb_polygons(), 1);
        assert_eq!(mesh.point(3), &Point::new([1.0, 1.0, 0.0]));
    }

    #[test]
    fn isolated_vertices_are_deleted() {
        let mut mesh = SurfaceMesh3D::new();
        let mut builder = mesh.builder();
        builder.create_vertices(6);
        builder.create_triangle([1, 3, 4]).unwrap();
        let old2new = builder.delete_isolated_vertices().unwrap();
        assert_eq!(old2new, vec![NO_ID, 0, NO_ID, 1, 2, NO_ID]);
        assert_eq!(mesh.nb_vertices(), 3);
        assert_eq!(mesh.polygon_vertices(0), &[0, 1, 2]);

        let old2new = mesh.builder().delete_isolated_vertices().unwrap();
        assert_eq!(old2new, vec![0, 1, 2]);
    }

    #[test]
    fn vertex_attributes_are_assigned_and_interpolated() {
        let mut mesh = SolidMesh3D::new();
        mesh.builder().create_vertices(3);
        mesh.vertex_attributes_mut()
            .find_or_create_interpolable_variable("depth", 0.0f64)
            .unwrap()
            .set_value(0, 10.0);
        mesh.vertex_attributes_mut()
            .variable_mut::<f64>("depth")
            .unwrap()
            .set_value(1, 20.0);

        let mut builder = mesh.builder();
        let interpolation = AttributeLinearInterpolation::new(vec![0, 1], vec![0.5, 0.5]).unwrap();
        builder.interpolate_vertex_attribute_value(&interpolation, 2);
        let depth = mesh.vertex_attributes().variable::<f64>("depth").unwrap();
        assert_eq!(depth.value(2), &15.0);
    }
}
