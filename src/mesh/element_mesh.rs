//! ElementMesh: vertices plus polygons or polyhedra.
//!
//! [`SurfaceMesh`] and [`SolidMesh`] are the two instantiations of one
//! engine, parameterised by an [`ElementShape`] and the point dimension `D`.
//! The mesh owns its connectivity (per-element vertex lists, facet layouts
//! and adjacency slots) next to the vertex and element
//! [`EntityIndexSet`]s. An optional [`FacetRegistry`] gives every distinct
//! edge (surfaces) or facet (solids) an index of its own; solids can also
//! register their edges. Registry entries live exactly as long as some
//! element uses them.
//!
//! Everything on `&self` is a read. Structural edits take a [`BuilderKey`];
//! use [`ElementMesh::builder`] to get one.
//!
//! Vertex indices stored in elements are plain indices into the vertex set.
//! Whenever the vertex set is compacted or permuted, element vertices,
//! registry loops and adjacency slots are remapped in the same call.

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::algs::adjacency::{self, AdjacencyOptions, AdjacencySummary, FacetProvider};
use crate::data::attribute::{AttributeValue, ReadOnlyAttribute};
use crate::data::attribute_store::AttributeStore;
use crate::data::registry::{AttributeRegistry, StoreRecord};
use crate::debug_invariants::{DebugInvariants, ensure};
use crate::mesh::builder::MeshBuilder;
use crate::mesh::element::{Element, ElementShape, Polygonal, Polyhedral};
use crate::mesh::mesh_elements::MeshElements;
use crate::mesh::passkey::BuilderKey;
use crate::mesh::point::{CoordinateProvider, Point};
use crate::mesh::snapshot::MeshSnapshot;
use crate::mesh::vertices::{MeshVertices, VerticesRecord};
use crate::mesh_error::MeshError;
use crate::topology::entity_set::EntityIndexSet;
use crate::topology::facet_registry::{
    EdgeRegistry, FacetRegistry, FacetRegistryRecord, PolyhedronFacetRegistry,
};
use crate::topology::index::{self, NO_ID};
use crate::topology::vertex_cycle::CycleVertices;

/// Mesh of elements of shape `S` over points of dimension `D`.
#[derive(Clone, Debug)]
pub struct ElementMesh<S: ElementShape, const D: usize> {
    vertices: MeshVertices<D>,
    elements: EntityIndexSet,
    connectivity: Vec<Element<S>>,
    facets: Option<FacetRegistry<S::Facet>>,
    /// Solid edges; always `None` on surfaces, whose facets are the edges.
    edges: Option<EdgeRegistry>,
}

/// Polygonal surface.
pub type SurfaceMesh<const D: usize> = ElementMesh<Polygonal, D>;
/// Polyhedral solid.
pub type SolidMesh<const D: usize> = ElementMesh<Polyhedral, D>;

pub type SurfaceMesh2D = SurfaceMesh<2>;
pub type SurfaceMesh3D = SurfaceMesh<3>;
pub type SolidMesh3D = SolidMesh<3>;

impl<S: ElementShape, const D: usize> Default for ElementMesh<S, D> {
    fn default() -> Self {
        Self {
            vertices: MeshVertices::default(),
            elements: EntityIndexSet::new(S::ELEMENT_KIND),
            connectivity: Vec::new(),
            facets: None,
            edges: None,
        }
    }
}

impl<S: ElementShape, const D: usize> ElementMesh<S, D> {
    pub fn new() -> Self {
        Self::default()
    }

    /// The unique builder of this mesh, alive as long as the borrow.
    pub fn builder(&mut self) -> MeshBuilder<'_, S, D> {
        MeshBuilder::new(self)
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    #[inline]
    pub fn nb_vertices(&self) -> usize {
        self.vertices.len()
    }

    #[inline]
    pub fn nb_elements(&self) -> usize {
        self.connectivity.len()
    }

    pub fn vertices(&self) -> &MeshVertices<D> {
        &self.vertices
    }

    pub fn point(&self, vertex: usize) -> &Point<D> {
        self.vertices.point(vertex)
    }

    pub fn element(&self, element: usize) -> &Element<S> {
        debug_assert!(
            element < self.nb_elements(),
            "{} {element} out of range",
            S::ELEMENT_KIND
        );
        &self.connectivity[element]
    }

    pub fn element_vertices(&self, element: usize) -> &[usize] {
        self.element(element).vertices()
    }

    pub fn nb_element_facets(&self, element: usize) -> usize {
        self.element(element).nb_facets()
    }

    pub fn element_facet_vertices(&self, element: usize, facet: usize) -> S::Facet {
        self.element(element).facet_vertices(facet)
    }

    /// Neighbour across local facet `facet`; `None` on the boundary.
    pub fn adjacent(&self, element: usize, facet: usize) -> Option<usize> {
        self.element(element).adjacents[facet]
    }

    pub fn is_element_on_border(&self, element: usize) -> bool {
        self.element(element).adjacents.contains(&None)
    }

    /// Elements using `vertex`, in increasing order. Linear in the number of
    /// elements.
    pub fn elements_around_vertex(&self, vertex: usize) -> Vec<usize> {
        self.connectivity
            .iter()
            .enumerate()
            .filter(|(_, element)| element.vertices.contains(&vertex))
            .map(|(id, _)| id)
            .collect()
    }

    pub fn element_barycenter(&self, element: usize) -> Point<D> {
        Point::barycenter(
            self.element_vertices(element)
                .iter()
                .map(|&v| self.vertices.point(v)),
        )
    }

    pub fn vertex_attributes(&self) -> &AttributeStore {
        self.vertices.attributes()
    }

    pub fn vertex_attributes_mut(&mut self) -> &mut AttributeStore {
        self.vertices.attributes_mut()
    }

    pub fn element_attributes(&self) -> &AttributeStore {
        self.elements.attributes()
    }

    pub fn element_attributes_mut(&mut self) -> &mut AttributeStore {
        self.elements.attributes_mut()
    }

    pub fn is_facet_registry_enabled(&self) -> bool {
        self.facets.is_some()
    }

    pub fn facet_registry(&self) -> Option<&FacetRegistry<S::Facet>> {
        self.facets.as_ref()
    }

    /// Attributes of registry entities, when the registry is enabled.
    pub fn facet_registry_attributes_mut(&mut self) -> Option<&mut AttributeStore> {
        self.facets.as_mut().map(FacetRegistry::attributes_mut)
    }

    /// Registry index of local facet `facet` of `element`.
    pub fn element_facet(&self, element: usize, facet: usize) -> Option<usize> {
        self.facets
            .as_ref()
            .and_then(|registry| registry.find(&self.element_facet_vertices(element, facet)))
    }

    // -----------------------------------------------------------------------
    // Structural edits
    // -----------------------------------------------------------------------

    pub fn create_points(&mut self, points: &[Point<D>], _: BuilderKey) -> usize {
        self.vertices.create_points(points)
    }

    pub fn create_vertices(&mut self, count: usize, _: BuilderKey) -> usize {
        self.vertices.create_vertices(count)
    }

    pub fn set_point(&mut self, vertex: usize, point: Point<D>, _: BuilderKey) {
        self.vertices.set_point(vertex, point);
    }

    pub fn reserve_vertices(&mut self, capacity: usize, _: BuilderKey) {
        self.vertices.reserve(capacity);
    }

    pub fn reserve_elements(&mut self, capacity: usize, _: BuilderKey) {
        self.elements.reserve(capacity);
        self.connectivity
            .reserve(capacity.saturating_sub(self.connectivity.len()));
    }

    /// Append an element; its adjacency slots start on the boundary.
    ///
    /// # Errors
    /// `InvalidElement` if the shape rejects the description or a vertex
    /// does not exist.
    pub fn create_element(
        &mut self,
        vertices: Vec<usize>,
        layout: S::Layout,
        _: BuilderKey,
    ) -> Result<usize, MeshError> {
        S::validate(&vertices, &layout)?;
        if let Some(&bad) = vertices.iter().find(|&&v| v >= self.nb_vertices()) {
            return Err(MeshError::InvalidElement(format!(
                "{} uses vertex {bad} of {}",
                S::ELEMENT_KIND,
                self.nb_vertices()
            )));
        }
        let element = Element::<S>::new(vertices, layout);
        if let Some(registry) = &mut self.facets {
            for facet in element.facets() {
                registry.find_or_create(facet);
            }
        }
        if let Some(registry) = &mut self.edges {
            for edge in element.edges() {
                registry.find_or_create(edge);
            }
        }
        let id = self.elements.create();
        self.connectivity.push(element);
        Ok(id)
    }

    /// Point position `local` of `element` at `vertex`, moving the registry
    /// entries of the facets and edges around it. Entries left without users
    /// are deleted.
    pub fn set_element_vertex(
        &mut self,
        element: usize,
        local: usize,
        vertex: usize,
        _: BuilderKey,
    ) -> Result<(), MeshError> {
        self.do_set_element_vertex(element, local, vertex)?;
        self.remove_isolated_entries()?;
        self.debug_assert_invariants();
        Ok(())
    }

    fn do_set_element_vertex(
        &mut self,
        element: usize,
        local: usize,
        vertex: usize,
    ) -> Result<(), MeshError> {
        debug_assert!(vertex < self.nb_vertices(), "vertex {vertex} out of range");
        let current = &self.connectivity[element];
        if current.vertices[local] == vertex {
            return Ok(());
        }
        if let Some(registry) = &mut self.facets {
            for (facet, position) in
                S::facets_around_local_vertex(&current.vertices, &current.layout, local)
            {
                registry.update_vertex(&current.facet_vertices(facet), position, vertex)?;
            }
        }
        if let Some(registry) = &mut self.edges {
            let edges = current.edges();
            for (edge, position) in current.edges_around_local_vertex(local) {
                registry.update_vertex(&edges[edge], position, vertex)?;
            }
        }
        self.connectivity[element].vertices[local] = vertex;
        Ok(())
    }

    /// Substitute `new_vertex` for `old_vertex` in every element.
    pub fn replace_vertex(
        &mut self,
        old_vertex: usize,
        new_vertex: usize,
        _: BuilderKey,
    ) -> Result<(), MeshError> {
        for element in self.elements_around_vertex(old_vertex) {
            let locals: Vec<usize> = self.connectivity[element]
                .vertices
                .iter()
                .positions(|&v| v == old_vertex)
                .collect();
            for local in locals {
                self.do_set_element_vertex(element, local, new_vertex)?;
            }
        }
        self.remove_isolated_entries()?;
        self.debug_assert_invariants();
        Ok(())
    }

    /// Delete registry entries no element uses any more.
    fn remove_isolated_entries(&mut self) -> Result<(), MeshError> {
        if let Some(registry) = &mut self.facets {
            registry.remove_isolated()?;
        }
        if let Some(registry) = &mut self.edges {
            registry.remove_isolated()?;
        }
        Ok(())
    }

    pub fn set_adjacent(&mut self, element: usize, facet: usize, adjacent: usize, _: BuilderKey) {
        debug_assert!(adjacent < self.nb_elements());
        self.connectivity[element].adjacents[facet] = Some(adjacent);
    }

    pub fn unset_adjacent(&mut self, element: usize, facet: usize, _: BuilderKey) {
        self.connectivity[element].adjacents[facet] = None;
    }

    /// Recompute the adjacency slots of `elements` from shared facets.
    /// Repeated ids count once. Slots are only written once the whole
    /// computation succeeded.
    pub fn compute_adjacencies_for(
        &mut self,
        elements: &[usize],
        options: AdjacencyOptions,
        _: BuilderKey,
    ) -> Result<AdjacencySummary, MeshError> {
        debug_assert!(elements.iter().all(|&e| e < self.nb_elements()));
        let elements: Vec<usize> = elements.iter().copied().unique().collect();
        let (updates, summary) = adjacency::compute_adjacencies(&*self, &elements, options)?;
        for update in updates {
            self.connectivity[update.slot.element].adjacents[update.slot.facet] = update.adjacent;
        }
        self.debug_assert_invariants();
        Ok(summary)
    }

    pub fn compute_adjacencies(
        &mut self,
        options: AdjacencyOptions,
        key: BuilderKey,
    ) -> Result<AdjacencySummary, MeshError> {
        let all = index::identity_mapping(self.nb_elements());
        self.compute_adjacencies_for(&all, options, key)
    }

    /// Delete the flagged elements. Facet registry entries they were the last
    /// user of go away; neighbours of deleted elements fall back to boundary.
    pub fn delete_elements(
        &mut self,
        to_delete: &[bool],
        _: BuilderKey,
    ) -> Result<Vec<usize>, MeshError> {
        self.do_delete_elements(to_delete)
    }

    fn do_delete_elements(&mut self, to_delete: &[bool]) -> Result<Vec<usize>, MeshError> {
        index::check_mask(to_delete, self.nb_elements())?;
        if let Some(registry) = &mut self.facets {
            for (element, _) in self
                .connectivity
                .iter()
                .zip(to_delete)
                .filter(|&(_, &deleted)| deleted)
            {
                for facet in element.facets() {
                    registry.remove(&facet)?;
                }
            }
        }
        if let Some(registry) = &mut self.edges {
            for (element, _) in self
                .connectivity
                .iter()
                .zip(to_delete)
                .filter(|&(_, &deleted)| deleted)
            {
                for edge in element.edges() {
                    registry.remove(&edge)?;
                }
            }
        }
        self.remove_isolated_entries()?;
        let old2new = self.elements.delete(to_delete)?;
        index::compact(&mut self.connectivity, to_delete);
        self.remap_adjacents(&old2new);
        log::debug!(
            "deleted {} {}s, {} left",
            old2new.len() - self.nb_elements(),
            S::ELEMENT_KIND,
            self.nb_elements()
        );
        self.debug_assert_invariants();
        Ok(old2new)
    }

    /// Reorder elements; `permutation[new] = old`.
    pub fn permute_elements(
        &mut self,
        permutation: &[usize],
        _: BuilderKey,
    ) -> Result<Vec<usize>, MeshError> {
        let old2new = self.elements.permute(permutation)?;
        index::permute(&mut self.connectivity, permutation);
        self.remap_adjacents(&old2new);
        self.debug_assert_invariants();
        Ok(old2new)
    }

    /// Delete the flagged vertices. Elements using one of them are deleted
    /// first, then the remaining elements are remapped.
    pub fn delete_vertices(
        &mut self,
        to_delete: &[bool],
        _: BuilderKey,
    ) -> Result<Vec<usize>, MeshError> {
        index::check_mask(to_delete, self.nb_vertices())?;
        let dead_elements: Vec<bool> = self
            .connectivity
            .iter()
            .map(|element| element.vertices.iter().any(|&v| to_delete[v]))
            .collect();
        if dead_elements.contains(&true) {
            self.do_delete_elements(&dead_elements)?;
        }
        let old2new = self.vertices.delete(to_delete)?;
        self.remap_vertices(&old2new)?;
        log::debug!("deleted vertices, {} left", self.nb_vertices());
        self.debug_assert_invariants();
        Ok(old2new)
    }

    /// Delete every vertex no element uses.
    pub fn delete_isolated_vertices(&mut self, key: BuilderKey) -> Result<Vec<usize>, MeshError> {
        let mut isolated = vec![true; self.nb_vertices()];
        for &v in self.connectivity.iter().flat_map(|element| &element.vertices) {
            isolated[v] = false;
        }
        self.delete_vertices(&isolated, key)
    }

    /// Reorder vertices; `permutation[new] = old`.
    pub fn permute_vertices(
        &mut self,
        permutation: &[usize],
        _: BuilderKey,
    ) -> Result<Vec<usize>, MeshError> {
        let old2new = self.vertices.permute(permutation)?;
        self.remap_vertices(&old2new)?;
        self.debug_assert_invariants();
        Ok(old2new)
    }

    /// Become a copy of `other`.
    ///
    /// # Errors
    /// `NonEmptyTarget` if this mesh already has vertices or elements.
    pub fn copy_from(&mut self, other: &ElementMesh<S, D>, _: BuilderKey) -> Result<(), MeshError> {
        if !self.elements.is_empty() {
            return Err(MeshError::NonEmptyTarget {
                kind: S::ELEMENT_KIND,
                len: self.nb_elements(),
            });
        }
        self.vertices.copy_from(&other.vertices)?;
        self.elements.copy_from(&other.elements)?;
        self.connectivity = other.connectivity.clone();
        self.facets = other.facets.clone();
        self.edges = other.edges.clone();
        Ok(())
    }

    /// Build the facet registry from the current elements, if not done yet.
    pub fn enable_facet_registry(&mut self, _: BuilderKey) {
        if self.facets.is_some() {
            return;
        }
        let mut registry = FacetRegistry::new(S::FACET_KIND);
        for element in &self.connectivity {
            for facet in element.facets() {
                registry.find_or_create(facet);
            }
        }
        log::debug!(
            "registered {} {}s for {} {}s",
            registry.nb_facets(),
            S::FACET_KIND,
            self.nb_elements(),
            S::ELEMENT_KIND
        );
        self.facets = Some(registry);
    }

    /// Drop the facet registry and its attributes.
    pub fn disable_facet_registry(&mut self, _: BuilderKey) {
        self.facets = None;
    }

    fn remap_adjacents(&mut self, old2new: &[usize]) {
        for slot in self
            .connectivity
            .iter_mut()
            .flat_map(|element| element.adjacents.iter_mut())
        {
            if let Some(adjacent) = *slot {
                let new = old2new[adjacent];
                *slot = (new != NO_ID).then_some(new);
            }
        }
    }

    fn remap_vertices(&mut self, old2new: &[usize]) -> Result<(), MeshError> {
        for v in self
            .connectivity
            .iter_mut()
            .flat_map(|element| element.vertices.iter_mut())
        {
            *v = old2new[*v];
        }
        if let Some(registry) = &mut self.facets {
            registry.update_vertices(old2new)?;
        }
        if let Some(registry) = &mut self.edges {
            registry.update_vertices(old2new)?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Surface-specific reads
// ---------------------------------------------------------------------------

impl<const D: usize> ElementMesh<Polygonal, D> {
    pub fn nb_polygons(&self) -> usize {
        self.nb_elements()
    }

    pub fn polygon_vertices(&self, polygon: usize) -> &[usize] {
        self.element_vertices(polygon)
    }

    /// End vertices of local edge `edge`, going from vertex `edge` to `edge + 1`.
    pub fn polygon_edge_vertices(&self, polygon: usize, edge: usize) -> [usize; 2] {
        self.element_facet_vertices(polygon, edge)
    }

    /// Registry index of local edge `edge`; `None` when edges are disabled.
    pub fn polygon_edge(&self, polygon: usize, edge: usize) -> Option<usize> {
        self.element_facet(polygon, edge)
    }

    pub fn polygon_adjacent(&self, polygon: usize, edge: usize) -> Option<usize> {
        self.adjacent(polygon, edge)
    }

    pub fn polygons_around_vertex(&self, vertex: usize) -> Vec<usize> {
        self.elements_around_vertex(vertex)
    }

    pub fn is_polygon_on_border(&self, polygon: usize) -> bool {
        self.is_element_on_border(polygon)
    }

    pub fn polygon_barycenter(&self, polygon: usize) -> Point<D> {
        self.element_barycenter(polygon)
    }

    pub fn are_edges_enabled(&self) -> bool {
        self.is_facet_registry_enabled()
    }

    pub fn edges(&self) -> Option<&EdgeRegistry> {
        self.facet_registry()
    }

    /// Number of unique edges, 0 when edges are disabled.
    pub fn nb_edges(&self) -> usize {
        self.facets.as_ref().map_or(0, FacetRegistry::nb_facets)
    }
}

// ---------------------------------------------------------------------------
// Solid-specific reads
// ---------------------------------------------------------------------------

impl<const D: usize> ElementMesh<Polyhedral, D> {
    pub fn nb_polyhedra(&self) -> usize {
        self.nb_elements()
    }

    pub fn polyhedron_vertices(&self, polyhedron: usize) -> &[usize] {
        self.element_vertices(polyhedron)
    }

    pub fn nb_polyhedron_facets(&self, polyhedron: usize) -> usize {
        self.element(polyhedron).nb_facets()
    }

    /// Global vertex loop of local facet `facet`.
    pub fn polyhedron_facet_vertices(&self, polyhedron: usize, facet: usize) -> Vec<usize> {
        self.element_facet_vertices(polyhedron, facet)
    }

    /// Registry index of local facet `facet`; `None` when facets are disabled.
    pub fn polyhedron_facet(&self, polyhedron: usize, facet: usize) -> Option<usize> {
        self.element_facet(polyhedron, facet)
    }

    pub fn polyhedron_adjacent(&self, polyhedron: usize, facet: usize) -> Option<usize> {
        self.adjacent(polyhedron, facet)
    }

    pub fn is_polyhedron_on_border(&self, polyhedron: usize) -> bool {
        self.is_element_on_border(polyhedron)
    }

    pub fn polyhedron_barycenter(&self, polyhedron: usize) -> Point<D> {
        self.element_barycenter(polyhedron)
    }

    pub fn are_facets_enabled(&self) -> bool {
        self.is_facet_registry_enabled()
    }

    pub fn facets(&self) -> Option<&PolyhedronFacetRegistry> {
        self.facet_registry()
    }

    /// Number of unique facets, 0 when facets are disabled.
    pub fn nb_facets(&self) -> usize {
        self.facets.as_ref().map_or(0, FacetRegistry::nb_facets)
    }

    pub fn nb_polyhedron_edges(&self, polyhedron: usize) -> usize {
        self.element(polyhedron).nb_edges()
    }

    /// End vertices of every edge of `polyhedron`, in local edge order.
    pub fn polyhedron_edges_vertices(&self, polyhedron: usize) -> Vec<[usize; 2]> {
        self.element(polyhedron).edges()
    }

    /// Registry index of local edge `edge`; `None` when edges are disabled.
    pub fn polyhedron_edge(&self, polyhedron: usize, edge: usize) -> Option<usize> {
        let registry = self.edges.as_ref()?;
        registry.find(&self.element(polyhedron).edges()[edge])
    }

    pub fn are_edges_enabled(&self) -> bool {
        self.edges.is_some()
    }

    pub fn edges(&self) -> Option<&EdgeRegistry> {
        self.edges.as_ref()
    }

    /// Number of unique edges, 0 when edges are disabled.
    pub fn nb_edges(&self) -> usize {
        self.edges.as_ref().map_or(0, FacetRegistry::nb_facets)
    }

    /// Build the edge registry from the facet loops, if not done yet.
    pub fn enable_edge_registry(&mut self, _: BuilderKey) {
        if self.edges.is_some() {
            return;
        }
        let mut registry = EdgeRegistry::new("edge");
        for element in &self.connectivity {
            for edge in element.edges() {
                registry.find_or_create(edge);
            }
        }
        log::debug!(
            "registered {} edges for {} polyhedra",
            registry.nb_facets(),
            self.nb_elements()
        );
        self.edges = Some(registry);
    }

    /// Drop the edge registry and its attributes.
    pub fn disable_edge_registry(&mut self, _: BuilderKey) {
        self.edges = None;
    }

    pub fn edge_registry_attributes_mut(&mut self) -> Option<&mut AttributeStore> {
        self.edges.as_mut().map(FacetRegistry::attributes_mut)
    }
}

// ---------------------------------------------------------------------------
// Trait impls
// ---------------------------------------------------------------------------

impl<S: ElementShape, const D: usize> MeshElements for ElementMesh<S, D> {
    fn nb_vertices(&self) -> usize {
        ElementMesh::nb_vertices(self)
    }

    fn nb_elements(&self) -> usize {
        ElementMesh::nb_elements(self)
    }

    fn nb_element_vertices(&self, element: usize) -> usize {
        self.element(element).vertices.len()
    }

    fn element_vertex(&self, element: usize, local: usize) -> usize {
        self.element(element).vertices[local]
    }

    fn element_vertices(&self, element: usize) -> Vec<usize> {
        ElementMesh::element_vertices(self, element).to_vec()
    }

    fn nb_element_facets(&self, element: usize) -> usize {
        ElementMesh::nb_element_facets(self, element)
    }

    fn adjacent(&self, element: usize, facet: usize) -> Option<usize> {
        ElementMesh::adjacent(self, element, facet)
    }

    fn is_element_on_border(&self, element: usize) -> bool {
        ElementMesh::is_element_on_border(self, element)
    }

    fn vertex_attribute<T: AttributeValue>(&self, name: &str, vertex: usize) -> Result<&T, MeshError> {
        Ok(self.vertex_attributes().find_attribute::<T>(name)?.value(vertex))
    }

    fn element_attribute<T: AttributeValue>(&self, name: &str, element: usize) -> Result<&T, MeshError> {
        Ok(self.element_attributes().find_attribute::<T>(name)?.value(element))
    }
}

impl<S: ElementShape, const D: usize> FacetProvider for ElementMesh<S, D> {
    type Facet = S::Facet;

    fn nb_element_facets(&self, element: usize) -> usize {
        ElementMesh::nb_element_facets(self, element)
    }

    fn element_facet_vertices(&self, element: usize, facet: usize) -> S::Facet {
        ElementMesh::element_facet_vertices(self, element, facet)
    }
}

impl<S: ElementShape, const D: usize> CoordinateProvider<D> for ElementMesh<S, D> {
    fn nb_points(&self) -> usize {
        self.nb_vertices()
    }

    fn point(&self, vertex: usize) -> &Point<D> {
        self.vertices.point(vertex)
    }
}

impl<S: ElementShape, const D: usize> DebugInvariants for ElementMesh<S, D> {
    fn validate_invariants(&self) -> Result<(), MeshError> {
        self.vertices.validate_invariants()?;
        self.elements.validate_invariants()?;
        let nb_vertices = self.nb_vertices();
        let nb_elements = self.nb_elements();
        ensure(self.elements.len() == nb_elements, || {
            format!(
                "{} {} entities for {nb_elements} elements",
                self.elements.len(),
                S::ELEMENT_KIND
            )
        })?;
        for (id, element) in self.connectivity.iter().enumerate() {
            ensure(element.vertices.iter().all(|&v| v < nb_vertices), || {
                format!("{} {id} references a missing vertex", S::ELEMENT_KIND)
            })?;
            ensure(
                element.adjacents.len() == S::nb_facets(&element.vertices, &element.layout),
                || format!("{} {id} has a wrong number of adjacency slots", S::ELEMENT_KIND),
            )?;
            ensure(
                element.adjacents.iter().flatten().all(|&a| a < nb_elements),
                || format!("{} {id} is adjacent to a missing element", S::ELEMENT_KIND),
            )?;
        }
        if let Some(registry) = &self.facets {
            let used = self.connectivity.iter().flat_map(|element| element.facets());
            check_registry_users(registry, used)?;
        }
        if let Some(registry) = &self.edges {
            let used = self.connectivity.iter().flat_map(|element| element.edges());
            check_registry_users(registry, used)?;
        }
        Ok(())
    }
}

/// Every loop used by an element is registered, and every entry counts
/// exactly its users (at least one).
fn check_registry_users<C: CycleVertices>(
    registry: &FacetRegistry<C>,
    used: impl Iterator<Item = C>,
) -> Result<(), MeshError> {
    registry.validate_invariants()?;
    let kind = registry.entities().kind();
    let mut counts = vec![0usize; registry.nb_facets()];
    for vertices in used {
        let id = registry.find(&vertices).ok_or_else(|| {
            MeshError::InvariantViolation(format!("{kind} {vertices:?} is not registered"))
        })?;
        counts[id] += 1;
    }
    for (id, &count) in counts.iter().enumerate() {
        ensure(count > 0, || format!("{kind} {id} has no user"))?;
        ensure(registry.counter(id) == count, || {
            format!(
                "{kind} {id} counts {} users, {count} found",
                registry.counter(id)
            )
        })?;
    }
    Ok(())
}

/// Persisted form of an [`ElementMesh`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct ElementMeshRecord<S: ElementShape, const D: usize> {
    pub vertices: VerticesRecord<D>,
    pub elements: Vec<Element<S>>,
    pub element_attributes: StoreRecord,
    pub facets: Option<FacetRegistryRecord<S::Facet>>,
    #[serde(default)]
    pub edges: Option<FacetRegistryRecord<[usize; 2]>>,
}

impl<S: ElementShape, const D: usize> MeshSnapshot for ElementMesh<S, D> {
    type Record = ElementMeshRecord<S, D>;

    fn to_snapshot(&self) -> Result<Self::Record, MeshError> {
        Ok(ElementMeshRecord {
            vertices: self.vertices.to_record()?,
            elements: self.connectivity.clone(),
            element_attributes: self.element_attributes().to_record()?,
            facets: self.facets.as_ref().map(FacetRegistry::to_record).transpose()?,
            edges: self.edges.as_ref().map(FacetRegistry::to_record).transpose()?,
        })
    }

    fn from_snapshot(record: Self::Record, registry: &AttributeRegistry) -> Result<Self, MeshError> {
        let mut mesh = Self {
            vertices: MeshVertices::from_record(record.vertices, registry)?,
            ..Self::default()
        };
        for element in &record.elements {
            S::validate(&element.vertices, &element.layout)?;
        }
        mesh.elements.create_many(record.elements.len());
        let attributes = AttributeStore::from_record(record.element_attributes, registry)?;
        ensure(attributes.nb_elements() == record.elements.len(), || {
            format!(
                "{} {} attribute slots for {} elements",
                attributes.nb_elements(),
                S::ELEMENT_KIND,
                record.elements.len()
            )
        })?;
        *mesh.elements.attributes_mut() = attributes;
        mesh.connectivity = record.elements;
        mesh.facets = record
            .facets
            .map(|facets| FacetRegistry::from_record(S::FACET_KIND, facets, registry))
            .transpose()?;
        mesh.edges = record
            .edges
            .map(|edges| FacetRegistry::from_record("edge", edges, registry))
            .transpose()?;
        mesh.validate_invariants()?;
        Ok(mesh)
    }
}
