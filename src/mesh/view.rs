//! MeshView: a subset of a base mesh, re-indexed from zero.
//!
//! A view borrows its base and keeps two translation tables per entity kind:
//! view index -> base index (a `Vec`) and base index -> view index (a hash
//! map). Reads go through the base and are translated back, so adjacency to
//! an element outside the view reads as boundary.

use hashbrown::HashMap;

use crate::data::attribute::AttributeValue;
use crate::data::registry::AttributeRegistry;
use crate::mesh::mesh_elements::MeshElements;
use crate::mesh::point::{CoordinateProvider, Point};
use crate::mesh::snapshot::MeshSnapshot;
use crate::mesh_error::MeshError;
use crate::topology::index::NO_ID;

/// Re-indexed subset of a [`MeshElements`] base.
#[derive(Clone, Debug)]
pub struct MeshView<'a, M: MeshElements> {
    base: &'a M,
    vertices: Vec<usize>,
    elements: Vec<usize>,
    vertex_ids: HashMap<usize, usize>,
    element_ids: HashMap<usize, usize>,
}

impl<'a, M: MeshElements> MeshView<'a, M> {
    /// Empty view over `base`.
    pub fn new(base: &'a M) -> Self {
        Self {
            base,
            vertices: Vec::new(),
            elements: Vec::new(),
            vertex_ids: HashMap::new(),
            element_ids: HashMap::new(),
        }
    }

    pub fn base(&self) -> &'a M {
        self.base
    }

    /// Add base vertex `vertex`; returns its view index. Adding twice is a no-op.
    pub fn add_viewed_vertex(&mut self, vertex: usize) -> usize {
        debug_assert!(vertex < self.base.nb_vertices(), "vertex {vertex} out of range");
        *self.vertex_ids.entry(vertex).or_insert_with(|| {
            self.vertices.push(vertex);
            self.vertices.len() - 1
        })
    }

    /// Add base element `element` and its vertices; returns its view index.
    pub fn add_viewed_element(&mut self, element: usize) -> usize {
        debug_assert!(element < self.base.nb_elements(), "element {element} out of range");
        if let Some(&id) = self.element_ids.get(&element) {
            return id;
        }
        for vertex in self.base.element_vertices(element) {
            self.add_viewed_vertex(vertex);
        }
        let id = self.elements.len();
        self.elements.push(element);
        self.element_ids.insert(element, id);
        id
    }

    /// Base index of view vertex `vertex`.
    pub fn viewed_vertex(&self, vertex: usize) -> usize {
        self.vertices[vertex]
    }

    /// Base index of view element `element`.
    pub fn viewed_element(&self, element: usize) -> usize {
        self.elements[element]
    }

    /// View index of base vertex `vertex`, if viewed.
    pub fn view_vertex(&self, vertex: usize) -> Option<usize> {
        self.vertex_ids.get(&vertex).copied()
    }

    pub fn view_element(&self, element: usize) -> Option<usize> {
        self.element_ids.get(&element).copied()
    }
}

impl<M: MeshElements> MeshElements for MeshView<'_, M> {
    fn nb_vertices(&self) -> usize {
        self.vertices.len()
    }

    fn nb_elements(&self) -> usize {
        self.elements.len()
    }

    fn nb_element_vertices(&self, element: usize) -> usize {
        self.base.nb_element_vertices(self.elements[element])
    }

    fn element_vertex(&self, element: usize, local: usize) -> usize {
        let vertex = self.base.element_vertex(self.elements[element], local);
        // Element vertices are pulled in with the element.
        debug_assert!(self.vertex_ids.contains_key(&vertex));
        self.view_vertex(vertex).unwrap_or(NO_ID)
    }

    fn nb_element_facets(&self, element: usize) -> usize {
        self.base.nb_element_facets(self.elements[element])
    }

    fn adjacent(&self, element: usize, facet: usize) -> Option<usize> {
        self.base
            .adjacent(self.elements[element], facet)
            .and_then(|adjacent| self.view_element(adjacent))
    }

    fn vertex_attribute<T: AttributeValue>(&self, name: &str, vertex: usize) -> Result<&T, MeshError> {
        self.base.vertex_attribute(name, self.vertices[vertex])
    }

    fn element_attribute<T: AttributeValue>(&self, name: &str, element: usize) -> Result<&T, MeshError> {
        self.base.element_attribute(name, self.elements[element])
    }
}

impl<M, const D: usize> CoordinateProvider<D> for MeshView<'_, M>
where
    M: MeshElements + CoordinateProvider<D>,
{
    fn nb_points(&self) -> usize {
        self.vertices.len()
    }

    fn point(&self, vertex: usize) -> &Point<D> {
        self.base.point(self.vertices[vertex])
    }
}

/// Views borrow their data; only the base mesh can be saved.
impl<M: MeshElements> MeshSnapshot for MeshView<'_, M> {
    type Record = ();

    fn to_snapshot(&self) -> Result<(), MeshError> {
        Err(MeshError::UnsupportedOperation("saving a mesh view"))
    }

    fn from_snapshot(_: (), _: &AttributeRegistry) -> Result<Self, MeshError> {
        Err(MeshError::UnsupportedOperation("loading a mesh view"))
    }
}
