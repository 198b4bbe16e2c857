//! Read interface shared by element meshes and their views.

use crate::data::attribute::AttributeValue;
use crate::mesh_error::MeshError;

/// Read access to vertices, elements, their connectivity and attributes.
///
/// Every index is local to the implementor: for a view, element `0` is the
/// first viewed element, not element `0` of the base mesh.
pub trait MeshElements {
    fn nb_vertices(&self) -> usize;

    fn nb_elements(&self) -> usize;

    fn nb_element_vertices(&self, element: usize) -> usize;

    /// Vertex at position `local` of `element`.
    fn element_vertex(&self, element: usize, local: usize) -> usize;

    fn element_vertices(&self, element: usize) -> Vec<usize> {
        (0..self.nb_element_vertices(element))
            .map(|local| self.element_vertex(element, local))
            .collect()
    }

    fn nb_element_facets(&self, element: usize) -> usize;

    /// Neighbour of `element` across local facet `facet`; `None` on the boundary.
    fn adjacent(&self, element: usize, facet: usize) -> Option<usize>;

    fn is_element_on_border(&self, element: usize) -> bool {
        (0..self.nb_element_facets(element)).any(|facet| self.adjacent(element, facet).is_none())
    }

    /// Value of the vertex attribute `name` at `vertex`.
    fn vertex_attribute<T: AttributeValue>(&self, name: &str, vertex: usize) -> Result<&T, MeshError>;

    /// Value of the element attribute `name` at `element`.
    fn element_attribute<T: AttributeValue>(&self, name: &str, element: usize) -> Result<&T, MeshError>;
}
