//! Element shapes and per-element connectivity.
//!
//! Polygons and polyhedra share one storage engine; an [`ElementShape`]
//! tells it how the facets of an element are laid out:
//!
//! - [`Polygonal`]: facets are the implicit cyclic edges `(v[i], v[i + 1])`.
//! - [`Polyhedral`]: facets are explicit lists of local vertex positions.

use std::fmt::Debug;

use itertools::Itertools;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::mesh_error::MeshError;
use crate::topology::vertex_cycle::CycleVertices;

/// How the facets of an element derive from its vertices.
pub trait ElementShape: Clone + Debug + Default + Send + Sync + 'static {
    /// Global vertex loop of one facet.
    type Facet: CycleVertices;
    /// Extra per-element data describing the facets.
    type Layout: Clone + Debug + PartialEq + Send + Sync + Serialize + DeserializeOwned + 'static;

    /// Entity name of elements, used in errors and logs.
    const ELEMENT_KIND: &'static str;
    /// Entity name of facets.
    const FACET_KIND: &'static str;

    fn nb_facets(vertices: &[usize], layout: &Self::Layout) -> usize;

    fn facet_vertices(vertices: &[usize], layout: &Self::Layout, facet: usize) -> Self::Facet;

    /// Local vertex pairs of the element edges, each edge listed once.
    fn local_edges(vertices: &[usize], layout: &Self::Layout) -> Vec<[usize; 2]>;

    /// `(facet, position)` pairs where local vertex `local` appears.
    fn facets_around_local_vertex(
        vertices: &[usize],
        layout: &Self::Layout,
        local: usize,
    ) -> Vec<(usize, usize)>;

    /// Reject elements that cannot be built.
    fn validate(vertices: &[usize], layout: &Self::Layout) -> Result<(), MeshError>;
}

/// Polygons; facets are edges.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Polygonal;

/// Polyhedra; facets are polygons given by local vertex positions.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Polyhedral;

impl ElementShape for Polygonal {
    type Facet = [usize; 2];
    type Layout = ();

    const ELEMENT_KIND: &'static str = "polygon";
    const FACET_KIND: &'static str = "edge";

    fn nb_facets(vertices: &[usize], _: &()) -> usize {
        vertices.len()
    }

    fn facet_vertices(vertices: &[usize], _: &(), facet: usize) -> [usize; 2] {
        [vertices[facet], vertices[(facet + 1) % vertices.len()]]
    }

    fn local_edges(vertices: &[usize], _: &()) -> Vec<[usize; 2]> {
        let n = vertices.len();
        (0..n).map(|i| [i, (i + 1) % n]).collect()
    }

    fn facets_around_local_vertex(vertices: &[usize], _: &(), local: usize) -> Vec<(usize, usize)> {
        let n = vertices.len();
        vec![(local, 0), ((local + n - 1) % n, 1)]
    }

    fn validate(vertices: &[usize], _: &()) -> Result<(), MeshError> {
        if vertices.len() < 3 {
            return Err(MeshError::InvalidElement(format!(
                "polygon needs at least 3 vertices, got {}",
                vertices.len()
            )));
        }
        Ok(())
    }
}

/// Local facets of a tetrahedron; facet `i` is opposite vertex `i`.
pub const TETRAHEDRON_FACETS: [[usize; 3]; 4] = [[1, 3, 2], [0, 2, 3], [3, 1, 0], [0, 1, 2]];

impl ElementShape for Polyhedral {
    type Facet = Vec<usize>;
    type Layout = Vec<Vec<usize>>;

    const ELEMENT_KIND: &'static str = "polyhedron";
    const FACET_KIND: &'static str = "facet";

    fn nb_facets(_: &[usize], layout: &Vec<Vec<usize>>) -> usize {
        layout.len()
    }

    fn facet_vertices(vertices: &[usize], layout: &Vec<Vec<usize>>, facet: usize) -> Vec<usize> {
        layout[facet].iter().map(|&local| vertices[local]).collect()
    }

    /// Sorted local pairs gathered from the facet loops.
    fn local_edges(_: &[usize], layout: &Vec<Vec<usize>>) -> Vec<[usize; 2]> {
        layout
            .iter()
            .flat_map(|locals| {
                locals
                    .iter()
                    .circular_tuple_windows()
                    .map(|(&a, &b)| if a < b { [a, b] } else { [b, a] })
            })
            .sorted_unstable()
            .dedup()
            .collect()
    }

    fn facets_around_local_vertex(
        _: &[usize],
        layout: &Vec<Vec<usize>>,
        local: usize,
    ) -> Vec<(usize, usize)> {
        layout
            .iter()
            .enumerate()
            .filter_map(|(facet, locals)| {
                locals
                    .iter()
                    .position(|&l| l == local)
                    .map(|position| (facet, position))
            })
            .collect()
    }

    fn validate(vertices: &[usize], layout: &Vec<Vec<usize>>) -> Result<(), MeshError> {
        if vertices.len() < 4 || layout.len() < 4 {
            return Err(MeshError::InvalidElement(format!(
                "polyhedron needs at least 4 vertices and 4 facets, got {} and {}",
                vertices.len(),
                layout.len()
            )));
        }
        for (facet, locals) in layout.iter().enumerate() {
            if locals.len() < 3 {
                return Err(MeshError::InvalidElement(format!(
                    "facet {facet} has {} vertices",
                    locals.len()
                )));
            }
            if let Some(&bad) = locals.iter().find(|&&l| l >= vertices.len()) {
                return Err(MeshError::InvalidElement(format!(
                    "facet {facet} uses local vertex {bad} of {}",
                    vertices.len()
                )));
            }
        }
        Ok(())
    }
}

/// Vertices, facet layout and neighbours of one element.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct Element<S: ElementShape> {
    pub(crate) vertices: Vec<usize>,
    pub(crate) layout: S::Layout,
    pub(crate) adjacents: Vec<Option<usize>>,
}

impl<S: ElementShape> Element<S> {
    pub(crate) fn new(vertices: Vec<usize>, layout: S::Layout) -> Self {
        let nb_facets = S::nb_facets(&vertices, &layout);
        Self {
            vertices,
            layout,
            adjacents: vec![None; nb_facets],
        }
    }

    pub fn vertices(&self) -> &[usize] {
        &self.vertices
    }

    pub fn layout(&self) -> &S::Layout {
        &self.layout
    }

    pub fn adjacents(&self) -> &[Option<usize>] {
        &self.adjacents
    }

    pub fn nb_facets(&self) -> usize {
        self.adjacents.len()
    }

    pub fn facet_vertices(&self, facet: usize) -> S::Facet {
        S::facet_vertices(&self.vertices, &self.layout, facet)
    }

    pub fn nb_edges(&self) -> usize {
        S::local_edges(&self.vertices, &self.layout).len()
    }

    /// Global end vertices of every edge, in local edge order.
    pub fn edges(&self) -> Vec<[usize; 2]> {
        S::local_edges(&self.vertices, &self.layout)
            .into_iter()
            .map(|[a, b]| [self.vertices[a], self.vertices[b]])
            .collect()
    }

    /// `(edge, position)` pairs where local vertex `local` is an edge end.
    pub(crate) fn edges_around_local_vertex(&self, local: usize) -> Vec<(usize, usize)> {
        S::local_edges(&self.vertices, &self.layout)
            .into_iter()
            .enumerate()
            .filter_map(|(edge, ends)| {
                ends.iter()
                    .position(|&l| l == local)
                    .map(|position| (edge, position))
            })
            .collect()
    }

    /// Every facet's vertex loop, in local order.
    pub fn facets(&self) -> impl Iterator<Item = S::Facet> + '_ {
        (0..self.nb_facets()).map(move |f| self.facet_vertices(f))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn polygon_edges_wrap_around() {
        let quad = Element::<Polygonal>::new(vec![4, 5, 6, 7], ());
        assert_eq!(quad.nb_facets(), 4);
        assert_eq!(quad.facet_vertices(3), [7, 4]);
        assert_eq!(
            Polygonal::facets_around_local_vertex(quad.vertices(), &(), 0),
            vec![(0, 0), (3, 1)]
        );
        assert!(Polygonal::validate(&[1, 2], &()).is_err());
    }

    #[test]
    fn tetrahedron_facets_are_explicit() {
        let layout: Vec<Vec<usize>> = TETRAHEDRON_FACETS.iter().map(|f| f.to_vec()).collect();
        Polyhedral::validate(&[10, 11, 12, 13], &layout).unwrap();
        let tet = Element::<Polyhedral>::new(vec![10, 11, 12, 13], layout);
        assert_eq!(tet.facet_vertices(0), vec![11, 13, 12]);
        assert_eq!(
            Polyhedral::facets_around_local_vertex(tet.vertices(), tet.layout(), 0),
            vec![(1, 0), (2, 2), (3, 0)]
        );
        assert_eq!(tet.nb_edges(), 6);
        assert_eq!(
            tet.edges(),
            vec![[10, 11], [10, 12], [10, 13], [11, 12], [11, 13], [12, 13]]
        );
        assert_eq!(tet.edges_around_local_vertex(2), vec![(1, 1), (3, 1), (5, 0)]);
        let mut broken = tet.layout().clone();
        broken[2][1] = 9;
        assert!(matches!(
            Polyhedral::validate(tet.vertices(), &broken),
            Err(MeshError::InvalidElement(_))
        ));
    }
}
