//! Adjacency reconstruction between polygons or polyhedra.
//!
//! Every local facet of every scanned element is keyed by its vertex loop in
//! a disposable [`FacetRegistry`]; the `(element, local facet)` slots are
//! grouped by registry id afterwards:
//!
//! * two slots: the elements are neighbours through those facets,
//! * one slot: boundary facet,
//! * more: non-manifold input, handled according to [`NonManifoldHandling`].
//!
//! The result is a list of [`AdjacencyUpdate`]s the caller writes into its
//! connectivity. With the default options a non-manifold facet makes the
//! whole computation fail before anything is returned, so the caller's mesh
//! is never partially updated.
//!
//! With the `rayon` feature the facet scan runs in parallel over elements;
//! grouping is always sequential.

#[cfg(feature = "rayon")]
use rayon::prelude::*;

use crate::mesh_error::MeshError;
use crate::topology::facet_registry::FacetRegistry;
use crate::topology::vertex_cycle::CycleVertices;

/// Behavior for facets shared by more than two elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NonManifoldHandling {
    /// Leave the facet on the boundary without notice.
    Ignore,
    /// Log a warning and leave the facet on the boundary.
    Warn,
    /// Fail with [`MeshError::NonManifoldFacet`].
    #[default]
    Error,
}

/// Options for [`compute_adjacencies`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AdjacencyOptions {
    pub non_manifold: NonManifoldHandling,
}

impl AdjacencyOptions {
    pub fn with_non_manifold(mut self, handling: NonManifoldHandling) -> Self {
        self.non_manifold = handling;
        self
    }
}

/// One local facet of one element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementFacet {
    pub element: usize,
    pub facet: usize,
}

impl ElementFacet {
    pub const fn new(element: usize, facet: usize) -> Self {
        Self { element, facet }
    }
}

/// New value of one adjacency slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdjacencyUpdate {
    pub slot: ElementFacet,
    pub adjacent: Option<usize>,
}

/// Read access to the facets of a set of elements.
///
/// Polygonal meshes report their edges (`Facet = [usize; 2]`), polyhedral
/// meshes their facets (`Facet = Vec<usize>`).
pub trait FacetProvider: Sync {
    type Facet: CycleVertices;

    fn nb_element_facets(&self, element: usize) -> usize;

    /// Global vertex loop of local facet `facet` of `element`.
    fn element_facet_vertices(&self, element: usize, facet: usize) -> Self::Facet;
}

/// Counts reported in the debug log and returned to callers that want them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AdjacencySummary {
    pub links: usize,
    pub boundary: usize,
    pub non_manifold: usize,
}

fn scan_facets<P>(provider: &P, elements: &[usize]) -> Vec<(ElementFacet, P::Facet)>
where
    P: FacetProvider + ?Sized,
{
    let element_facets = move |element: usize| {
        (0..provider.nb_element_facets(element)).map(move |facet| {
            (
                ElementFacet::new(element, facet),
                provider.element_facet_vertices(element, facet),
            )
        })
    };
    #[cfg(feature = "rayon")]
    {
        elements
            .par_iter()
            .flat_map_iter(|&element| element_facets(element))
            .collect()
    }
    #[cfg(not(feature = "rayon"))]
    {
        elements
            .iter()
            .flat_map(|&element| element_facets(element))
            .collect()
    }
}

/// Compute the adjacency slots of `elements`.
///
/// Only the listed elements take part: a facet shared with an element outside
/// the list is reported as boundary.
///
/// # Errors
/// `NonManifoldFacet` for the first facet owned by more than two slots when
/// `options.non_manifold` is [`NonManifoldHandling::Error`].
pub fn compute_adjacencies<P>(
    provider: &P,
    elements: &[usize],
    options: AdjacencyOptions,
) -> Result<(Vec<AdjacencyUpdate>, AdjacencySummary), MeshError>
where
    P: FacetProvider + ?Sized,
{
    let scanned = scan_facets(provider, elements);

    let mut registry = FacetRegistry::<P::Facet>::new("scratch facet");
    let mut groups: Vec<Vec<ElementFacet>> = Vec::new();
    for (slot, vertices) in scanned {
        let id = registry.find_or_create(vertices);
        if id == groups.len() {
            groups.push(Vec::with_capacity(2));
        }
        groups[id].push(slot);
    }

    let mut summary = AdjacencySummary::default();
    let mut updates = Vec::with_capacity(groups.iter().map(Vec::len).sum());
    for (id, group) in groups.iter().enumerate() {
        match group.as_slice() {
            [a, b] => {
                updates.push(AdjacencyUpdate {
                    slot: *a,
                    adjacent: Some(b.element),
                });
                updates.push(AdjacencyUpdate {
                    slot: *b,
                    adjacent: Some(a.element),
                });
                summary.links += 1;
            }
            [single] => {
                updates.push(AdjacencyUpdate {
                    slot: *single,
                    adjacent: None,
                });
                summary.boundary += 1;
            }
            owners => {
                let vertices = registry.facet_vertices(id).as_ref().to_vec();
                match options.non_manifold {
                    NonManifoldHandling::Error => {
                        return Err(MeshError::NonManifoldFacet {
                            vertices,
                            owners: owners.len(),
                        });
                    }
                    NonManifoldHandling::Warn => {
                        log::warn!(
                            "non-manifold facet {vertices:?} shared by {} elements",
                            owners.len()
                        );
                    }
                    NonManifoldHandling::Ignore => {}
                }
                updates.extend(owners.iter().map(|&slot| AdjacencyUpdate {
                    slot,
                    adjacent: None,
                }));
                summary.non_manifold += 1;
            }
        }
    }
    log::debug!(
        "adjacencies of {} elements: {} links, {} boundary facets, {} non-manifold",
        elements.len(),
        summary.links,
        summary.boundary,
        summary.non_manifold
    );
    Ok((updates, summary))
}
