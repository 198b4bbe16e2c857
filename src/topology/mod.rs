//! Index bookkeeping and topological identity.
//!
//! This module provides the building blocks every mesh is made of:
//! - [`index`]: deletion masks, permutations and `old2new` mappings
//! - [`entity_set`]: the dense index range of one entity kind and its attributes
//! - [`vertex_cycle`]: rotation/reflection-invariant keys for edges and facets
//! - [`facet_registry`]: unique, reference-counted edges and facets

pub mod entity_set;
pub mod facet_registry;
pub mod index;
pub mod vertex_cycle;

pub use entity_set::EntityIndexSet;
pub use facet_registry::{EdgeRegistry, FacetRegistry, PolyhedronFacetRegistry, SyncFacetRegistry};
pub use index::NO_ID;
pub use vertex_cycle::{CycleVertices, OrientedVertexCycle, VertexCycle};
