//! Algorithms over meshes: adjacency reconstruction and bounding boxes.

pub mod adjacency;
pub mod bounding_box;

pub use adjacency::{
    AdjacencyOptions, AdjacencySummary, AdjacencyUpdate, ElementFacet, FacetProvider,
    NonManifoldHandling, compute_adjacencies,
};
pub use bounding_box::{BoundingBox, SpatialIndexBuilder, build_element_index};
