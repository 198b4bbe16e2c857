#![cfg_attr(docsrs, feature(doc_cfg))]
//! # geomesh
//!
//! geomesh is the indexed mesh and topology storage engine of a geoscientific
//! modeling toolkit. It stores point sets, curves, polygonal surfaces and
//! polyhedral solids, attaches typed attributes to every entity kind, and
//! rebuilds element adjacency from shared edges and facets.
//!
//! ## Features
//! - Typed attribute columns (dense, constant, sparse) that follow every
//!   structural edit of their entity set
//! - Dense index ranges with compacting deletion and `old2new` mappings
//! - Rotation/reflection-invariant keys deduplicating shared edges and facets
//! - Adjacency reconstruction with configurable non-manifold handling
//! - Builder-gated mutation: the borrow checker guarantees one writer per mesh
//! - Re-indexed mesh views over any mesh
//! - Serde snapshots resolved through an explicit attribute registry
//!
//! ## Cargo features
//! - `rayon`: parallel facet scanning and bounding-box accumulation
//! - `check-invariants`: validate structure invariants after mutation in release builds
//! - `strict-invariants`: implies `check-invariants`
//!
//! ## Usage
//!
//! ```
//! use geomesh::prelude::*;
//!
//! let mut mesh = SurfaceMesh2D::new();
//! let mut builder = mesh.builder();
//! builder.create_points(&[
//!     Point::new([0.0, 0.0]),
//!     Point::new([1.0, 0.0]),
//!     Point::new([0.0, 1.0]),
//!     Point::new([1.0, 1.0]),
//! ]);
//! builder.create_triangle([0, 1, 2])?;
//! builder.create_triangle([1, 3, 2])?;
//! builder.compute_adjacencies()?;
//!
//! assert_eq!(mesh.polygon_adjacent(0, 1), Some(1));
//! assert!(mesh.is_polygon_on_border(0));
//! # Ok::<(), geomesh::mesh_error::MeshError>(())
//! ```
//!
//! ## Logging
//! geomesh reports through the `log` facade and never installs a logger.

pub mod algs;
pub mod data;
pub mod debug_invariants;
pub mod mesh;
pub mod mesh_error;
pub mod topology;

pub use debug_invariants::DebugInvariants;
pub use mesh_error::MeshError;

/// A convenient prelude to import the most-used traits & types:
pub mod prelude {
    pub use crate::algs::adjacency::{AdjacencyOptions, NonManifoldHandling};
    pub use crate::algs::bounding_box::{BoundingBox, SpatialIndexBuilder};
    pub use crate::data::attribute::{
        AttributeLinearInterpolation, AttributeProperties, AttributeValue, Interpolable,
        ReadOnlyAttribute,
    };
    pub use crate::data::attribute_store::AttributeStore;
    pub use crate::data::registry::AttributeRegistry;
    pub use crate::debug_invariants::DebugInvariants;
    pub use crate::mesh::{
        CoordinateProvider, EdgedCurve, EdgedCurve2D, EdgedCurve3D, MeshElements, MeshSnapshot,
        MeshView, Point, Point2D, Point3D, PointSet, PointSet2D, PointSet3D, SolidMesh,
        SolidMesh3D, SurfaceMesh, SurfaceMesh2D, SurfaceMesh3D,
    };
    pub use crate::mesh_error::MeshError;
    pub use crate::topology::{EntityIndexSet, FacetRegistry, NO_ID, VertexCycle};
}

mod send_sync {
    use static_assertions::assert_impl_all;

    use crate::data::attribute_store::AttributeStore;
    use crate::mesh::{EdgedCurve3D, PointSet3D, SolidMesh3D, SurfaceMesh3D};
    use crate::topology::{EdgeRegistry, EntityIndexSet, PolyhedronFacetRegistry};

    assert_impl_all!(AttributeStore: Send, Sync);
    assert_impl_all!(EntityIndexSet: Send, Sync);
    assert_impl_all!(EdgeRegistry: Send, Sync);
    assert_impl_all!(PolyhedronFacetRegistry: Send, Sync);
    assert_impl_all!(PointSet3D: Send, Sync);
    assert_impl_all!(EdgedCurve3D: Send, Sync);
    assert_impl_all!(SurfaceMesh3D: Send, Sync);
    assert_impl_all!(SolidMesh3D: Send, Sync);
}
