//! Concrete meshes, their builders and views.
//!
//! - [`PointSet`](point_set::PointSet): vertices only.
//! - [`EdgedCurve`](curve::EdgedCurve): vertices and edges.
//! - [`SurfaceMesh`](element_mesh::SurfaceMesh) and
//!   [`SolidMesh`](element_mesh::SolidMesh): polygons or polyhedra with
//!   adjacency and an optional facet registry.
//! - [`MeshView`](view::MeshView): a re-indexed subset of any of the above.
//!
//! Reads take `&mesh`. Structural edits go through the mesh's builder.

pub mod builder;
pub mod curve;
pub mod element;
pub mod element_mesh;
pub mod mesh_elements;
pub mod passkey;
pub mod point;
pub mod point_set;
pub mod snapshot;
pub mod vertices;
pub mod view;

pub use builder::{MeshBuilder, SolidMeshBuilder, SurfaceMeshBuilder};
pub use curve::{CurveBuilder, EdgedCurve, EdgedCurve2D, EdgedCurve3D};
pub use element::{Element, ElementShape, Polygonal, Polyhedral, TETRAHEDRON_FACETS};
pub use element_mesh::{
    ElementMesh, ElementMeshRecord, SolidMesh, SolidMesh3D, SurfaceMesh, SurfaceMesh2D,
    SurfaceMesh3D,
};
pub use mesh_elements::MeshElements;
pub use passkey::BuilderKey;
pub use point::{CoordinateProvider, Point, Point2D, Point3D};
pub use point_set::{PointSet, PointSet2D, PointSet3D, PointSetBuilder};
pub use snapshot::MeshSnapshot;
pub use view::MeshView;
