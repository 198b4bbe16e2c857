mod util;
use geomesh::DebugInvariants;
use geomesh::MeshError;
use geomesh::algs::{AdjacencyOptions, NonManifoldHandling};
use geomesh::data::AttributeRegistry;
use geomesh::mesh::{MeshSnapshot, Point, SolidMesh3D};
use geomesh::topology::NO_ID;
use util::*;

#[test]
fn two_tets_share_exactly_one_link() {
    let mut mesh = two_tets();
    let summary = mesh.builder().compute_adjacencies().unwrap();
    assert_eq!(summary.links, 1);
    assert_eq!(summary.boundary, 6);

    // A's facet 0 is opposite vertex 0: {1,3,2}. B's facet 3 is {1,2,3}.
    assert_eq!(mesh.polyhedron_adjacent(0, 0), Some(1));
    assert_eq!(mesh.polyhedron_adjacent(1, 3), Some(0));
    for facet in 1..4 {
        assert_eq!(mesh.polyhedron_adjacent(0, facet), None);
    }
    for facet in 0..3 {
        assert_eq!(mesh.polyhedron_adjacent(1, facet), None);
    }
    assert!(mesh.is_polyhedron_on_border(0));
    mesh.validate_invariants().unwrap();
}

#[test]
fn facet_registry_counts_shared_facets_once() {
    let mut mesh = two_tets();
    assert!(!mesh.are_facets_enabled());
    assert_eq!(mesh.nb_facets(), 0);
    mesh.builder().enable_facets();
    assert_eq!(mesh.nb_facets(), 7);
    let shared = mesh.polyhedron_facet(0, 0).unwrap();
    assert_eq!(mesh.polyhedron_facet(1, 3), Some(shared));
    assert_eq!(mesh.facets().unwrap().counter(shared), 2);

    mesh.builder().delete_elements(&[false, true]).unwrap();
    assert_eq!(mesh.nb_polyhedra(), 1);
    assert_eq!(mesh.nb_facets(), 4);
    assert_eq!(mesh.facets().unwrap().counter(mesh.polyhedron_facet(0, 0).unwrap()), 1);
    mesh.validate_invariants().unwrap();
}

#[test]
fn deleting_a_vertex_removes_its_polyhedra() {
    let mut mesh = two_tets();
    let mut builder = mesh.builder();
    builder.enable_facets();
    builder.compute_adjacencies().unwrap();
    let old2new = builder
        .delete_vertices(&[true, false, false, false, false])
        .unwrap();
    assert_eq!(old2new[4], 3);
    assert_eq!(mesh.nb_vertices(), 4);
    assert_eq!(mesh.nb_polyhedra(), 1);
    assert_eq!(mesh.polyhedron_vertices(0), &[0, 1, 2, 3]);
    assert_eq!(mesh.polyhedron_adjacent(0, 3), None);
    assert_eq!(mesh.point(3), &Point::new([1.0, 1.0, 1.0]));
    assert_eq!(mesh.nb_facets(), 4);
    mesh.validate_invariants().unwrap();
}

#[test]
fn permuting_polyhedra_remaps_adjacency() {
    let mut mesh = two_tets();
    let mut builder = mesh.builder();
    builder.compute_adjacencies().unwrap();
    builder.permute_elements(&[1, 0]).unwrap();
    assert_eq!(mesh.polyhedron_vertices(0), &[1, 2, 3, 4]);
    assert_eq!(mesh.polyhedron_adjacent(0, 3), Some(1));
    assert_eq!(mesh.polyhedron_adjacent(1, 0), Some(0));
}

#[test]
fn non_manifold_facet_policy() {
    let mut mesh = two_tets();
    let mut builder = mesh.builder();
    let apex = builder.create_point(Point::new([-1.0, -1.0, -1.0]));
    builder.create_tetrahedron([apex, 1, 2, 3]).unwrap();
    builder.set_adjacent(0, 1, 2);

    let error = builder.compute_adjacencies().unwrap_err();
    assert!(matches!(error, MeshError::NonManifoldFacet { owners: 3, .. }));
    // Nothing written on error.
    assert_eq!(builder.mesh().polyhedron_adjacent(0, 1), Some(2));

    let summary = builder
        .compute_adjacencies_with(
            AdjacencyOptions::default().with_non_manifold(NonManifoldHandling::Warn),
        )
        .unwrap();
    assert_eq!(summary.non_manifold, 1);
    assert_eq!(summary.links, 0);
    assert!(
        (0..3).all(|tet| (0..4).all(|f| builder.mesh().polyhedron_adjacent(tet, f).is_none()))
    );
}

#[test]
fn copy_requires_an_empty_target() {
    let source = two_tets();
    let mut target = geomesh::mesh::SolidMesh3D::new();
    target.builder().copy(&source).unwrap();
    assert_eq!(target.nb_polyhedra(), 2);
    assert!(matches!(
        target.builder().copy(&source),
        Err(MeshError::NonEmptyTarget { kind: "polyhedron", len: 2 })
    ));
}

#[test]
fn solid_edges_come_from_facet_loops() {
    let mut mesh = two_tets();
    assert!(!mesh.are_edges_enabled());
    mesh.builder().enable_edges();
    assert_eq!(mesh.nb_edges(), 9);
    assert_eq!(mesh.nb_polyhedron_edges(0), 6);
    assert_eq!(mesh.polyhedron_edges_vertices(1)[5], [3, 4]);
    // Edge {1, 2}: local edge 3 of A, local edge 0 of B.
    let shared = mesh.polyhedron_edge(0, 3).unwrap();
    assert_eq!(mesh.polyhedron_edge(1, 0), Some(shared));
    assert_eq!(mesh.edges().unwrap().counter(shared), 2);

    let registry = AttributeRegistry::with_builtin_types();
    let restored = SolidMesh3D::from_snapshot(mesh.to_snapshot().unwrap(), &registry).unwrap();
    assert_eq!(restored.nb_edges(), 9);

    mesh.builder().delete_elements(&[true, false]).unwrap();
    assert_eq!(mesh.nb_edges(), 6);
    mesh.validate_invariants().unwrap();

    mesh.builder().disable_edges();
    assert_eq!(mesh.polyhedron_edge(0, 0), None);
}

#[test]
fn collapsing_a_vertex_merges_edges_and_facets() {
    let mut mesh = two_tets();
    let mut builder = mesh.builder();
    builder.enable_facets();
    builder.enable_edges();
    // B = {1, 2, 3, 4} becomes {1, 2, 3, 0}, the vertex set of A.
    builder.set_element_vertex(1, 3, 0).unwrap();
    assert_eq!(mesh.nb_edges(), 6);
    assert_eq!(mesh.nb_facets(), 4);
    let edges = mesh.edges().unwrap();
    assert!(edges.find(&[1, 4]).is_none());
    assert_eq!(edges.counter(edges.find(&[0, 1]).unwrap()), 2);
    mesh.validate_invariants().unwrap();

    let old2new = mesh.builder().delete_isolated_vertices().unwrap();
    assert_eq!(old2new, vec![0, 1, 2, 3, NO_ID]);
    assert_eq!(mesh.nb_vertices(), 4);
    assert_eq!(mesh.nb_edges(), 6);
    mesh.validate_invariants().unwrap();
}
