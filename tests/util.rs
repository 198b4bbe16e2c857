#![allow(dead_code)]
use geomesh::mesh::{Point, SolidMesh3D, SurfaceMesh2D};
use geomesh::topology::EntityIndexSet;

/// Vertex set of `n` entities carrying `id = 100 + i`.
pub fn vertices_with_ids(n: usize) -> EntityIndexSet {
    let mut set = EntityIndexSet::new("vertex");
    set.create_many(n);
    let ids = set
        .attributes_mut()
        .find_or_create_variable("id", 0usize)
        .unwrap();
    for i in 0..n {
        ids.set_value(i, 100 + i);
    }
    set
}

/// Tetrahedra A = {0,1,2,3} and B = {1,2,3,4} sharing facet {1,2,3}.
pub fn two_tets() -> SolidMesh3D {
    let mut mesh = SolidMesh3D::new();
    let mut builder = mesh.builder();
    builder.create_points(&[
        Point::new([0.0, 0.0, 0.0]),
        Point::new([1.0, 0.0, 0.0]),
        Point::new([0.0, 1.0, 0.0]),
        Point::new([0.0, 0.0, 1.0]),
        Point::new([1.0, 1.0, 1.0]),
    ]);
    builder.create_tetrahedron([0, 1, 2, 3]).unwrap();
    builder.create_tetrahedron([1, 2, 3, 4]).unwrap();
    mesh
}

/// 2x1 grid of unit quads, split into four triangles:
///
/// ```text
/// 3---4---5
/// | \ | \ |
/// 0---1---2
/// ```
pub fn triangle_strip() -> SurfaceMesh2D {
    let mut mesh = SurfaceMesh2D::new();
    let mut builder = mesh.builder();
    builder.create_points(&[
        Point::new([0.0, 0.0]),
        Point::new([1.0, 0.0]),
        Point::new([2.0, 0.0]),
        Point::new([0.0, 1.0]),
        Point::new([1.0, 1.0]),
        Point::new([2.0, 1.0]),
    ]);
    builder.create_triangle([0, 1, 3]).unwrap();
    builder.create_triangle([1, 4, 3]).unwrap();
    builder.create_triangle([1, 2, 4]).unwrap();
    builder.create_triangle([2, 5, 4]).unwrap();
    builder.compute_adjacencies().unwrap();
    mesh
}

/// Assert vec is a permutation of another vec (order-agnostic).
pub fn assert_permutation<T: Ord + Copy + std::fmt::Debug>(got: &[T], want: &[T]) {
    let mut a = got.to_vec();
    a.sort_unstable();
    let mut b = want.to_vec();
    b.sort_unstable();
    assert_eq!(a, b, "not a permutation\n got={:?}\nwant={:?}", got, want);
}
