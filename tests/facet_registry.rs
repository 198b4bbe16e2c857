use geomesh::MeshError;
use geomesh::topology::{EdgeRegistry, FacetRegistry, NO_ID, PolyhedronFacetRegistry};

#[test]
fn rotations_and_reflections_resolve_to_one_id() {
    let mut registry = FacetRegistry::<[usize; 3]>::new("facet");
    let id = registry.find_or_create([3, 7, 1]);
    assert_eq!(registry.find_or_create([7, 1, 3]), id);
    assert_eq!(registry.find_or_create([1, 3, 7]), id);
    assert_eq!(registry.find_or_create([1, 7, 3]), id);
    assert_eq!(registry.nb_facets(), 1);
    assert_eq!(registry.find(&[3, 1, 7]), Some(id));
    assert_ne!(registry.find_or_create([3, 7, 2]), id);
}

#[test]
fn counters_decide_when_entries_go() {
    let mut edges = EdgeRegistry::new("edge");
    let shared = edges.find_or_create([4, 2]);
    edges.find_or_create([2, 4]);
    let lone = edges.find_or_create([2, 9]);

    assert_eq!(edges.remove(&[4, 2]).unwrap(), 1);
    assert_eq!(edges.remove_isolated().unwrap(), vec![0, 1]);
    assert_eq!(edges.find(&[2, 4]), Some(shared));

    assert_eq!(edges.remove(&[2, 4]).unwrap(), 0);
    let old2new = edges.remove_isolated().unwrap();
    assert_eq!(old2new, vec![NO_ID, 0]);
    assert_eq!(edges.find(&[4, 2]), None);
    assert_eq!(edges.find(&[9, 2]), Some(old2new[lone]));
    assert_eq!(
        edges.remove(&[4, 2]),
        Err(MeshError::FacetNotFound(vec![4, 2]))
    );
}

#[test]
fn facet_attributes_follow_deletion() {
    let mut facets = PolyhedronFacetRegistry::new("facet");
    facets.find_or_create(vec![0, 1, 2]);
    facets.find_or_create(vec![0, 1, 2, 3]);
    facets.find_or_create(vec![5, 6, 7]);
    let marks = facets
        .attributes_mut()
        .find_or_create_variable("mark", 0u32)
        .unwrap();
    marks.set_value(2, 42);

    facets.delete(&[true, false, false]).unwrap();
    assert_eq!(facets.nb_facets(), 2);
    assert_eq!(facets.find(&vec![7, 6, 5]), Some(1));
    let marks = facets.attributes().variable::<u32>("mark").unwrap();
    assert_eq!(marks.values(), &[0, 42]);
}

#[test]
fn vertex_remap_keeps_lookup_consistent() {
    let mut facets = PolyhedronFacetRegistry::new("facet");
    facets.find_or_create(vec![0, 1, 2]);
    facets.find_or_create(vec![1, 2, 3]);
    // Vertex 0 deleted, the others shift down by one.
    let old2new = facets.update_vertices(&[NO_ID, 0, 1, 2]).unwrap();
    assert_eq!(old2new, vec![NO_ID, 0]);
    assert_eq!(facets.find(&vec![2, 1, 0]), Some(0));
    assert_eq!(facets.facet_vertices(0), &vec![0, 1, 2]);
}
