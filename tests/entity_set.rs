mod util;
use geomesh::MeshError;
use geomesh::topology::{EntityIndexSet, NO_ID};
use util::*;

#[test]
fn six_vertices_delete_first() {
    let mut set = vertices_with_ids(6);
    let old2new = set
        .delete(&[true, false, false, false, false, false])
        .unwrap();
    assert_eq!(set.len(), 5);
    assert_eq!(old2new, vec![NO_ID, 0, 1, 2, 3, 4]);
    let ids = set.attributes().variable::<usize>("id").unwrap();
    assert_eq!(*ids.value(old2new[5]), 105);
}

#[test]
fn new_slots_hold_each_column_default() {
    let mut set = EntityIndexSet::new("polygon");
    set.create_many(2);
    set.attributes_mut()
        .find_or_create_variable("region", 7i32)
        .unwrap()
        .set_value(1, 3);
    set.attributes_mut()
        .find_or_create_sparse("flag", false)
        .unwrap()
        .set_value(0, true);
    set.attributes_mut()
        .find_or_create_constant("name", "fault".to_string())
        .unwrap();

    let first = set.create_many(3);
    assert_eq!(first, 2);
    assert_eq!(set.len(), 5);
    let store = set.attributes();
    let region = store.variable::<i32>("region").unwrap();
    assert_eq!(region.values(), &[7, 3, 7, 7, 7]);
    let flag = store.find_attribute::<bool>("flag").unwrap();
    assert!(*flag.value(0));
    assert!((1..5).all(|i| !*flag.value(i)));
    let name = store.find_attribute::<String>("name").unwrap();
    assert_eq!(name.value(4), "fault");
}

#[test]
fn all_false_mask_is_identity() {
    let mut set = vertices_with_ids(4);
    let old2new = set.delete(&[false; 4]).unwrap();
    assert_eq!(old2new, vec![0, 1, 2, 3]);
    assert_eq!(set.len(), 4);
    let ids = set.attributes().variable::<usize>("id").unwrap();
    assert_eq!(ids.values(), &[100, 101, 102, 103]);
}

#[test]
fn bad_mask_leaves_set_untouched() {
    let mut set = vertices_with_ids(3);
    assert_eq!(
        set.delete(&[true, false]),
        Err(MeshError::MaskLengthMismatch {
            expected: 3,
            found: 2
        })
    );
    assert_eq!(set.len(), 3);
}

#[test]
fn permutation_moves_values() {
    let mut set = vertices_with_ids(4);
    let old2new = set.permute(&[3, 0, 2, 1]).unwrap();
    assert_eq!(old2new, vec![1, 3, 2, 0]);
    let ids = set.attributes().variable::<usize>("id").unwrap();
    assert_eq!(ids.values(), &[103, 100, 102, 101]);
    assert_permutation(&old2new, &[0, 1, 2, 3]);
}
