use geomesh::data::AttributeStore;
use geomesh::topology::{EntityIndexSet, FacetRegistry, NO_ID, index};
use proptest::prelude::*;

fn permutation(n: usize) -> impl Strategy<Value = Vec<usize>> {
    Just((0..n).collect::<Vec<_>>()).prop_shuffle()
}

fn set_with_values(values: &[i64]) -> EntityIndexSet {
    let mut set = EntityIndexSet::new("vertex");
    set.create_many(values.len());
    let column = set
        .attributes_mut()
        .find_or_create_variable("value", 0i64)
        .unwrap();
    for (i, &v) in values.iter().enumerate() {
        column.set_value(i, v);
    }
    set
}

fn values(store: &AttributeStore) -> Vec<i64> {
    store.variable::<i64>("value").unwrap().values().to_vec()
}

proptest! {
    #[test]
    fn permute_then_inverse_restores_values(
        (values_in, perm) in (1usize..40).prop_flat_map(|n| {
            (prop::collection::vec(any::<i64>(), n), permutation(n))
        })
    ) {
        let mut set = set_with_values(&values_in);
        let old2new = set.permute(&perm).unwrap();
        // old2new is the inverse permutation.
        set.permute(&old2new).unwrap();
        prop_assert_eq!(values(set.attributes()), values_in);
    }

    #[test]
    fn deletion_mapping_is_a_bijection_onto_survivors(
        mask in prop::collection::vec(any::<bool>(), 0..60)
    ) {
        let mut set = set_with_values(&vec![0; mask.len()]);
        let old2new = set.delete(&mask).unwrap();
        let survivors = mask.iter().filter(|&&d| !d).count();
        prop_assert_eq!(set.len(), survivors);
        let mut targets: Vec<usize> = old2new
            .iter()
            .zip(&mask)
            .map(|(&new, &deleted)| {
                if deleted {
                    assert_eq!(new, NO_ID);
                }
                new
            })
            .filter(|&new| new != NO_ID)
            .collect();
        targets.sort_unstable();
        prop_assert_eq!(targets, (0..survivors).collect::<Vec<_>>());
    }

    #[test]
    fn create_many_fills_defaults(existing in 0usize..20, added in 0usize..20) {
        let mut set = EntityIndexSet::new("polygon");
        set.create_many(existing);
        set.attributes_mut().find_or_create_variable("value", -3i64).unwrap();
        let first = set.create_many(added);
        prop_assert_eq!(first, existing);
        prop_assert_eq!(set.len(), existing + added);
        prop_assert!(values(set.attributes()).iter().all(|&v| v == -3));
    }

    #[test]
    fn cycles_match_under_rotation_and_reflection(
        (cycle, shift) in prop::collection::hash_set(0usize..1000, 3..8)
            .prop_flat_map(|set| {
                let cycle: Vec<usize> = set.into_iter().collect();
                let len = cycle.len();
                (Just(cycle), 0..len)
            })
    ) {
        let mut registry = FacetRegistry::<Vec<usize>>::new("facet");
        let id = registry.find_or_create(cycle.clone());
        let mut rotated = cycle.clone();
        rotated.rotate_left(shift);
        let mut reflected = rotated.clone();
        reflected.reverse();
        prop_assert_eq!(registry.find(&rotated), Some(id));
        prop_assert_eq!(registry.find(&reflected), Some(id));
        let mut swapped = cycle.clone();
        swapped.swap(0, 1);
        if cycle.len() > 3 {
            prop_assert_eq!(registry.find(&swapped), None);
        }
    }

    #[test]
    fn inverse_permutation_composes_to_identity(perm in (0usize..50).prop_flat_map(permutation)) {
        let old2new = index::old2new_permutation(&perm);
        for (new, &old) in perm.iter().enumerate() {
            prop_assert_eq!(old2new[old], new);
        }
    }
}
