//! Dense index bookkeeping: deletion masks, permutations and `old2new` maps.
//!
//! Every entity in geomesh is addressed by a plain `usize` into a dense range
//! `[0, n)`. Deleting or permuting the range produces an `old2new` mapping
//! with one entry per previous index; removed entries map to [`NO_ID`].
//! Dependent structures use that mapping to remap their references in the
//! same operation.

use crate::mesh_error::MeshError;

/// Sentinel for "no index" in `old2new` mappings.
pub const NO_ID: usize = usize::MAX;

/// Identity mapping `[0, 1, .., n-1]`.
pub fn identity_mapping(n: usize) -> Vec<usize> {
    (0..n).collect()
}

/// Compute the `old2new` mapping produced by removing every `true` entry of
/// `to_delete` and compacting the survivors in order.
pub fn mapping_after_deletion(to_delete: &[bool]) -> Vec<usize> {
    let mut next = 0;
    to_delete
        .iter()
        .map(|&deleted| {
            if deleted {
                NO_ID
            } else {
                next += 1;
                next - 1
            }
        })
        .collect()
}

/// Check that `to_delete` has one entry per element.
pub fn check_mask(to_delete: &[bool], len: usize) -> Result<(), MeshError> {
    if to_delete.len() != len {
        return Err(MeshError::MaskLengthMismatch {
            expected: len,
            found: to_delete.len(),
        });
    }
    Ok(())
}

/// Check that `permutation` is a bijection on `[0, len)`.
///
/// `permutation[new] = old`: entry `i` names the previous index that ends up
/// at position `i`.
pub fn check_permutation(permutation: &[usize], len: usize) -> Result<(), MeshError> {
    if permutation.len() != len {
        return Err(MeshError::InvalidPermutation(format!(
            "expected {len} entries, found {}",
            permutation.len()
        )));
    }
    let mut seen = vec![false; len];
    for (new, &old) in permutation.iter().enumerate() {
        if old >= len {
            return Err(MeshError::InvalidPermutation(format!(
                "entry {new} is {old}, out of range [0, {len})"
            )));
        }
        if std::mem::replace(&mut seen[old], true) {
            return Err(MeshError::InvalidPermutation(format!(
                "index {old} appears more than once"
            )));
        }
    }
    Ok(())
}

/// Invert a (valid) permutation: returns `old2new` with
/// `old2new[permutation[i]] == i`.
pub fn old2new_permutation(permutation: &[usize]) -> Vec<usize> {
    let mut old2new = vec![NO_ID; permutation.len()];
    for (new, &old) in permutation.iter().enumerate() {
        old2new[old] = new;
    }
    old2new
}

/// Remove the entries flagged in `to_delete`, keeping the others in order.
pub fn compact<T>(data: &mut Vec<T>, to_delete: &[bool]) {
    debug_assert_eq!(data.len(), to_delete.len());
    let mut flags = to_delete.iter();
    data.retain(|_| !flags.next().copied().unwrap_or(false));
}

/// Reorder `data` so that `data[new] = old_data[permutation[new]]`.
pub fn permute<T>(data: &mut Vec<T>, permutation: &[usize]) {
    debug_assert_eq!(data.len(), permutation.len());
    let mut slots: Vec<Option<T>> = data.drain(..).map(Some).collect();
    data.extend(permutation.iter().filter_map(|&old| slots[old].take()));
}

/// Translate `index` through `old2new`, keeping [`NO_ID`] as is.
#[inline]
pub fn remap(old2new: &[usize], index: usize) -> usize {
    if index == NO_ID { NO_ID } else { old2new[index] }
}

/// Whether the mapping maps every index onto itself.
pub fn is_identity(old2new: &[usize]) -> bool {
    old2new.iter().enumerate().all(|(i, &n)| i == n)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deletion_mapping_compacts_survivors() {
        let old2new = mapping_after_deletion(&[true, false, false, true, false]);
        assert_eq!(old2new, vec![NO_ID, 0, 1, NO_ID, 2]);
    }

    #[test]
    fn empty_mask_is_identity() {
        assert!(is_identity(&mapping_after_deletion(&[false; 4])));
    }

    #[test]
    fn permutation_checks() {
        assert!(check_permutation(&[2, 0, 1], 3).is_ok());
        assert!(matches!(
            check_permutation(&[0, 0, 1], 3),
            Err(MeshError::InvalidPermutation(_))
        ));
        assert!(check_permutation(&[0, 3, 1], 3).is_err());
        assert!(check_permutation(&[0, 1], 3).is_err());
    }

    #[test]
    fn permute_and_invert() {
        let mut data = vec!['a', 'b', 'c', 'd'];
        let permutation = [3, 1, 0, 2];
        permute(&mut data, &permutation);
        assert_eq!(data, vec!['d', 'b', 'a', 'c']);
        let old2new = old2new_permutation(&permutation);
        assert_eq!(old2new, vec![2, 1, 3, 0]);
        permute(&mut data, &old2new);
        assert_eq!(data, vec!['a', 'b', 'c', 'd']);
    }

    #[test]
    fn compact_drops_flagged() {
        let mut data = vec![10, 11, 12, 13];
        compact(&mut data, &[false, true, true, false]);
        assert_eq!(data, vec![10, 13]);
    }
}
