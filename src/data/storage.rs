//! Pluggable storage for dense attribute columns.
//!
//! This trait abstracts how a [`VariableAttribute`](crate::data::attribute::VariableAttribute)
//! keeps its values. Besides slice access it knows how to follow the owning
//! index set through compaction and permutation, so the column never falls
//! out of step with the element count.

use core::fmt::{self, Debug};

use crate::topology::index;

/// Contiguous, indexable storage for `V` with slice access.
pub trait Storage<V>: Debug {
    /// Construct a buffer of `len`, filled with `fill`.
    fn with_len(len: usize, fill: V) -> Self
    where
        V: Clone;

    /// Current length in elements.
    fn len(&self) -> usize;

    /// Whether the buffer holds no element.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Resize to `new_len`, filling new cells with `fill`.
    fn resize(&mut self, new_len: usize, fill: V)
    where
        V: Clone;

    /// Reserve room for `capacity` elements in total.
    fn reserve(&mut self, capacity: usize);

    /// Entire read-only buffer.
    fn as_slice(&self) -> &[V];

    /// Entire mutable buffer.
    fn as_mut_slice(&mut self) -> &mut [V];

    /// Drop the cells flagged in `to_delete` and close the gaps.
    fn compact(&mut self, to_delete: &[bool]);

    /// Reorder so that cell `new` holds the previous cell `permutation[new]`.
    fn permute(&mut self, permutation: &[usize]);
}

/// `Vec`-backed storage (default).
#[derive(Clone, PartialEq)]
pub struct VecStorage<V>(pub(crate) Vec<V>);

impl<V> Debug for VecStorage<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VecStorage")
            .field("len", &self.0.len())
            .finish()
    }
}

impl<V> Default for VecStorage<V> {
    fn default() -> Self {
        Self(Vec::new())
    }
}

impl<V> Storage<V> for VecStorage<V> {
    fn with_len(len: usize, fill: V) -> Self
    where
        V: Clone,
    {
        Self(vec![fill; len])
    }

    fn len(&self) -> usize {
        self.0.len()
    }

    fn resize(&mut self, new_len: usize, fill: V)
    where
        V: Clone,
    {
        self.0.resize(new_len, fill);
    }

    fn reserve(&mut self, capacity: usize) {
        self.0.reserve(capacity.saturating_sub(self.0.len()));
    }

    fn as_slice(&self) -> &[V] {
        &self.0
    }

    fn as_mut_slice(&mut self) -> &mut [V] {
        &mut self.0
    }

    fn compact(&mut self, to_delete: &[bool]) {
        index::compact(&mut self.0, to_delete);
    }

    fn permute(&mut self, permutation: &[usize]) {
        index::permute(&mut self.0, permutation);
    }
}

impl<V> From<Vec<V>> for VecStorage<V> {
    fn from(v: Vec<V>) -> Self {
        Self(v)
    }
}

impl<V> VecStorage<V> {
    pub fn into_inner(self) -> Vec<V> {
        self.0
    }
}
