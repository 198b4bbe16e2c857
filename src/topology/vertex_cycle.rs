//! Canonical signatures of vertex cycles.
//!
//! An edge or facet is identified by the loop of vertex indices around it. The
//! same facet is traversed from different starting vertices, and in opposite
//! directions, by the two elements sharing it. [`VertexCycle`] compares equal
//! for any rotation of a loop and for any rotation of its reversal;
//! [`OrientedVertexCycle`] only accepts rotations.
//!
//! Hashing uses a cheap order-independent combination of the vertex values.
//! Collisions are expected and resolved by the exact comparison.

use std::fmt::Debug;
use std::hash::{Hash, Hasher};

use serde::Serialize;
use serde::de::DeserializeOwned;

/// Containers usable as a vertex cycle: `[usize; N]` for fixed-size loops
/// (polygon edges, triangular facets), `Vec<usize>` for general ones.
pub trait CycleVertices:
    Clone + Debug + Eq + Send + Sync + AsRef<[usize]> + AsMut<[usize]> + Serialize + DeserializeOwned + 'static
{
}

impl<C> CycleVertices for C where
    C: Clone
        + Debug
        + Eq
        + Send
        + Sync
        + AsRef<[usize]>
        + AsMut<[usize]>
        + Serialize
        + DeserializeOwned
        + 'static
{
}

/// Rotate so that the first occurrence of the minimum comes first.
pub fn rotate_to_min(vertices: &mut [usize]) {
    if let Some((position, _)) = vertices.iter().enumerate().min_by_key(|&(_, v)| *v) {
        vertices.rotate_left(position);
    }
}

/// Reverse the traversal direction while keeping the first vertex in place.
pub fn reverse_keep_first(vertices: &mut [usize]) {
    if vertices.len() > 2 {
        vertices[1..].reverse();
    }
}

/// Whether two min-rotated loops describe the same cycle in either direction.
fn same_cycle(a: &[usize], b: &[usize]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    if a == b {
        return true;
    }
    // Same start is implied for min-rotated loops; compare the reversal.
    match (a.split_first(), b.split_first()) {
        (Some((a0, a_rest)), Some((b0, b_rest))) => {
            a0 == b0 && a_rest.iter().eq(b_rest.iter().rev())
        }
        _ => false,
    }
}

fn mix(v: usize) -> u64 {
    // splitmix64 finalizer
    let mut z = (v as u64).wrapping_add(0x9e37_79b9_7f4a_7c15);
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}

/// Order-independent hash of the loop's vertex values.
pub fn cycle_hash(vertices: &[usize]) -> u64 {
    let (sum, xor) = vertices.iter().fold((0u64, 0u64), |(sum, xor), &v| {
        let m = mix(v);
        (sum.wrapping_add(m), xor ^ m)
    });
    sum ^ xor.rotate_left(32) ^ vertices.len() as u64
}

/// Rotation-invariant cycle: the stored loop starts at its minimum vertex.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct OrientedVertexCycle<C: CycleVertices> {
    vertices: C,
}

impl<C: CycleVertices> OrientedVertexCycle<C> {
    pub fn new(mut vertices: C) -> Self {
        rotate_to_min(vertices.as_mut());
        Self { vertices }
    }

    pub fn vertices(&self) -> &C {
        &self.vertices
    }

    /// Whether `other` is the same loop traversed in the opposite direction.
    pub fn is_opposite(&self, other: &Self) -> bool {
        let (a, b) = (self.vertices.as_ref(), other.vertices.as_ref());
        !a.is_empty()
            && a.len() == b.len()
            && a.first() == b.first()
            && a[1..].iter().eq(b[1..].iter().rev())
    }
}

/// Rotation- and reflection-invariant cycle; the key of facet registries.
///
/// The stored loop is rotated to its minimum but keeps the traversal
/// direction it was built with. Use [`canonical_vertices`](Self::canonical_vertices)
/// for a direction-independent list.
#[derive(Clone, Debug)]
pub struct VertexCycle<C: CycleVertices> {
    vertices: C,
}

impl<C: CycleVertices> VertexCycle<C> {
    pub fn new(mut vertices: C) -> Self {
        rotate_to_min(vertices.as_mut());
        Self { vertices }
    }

    /// The loop as given, rotated to start at its minimum.
    pub fn vertices(&self) -> &C {
        &self.vertices
    }

    pub fn into_vertices(self) -> C {
        self.vertices
    }

    /// Direction-independent form: min first, then the smaller neighbour.
    pub fn canonical_vertices(&self) -> C {
        let mut vertices = self.vertices.clone();
        let v = vertices.as_mut();
        if v.len() > 2 && v[1] > v[v.len() - 1] {
            reverse_keep_first(v);
        }
        vertices
    }

    pub fn len(&self) -> usize {
        self.vertices.as_ref().len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.as_ref().is_empty()
    }

    pub fn contains(&self, vertex: usize) -> bool {
        self.vertices.as_ref().contains(&vertex)
    }
}

impl<C: CycleVertices> PartialEq for VertexCycle<C> {
    fn eq(&self, other: &Self) -> bool {
        same_cycle(self.vertices.as_ref(), other.vertices.as_ref())
    }
}

impl<C: CycleVertices> Eq for VertexCycle<C> {}

impl<C: CycleVertices> Hash for VertexCycle<C> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(cycle_hash(self.vertices.as_ref()));
    }
}
