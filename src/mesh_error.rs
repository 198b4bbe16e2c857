//! MeshError: Unified error type for geomesh public APIs
//!
//! Contract violations that can only come from a programming error (an index
//! out of range, a local facet that does not exist) are `debug_assert!`s.
//! Everything that can be caused by the data being processed is reported
//! through this type, and the operation that raised it leaves the structure
//! untouched.

use thiserror::Error;

/// Unified error type for geomesh operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MeshError {
    /// A permutation was not a bijection on `[0, n)`.
    #[error("Invalid permutation: {0}")]
    InvalidPermutation(String),
    /// A deletion mask does not cover every element of the set.
    #[error("Deletion mask length mismatch: expected {expected}, found {found}")]
    MaskLengthMismatch { expected: usize, found: usize },
    /// A facet (or polygon edge) is owned by more than two elements.
    #[error("Non-manifold facet {vertices:?}: shared by {owners} elements")]
    NonManifoldFacet { vertices: Vec<usize>, owners: usize },
    /// Copy target already holds elements.
    #[error("Cannot copy into a non-empty {kind} set ({len} elements)")]
    NonEmptyTarget { kind: &'static str, len: usize },
    /// No attribute registered under this name.
    #[error("Attribute `{0}` not found")]
    AttributeNotFound(String),
    /// The attribute exists with another value type or storage kind.
    #[error("Attribute `{name}` has type `{found}`, requested `{expected}`")]
    AttributeTypeMismatch {
        name: String,
        expected: String,
        found: String,
    },
    /// An attribute with this name already exists.
    #[error("Attribute `{0}` already exists")]
    DuplicateAttribute(String),
    /// The typed-column registry has no loader for this tag.
    #[error("Unknown attribute type tag `{0}`")]
    UnknownAttributeType(String),
    /// Encoding or decoding an attribute payload failed.
    #[error("Attribute `{name}` serialization failed: {reason}")]
    AttributeSerialization { name: String, reason: String },
    /// Operation not supported by this mesh variant.
    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(&'static str),
    /// No registry entry matches the given vertex cycle.
    #[error("No facet found for vertices {0:?}")]
    FacetNotFound(Vec<usize>),
    /// Interpolation weights do not match the interpolated indices.
    #[error("Invalid interpolation: {indices} indices for {lambdas} weights")]
    InvalidInterpolation { indices: usize, lambdas: usize },
    /// A mesh snapshot could not be encoded or decoded.
    #[error("Snapshot encoding failed: {0}")]
    SnapshotEncoding(String),
    /// An element description is malformed.
    #[error("Invalid element: {0}")]
    InvalidElement(String),
    /// A structure invariant does not hold.
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),
}
