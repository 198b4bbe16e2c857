//! Persistence hook for whole meshes.
//!
//! A snapshot is a plain serde value: coordinates, connectivity and every
//! attribute store as [`StoreRecord`](crate::data::registry::StoreRecord)s.
//! Reading one back needs an [`AttributeRegistry`] to resolve attribute
//! value types. The file format itself is left to the caller; the JSON
//! helpers below exist for tests and quick dumps.

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::data::registry::AttributeRegistry;
use crate::mesh_error::MeshError;

/// Meshes that can be saved and restored.
pub trait MeshSnapshot: Sized {
    type Record: Serialize + DeserializeOwned;

    /// # Errors
    /// `UnsupportedOperation` for meshes that are not self-contained, or an
    /// attribute encoding error.
    fn to_snapshot(&self) -> Result<Self::Record, MeshError>;

    /// # Errors
    /// `UnsupportedOperation` for meshes that cannot be rebuilt on their own,
    /// attribute decoding errors, or `InvalidElement` / `InvariantViolation`
    /// when the record is inconsistent.
    fn from_snapshot(record: Self::Record, registry: &AttributeRegistry) -> Result<Self, MeshError>;
}

/// Encode `mesh` as a JSON document.
pub fn to_json<M: MeshSnapshot>(mesh: &M) -> Result<String, MeshError> {
    let record = mesh.to_snapshot()?;
    serde_json::to_string(&record).map_err(|e| MeshError::SnapshotEncoding(e.to_string()))
}

/// Decode a mesh written by [`to_json`].
pub fn from_json<M: MeshSnapshot>(json: &str, registry: &AttributeRegistry) -> Result<M, MeshError> {
    let record: M::Record =
        serde_json::from_str(json).map_err(|e| MeshError::SnapshotEncoding(e.to_string()))?;
    M::from_snapshot(record, registry)
}
