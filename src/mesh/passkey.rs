//! Capability token for structural mesh edits.
//!
//! Every method that changes the structure of a mesh (creating, deleting or
//! permuting entities, editing connectivity, writing adjacencies) takes a
//! [`BuilderKey`] by value. The key can only be constructed inside the
//! `mesh` module, so outside code reaches those methods exclusively through
//! a builder, which in turn holds the only `&mut` borrow of its mesh.

/// Passkey handed out by mesh builders.
#[derive(Debug)]
pub struct BuilderKey {
    _private: (),
}

impl BuilderKey {
    pub(in crate::mesh) const fn new() -> Self {
        Self { _private: () }
    }
}
