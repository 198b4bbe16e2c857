//! Invariant checking shared by stores, registries and meshes.
//!
//! Every structure that keeps parallel arrays in lock-step implements
//! [`DebugInvariants`]. Mutating entry points call [`debug_invariants!`] on
//! exit; the check compiles away in release builds unless the
//! `check-invariants` feature is enabled.

use crate::mesh_error::MeshError;

/// Trait for validating data structure invariants.
pub trait DebugInvariants {
    /// Panic on the first broken invariant when checking is enabled.
    fn debug_assert_invariants(&self) {
        crate::debug_invariants!(self.validate_invariants(), "structure check failed");
    }

    /// Validate invariants and return the first error encountered.
    fn validate_invariants(&self) -> Result<(), MeshError>;
}

/// Returns `Err(InvariantViolation)` built from `message` when `holds` is false.
#[inline]
pub fn ensure(holds: bool, message: impl FnOnce() -> String) -> Result<(), MeshError> {
    if holds {
        Ok(())
    } else {
        Err(MeshError::InvariantViolation(message()))
    }
}

/// Run a fallible check and panic on error when invariant checking is enabled.
#[macro_export]
macro_rules! debug_invariants {
    ($expr:expr, $($ctx:tt)*) => {
        #[cfg(any(debug_assertions, feature = "strict-invariants", feature = "check-invariants"))]
        if let Err(e) = $expr {
            panic!(concat!("[invariants] ", $($ctx)*, ": {}"), e);
        }
    };
}
