//! # Object Core
//!
//! The shared object model of the library: an atomically reference-counted
//! handle type ([`ObjectRef`]), the capability traits objects implement to
//! participate in comparison, display and diff printing, the autorelease
//! pool for deferred release, and adapters that let plain values (text,
//! numbers, vectors, colours) ride through the containers and the diff
//! engine as objects.

pub mod adapters;
pub mod autorelease;
pub mod object;

pub use adapters::{ColorValue, FloatValue, IntValue, TextValue, VectorValue};
pub use autorelease::{drain_default_pool, with_default_pool, AutoreleasePool};
pub use object::{Comparable, CoreObject, DiffPrintable, Displayable, ObjectRef};

/// Outcome of an editing or container operation.
///
/// Failures are surfaced as values, not panics; callers are expected to
/// inspect the result. `NotChanged` and `NotFound` are benign no-ops,
/// the remaining non-`Ok` variants indicate a rejected precondition.
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// The operation was applied.
    Ok,
    /// Validation passed but the new value equals the current one;
    /// nothing was touched.
    NotChanged,
    /// A field validator rejected the value; no state was changed and
    /// any enclosing transaction rolls back.
    InvalidInput,
    /// An index was outside the container bounds.
    IndexOutOfBounds,
    /// A required object handle was absent.
    NullHandle,
    /// The key is already present and the operation does not overwrite.
    DuplicateKey,
    /// The key is not acceptable to the container (e.g. empty).
    InvalidKey,
    /// The lookup found nothing; the call was a no-op.
    NotFound,
}

impl Status {
    /// True for `Ok`.
    pub fn is_ok(self) -> bool {
        self == Status::Ok
    }

    /// True for the benign outcomes `Ok` and `NotChanged`.
    pub fn is_acceptable(self) -> bool {
        matches!(self, Status::Ok | Status::NotChanged)
    }
}
