//! Error taxonomy for property operations
//!
//! Most failures are "soft": the caller passes a `throw` flag and gets either
//! an `Err` (strict semantics) or `Ok(false)` (sloppy semantics) back.
//! [`JsError::RangeViolation`] is the exception and always propagates.

use thiserror::Error;

use crate::value::Value;

/// Error raised by an object operation
#[derive(Debug, Clone, Error)]
pub enum JsError {
    /// Array length outside `[0, 2^32 - 1]` or not an integer
    #[error("RangeError: Invalid array length")]
    RangeViolation,
    /// Write to a read-only property, or a new property on a non-extensible object
    #[error("TypeError: {0}")]
    WriteRejected(String),
    /// Delete of a non-configurable property
    #[error("TypeError: {0}")]
    DeleteRejected(String),
    /// Length shrink stopped at a non-configurable element
    #[error("TypeError: Cannot redefine property: length")]
    LengthRedefineRejected,
    /// Any other type error (redefinition, not callable, prototype cycle, ...)
    #[error("TypeError: {0}")]
    TypeError(String),
    /// A value thrown by native code (getter, setter or function body)
    #[error("Uncaught {0}")]
    Thrown(Value),
}

/// Result type for object operations
pub type JsResult<T> = Result<T, JsError>;

/// Report a soft failure.
///
/// Raises `err` when `throw` is set, otherwise reports the failure as
/// `Ok(false)`.
pub fn reject(throw: bool, err: JsError) -> JsResult<bool> {
    tracing::trace!(%err, throw, "operation rejected");
    if throw { Err(err) } else { Ok(false) }
}
