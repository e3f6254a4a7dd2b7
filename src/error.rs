//! Error types.
//!
//! The taxonomy is deliberately narrow: a malformed element surfaces
//! synchronously from `render`, a collaborator failure propagates out of the
//! work loop and halts the pass, and a stale state setter is a silent no-op.
//! There is no internal retry logic anywhere; resilience belongs to the
//! caller.

use thiserror::Error;

/// Failure reported by the retained-tree collaborator.
#[derive(Debug, Error)]
#[error("retained-tree operation `{op}` failed: {message}")]
pub struct HostError {
    /// The collaborator operation that failed.
    pub op: &'static str,
    /// Host-specific description.
    pub message: String,
}

impl HostError {
    /// Create a host error for the given operation.
    pub fn new(op: &'static str, message: impl Into<String>) -> Self {
        Self {
            op,
            message: message.into(),
        }
    }
}

/// Engine-level errors.
#[derive(Debug, Error)]
pub enum EngineError {
    /// An element has no usable kind where a retained node must be created.
    /// Fatal for the pass; surfaced synchronously at the `render` call for
    /// static trees, or out of the work loop for component output.
    #[error("element kind is empty; a retained node cannot be created")]
    MissingKind,

    /// The retained-tree collaborator failed. Not retried; a failed commit
    /// can leave the retained tree partially updated.
    #[error(transparent)]
    Host(#[from] HostError),
}
