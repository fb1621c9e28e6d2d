//! Error kinds raised by the sparse-map algebra and the tensor-of-tensors routines.
//!
//! Fallible functions in this crate return [`anyhow::Error`]. Errors that belong to the
//! taxonomy below are constructed from [`SparseMapError`] so that callers can recover the kind
//! with [`anyhow::Error::downcast_ref`].

use thiserror::Error;

/// Kinds of failures reported by domains, sparse maps and the routines consuming them.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum SparseMapError {
    /// Two ranks that must agree do not.
    #[error("rank mismatch in {context}: expected {expected}, got {actual}")]
    RankMismatch {
        context: String,
        expected: usize,
        actual: usize,
    },

    /// An ordinal, key, mode or tile lies outside the permitted range.
    #[error("out of range: {0}")]
    OutOfRange(String),

    /// An index is not a member of the container that was queried.
    #[error("not found: {0}")]
    NotFound(String),

    /// The tilings attached to the operands of a binary operation are incompatible.
    #[error("tiling mismatch: {0}")]
    TilingMismatch(String),

    /// An operation requires a tiling that has not been attached.
    #[error("missing tiling: {0}")]
    MissingTiling(String),

    /// Dependent domains of one sparse map carry different tilings.
    #[error("inconsistent tilings: {0}")]
    InconsistentTiling(String),
}

impl SparseMapError {
    /// Convenience constructor for [`SparseMapError::RankMismatch`].
    pub(crate) fn rank_mismatch(context: &str, expected: usize, actual: usize) -> Self {
        Self::RankMismatch {
            context: context.to_string(),
            expected,
            actual,
        }
    }
}
