//! Typed error types for the threadedcomments-core service layer.

use thiserror::Error;

/// Result type alias for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in threadedcomments-core.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The tree configuration cannot produce correctly ordered paths.
    #[error("Invalid tree configuration: {message}")]
    Config { message: String },

    /// An id needs more digits than one path segment holds.
    #[error("Comment id {id} does not fit in a {digits}-digit path segment")]
    PathCapacity { id: i64, digits: usize },

    /// A comment was not found.
    #[error("Comment not found: {id}")]
    CommentNotFound { id: i64 },

    /// A new comment was rejected before reaching the store.
    #[error("Invalid comment: {message}")]
    Validation { message: String },

    /// A stored `tree_path` could not be decoded.
    #[error("Malformed tree path: {path:?}")]
    MalformedPath { path: String },

    /// The store rejected an operation (including foreign-key violations).
    #[error(transparent)]
    Storage(#[from] rusqlite::Error),

    /// An internal error, usually opening or initialising the store.
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl CoreError {
    /// True when the store refused a write because of a constraint, such as
    /// a `parent_id` that references no comment.
    #[must_use]
    pub fn is_constraint_violation(&self) -> bool {
        matches!(
            self,
            Self::Storage(rusqlite::Error::SqliteFailure(e, _))
                if e.code == rusqlite::ErrorCode::ConstraintViolation
        )
    }
}
