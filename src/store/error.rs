//! Error types for comment store operations

use std::fmt;

use crate::comment::CommentId;

/// Result type alias for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur when mutating the comment store
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// A comment with this identity is already live
    DuplicateIdentity(CommentId),

    /// No live comment carries this identity
    UnknownIdentity(CommentId),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::DuplicateIdentity(id) => {
                write!(f, "comment identity {} is already in use", id)
            }
            StoreError::UnknownIdentity(id) => {
                write!(f, "no comment with identity {}", id)
            }
        }
    }
}

impl std::error::Error for StoreError {}
