//! Journal trait definition

use async_trait::async_trait;

use super::error::JournalResult;
use crate::comment::{Comment, CommentId};

/// Trait for durable comment storage
///
/// Implementations must be `Send + Sync` as they are driven from async
/// tasks. The journal only ever sees comments with `persistent == true`;
/// filtering is the caller's job.
///
/// Writes are idempotent: recording the same identity twice overwrites the
/// earlier row, and forgetting an identity that is not journaled is a no-op.
#[async_trait]
pub trait CommentJournal: Send + Sync {
    /// Write one comment to durable storage
    async fn record(&self, comment: &Comment) -> JournalResult<()>;

    /// Remove a comment from durable storage
    ///
    /// Called when a persistent comment is deleted, expires, or loses its
    /// entity, so it does not come back on the next restart.
    async fn forget(&self, id: CommentId) -> JournalResult<()>;

    /// Load every journaled comment, in identity order
    ///
    /// Used once at startup to hydrate the store. Rows are rebuilt through
    /// the validating constructor; a row that fails validation aborts the
    /// load with [`super::JournalError::CorruptRecord`].
    async fn load_all(&self) -> JournalResult<Vec<Comment>>;

    /// Human-readable stats about the journal
    async fn stats(&self) -> JournalResult<String>;

    /// Close the journal and release resources
    async fn close(&self) -> JournalResult<()>;
}
