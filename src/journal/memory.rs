//! In-memory journal (no real persistence)
//!
//! Rows only live as long as the journal value itself, so nothing actually
//! survives a process restart. Useful for:
//! - Tests without filesystem dependencies
//! - Deployments that explicitly opt out of persistence

use std::collections::BTreeMap;
use std::sync::Mutex;

use async_trait::async_trait;
use tracing::debug;

use super::backend::CommentJournal;
use super::error::JournalResult;
use super::schema::CommentRow;
use crate::comment::{Comment, CommentId};

/// Journal backend that keeps rows in a mutex-guarded map
#[derive(Debug, Default)]
pub struct MemoryJournal {
    rows: Mutex<BTreeMap<CommentId, CommentRow>>,
}

impl MemoryJournal {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CommentJournal for MemoryJournal {
    async fn record(&self, comment: &Comment) -> JournalResult<()> {
        let row = CommentRow::from_comment(comment)?;
        self.rows.lock().unwrap().insert(comment.id(), row);
        Ok(())
    }

    async fn forget(&self, id: CommentId) -> JournalResult<()> {
        self.rows.lock().unwrap().remove(&id);
        Ok(())
    }

    async fn load_all(&self) -> JournalResult<Vec<Comment>> {
        let rows: Vec<CommentRow> = self.rows.lock().unwrap().values().cloned().collect();
        rows.into_iter().map(CommentRow::into_comment).collect()
    }

    async fn stats(&self) -> JournalResult<String> {
        let count = self.rows.lock().unwrap().len();
        Ok(format!("In-memory journal: {} comments", count))
    }

    async fn close(&self) -> JournalResult<()> {
        debug!("closing in-memory journal (no-op)");
        Ok(())
    }
}
