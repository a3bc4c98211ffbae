//! Journal row layout
//!
//! The row keeps the service discriminator as its own column next to the
//! optional service description. That sounds redundant, but it means a
//! reload exercises the same association validation as a live command: a
//! row claiming to be service-scoped without naming a service is reported
//! as corrupt instead of being guessed at.

use chrono::{DateTime, Utc};

use super::error::{JournalError, JournalResult};
use crate::comment::{Comment, CommentSource, CommentType};
use crate::registry::HostRef;

/// A single comment as stored in the journal
#[derive(Debug, Clone, PartialEq)]
pub struct CommentRow {
    pub id: i64,
    pub author: String,
    pub text: String,
    pub entry_type: String,
    /// Unix milliseconds
    pub entry_time: i64,
    pub is_service: bool,
    pub host: String,
    pub service: Option<String>,
    /// Unix milliseconds; `None` for comments that never expire
    pub expire_time: Option<i64>,
    pub persistent: bool,
    pub source: String,
}

impl CommentRow {
    pub fn from_comment(comment: &Comment) -> JournalResult<Self> {
        let id = i64::try_from(comment.id()).map_err(|_| {
            JournalError::CorruptRecord(format!(
                "identity {} exceeds the journal range",
                comment.id()
            ))
        })?;

        Ok(Self {
            id,
            author: comment.author().to_string(),
            text: comment.text().to_string(),
            entry_type: comment.entry_type().to_string(),
            entry_time: comment.entry_time().timestamp_millis(),
            is_service: comment.applies_to_service(),
            host: comment.host().name().to_string(),
            service: comment
                .service()
                .map(|service| service.description().to_string()),
            expire_time: comment.expire_time().map(|t| t.timestamp_millis()),
            persistent: comment.persistent(),
            source: comment.source().to_string(),
        })
    }

    /// Rebuild the comment, running the full construction contract
    pub fn into_comment(self) -> JournalResult<Comment> {
        let id = u64::try_from(self.id).map_err(|_| {
            JournalError::CorruptRecord(format!("negative identity: {}", self.id))
        })?;
        let entry_type = parse_entry_type(&self.entry_type)?;
        let source = parse_source(&self.source)?;
        let entry_time = parse_millis(self.entry_time)?;
        let expire_time = self.expire_time.map(parse_millis).transpose()?;

        Comment::from_parts(
            id,
            self.author,
            self.text,
            entry_type,
            entry_time,
            self.is_service,
            HostRef::new(self.host),
            self.service,
            self.persistent,
            source,
            expire_time,
        )
        .map_err(|e| JournalError::CorruptRecord(e.to_string()))
    }
}

fn parse_entry_type(value: &str) -> JournalResult<CommentType> {
    match value {
        "user" => Ok(CommentType::User),
        "downtime" => Ok(CommentType::Downtime),
        "flapping" => Ok(CommentType::Flapping),
        "acknowledgement" => Ok(CommentType::Acknowledgement),
        other => Err(JournalError::CorruptRecord(format!(
            "unknown entry type: {}",
            other
        ))),
    }
}

fn parse_source(value: &str) -> JournalResult<CommentSource> {
    match value {
        "internal" => Ok(CommentSource::Internal),
        "external" => Ok(CommentSource::External),
        other => Err(JournalError::CorruptRecord(format!(
            "unknown comment source: {}",
            other
        ))),
    }
}

fn parse_millis(millis: i64) -> JournalResult<DateTime<Utc>> {
    DateTime::from_timestamp_millis(millis).ok_or_else(|| {
        JournalError::CorruptRecord(format!("timestamp out of range: {}", millis))
    })
}
