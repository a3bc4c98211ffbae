//! The comment record: one annotation attached to a host or a service
//!
//! A comment is immutable value data. All validation happens at construction
//! time; after that the record only answers queries (`is_expired`, `matches`,
//! field accessors) and never performs I/O or mutates state. Updates are
//! modeled as delete-then-recreate with a fresh identity.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::registry::{EntityRef, HostRef, ServiceRef};

/// Stable handle for a comment, unique among all live comments in a store
pub type CommentId = u64;

/// Why a comment exists
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommentType {
    /// Free-form operator note
    User,

    /// Attached while a downtime is scheduled
    Downtime,

    /// Attached when a host/service starts or stops flapping
    Flapping,

    /// Attached when a problem is acknowledged
    Acknowledgement,
}

impl fmt::Display for CommentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommentType::User => write!(f, "user"),
            CommentType::Downtime => write!(f, "downtime"),
            CommentType::Flapping => write!(f, "flapping"),
            CommentType::Acknowledgement => write!(f, "acknowledgement"),
        }
    }
}

/// Where a comment came from, independent of its [`CommentType`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommentSource {
    /// Generated by the engine itself
    Internal,

    /// Submitted from outside, e.g. an operator command
    External,
}

impl fmt::Display for CommentSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommentSource::Internal => write!(f, "internal"),
            CommentSource::External => write!(f, "external"),
        }
    }
}

/// Errors detected when constructing a comment
///
/// A rejected comment must not affect other records; callers report the
/// rejection to whoever requested the comment and carry on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommentError {
    /// The service discriminator disagrees with the supplied references
    InvalidAssociation(String),

    /// An expiring comment whose deadline is not after its entry time
    InvalidExpiry {
        entry_time: DateTime<Utc>,
        expire_time: DateTime<Utc>,
    },
}

impl fmt::Display for CommentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommentError::InvalidAssociation(msg) => {
                write!(f, "invalid comment association: {}", msg)
            }
            CommentError::InvalidExpiry {
                entry_time,
                expire_time,
            } => write!(
                f,
                "invalid expiry: expire time {} is not after entry time {}",
                expire_time, entry_time
            ),
        }
    }
}

impl std::error::Error for CommentError {}

/// An annotation attached to a monitored host or service
///
/// The fields are private on purpose: a successfully constructed comment can
/// never enter an invalid state, which makes it safe to share behind an `Arc`
/// for lock-free concurrent reads. The owning store is responsible for
/// identity uniqueness and for dropping comments whose entity disappeared.
#[derive(Debug, Clone, PartialEq)]
pub struct Comment {
    id: CommentId,
    author: String,
    text: String,
    entry_type: CommentType,
    entry_time: DateTime<Utc>,
    entity: EntityRef,
    expire_time: Option<DateTime<Utc>>,
    persistent: bool,
    source: CommentSource,
}

impl Comment {
    /// Create a comment attached to `entity`
    ///
    /// `expire_time` of `None` means the comment never expires. An expiring
    /// comment must expire strictly after its entry time, otherwise
    /// construction fails with [`CommentError::InvalidExpiry`].
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: CommentId,
        author: impl Into<String>,
        text: impl Into<String>,
        entry_type: CommentType,
        entry_time: DateTime<Utc>,
        entity: EntityRef,
        persistent: bool,
        source: CommentSource,
        expire_time: Option<DateTime<Utc>>,
    ) -> Result<Self, CommentError> {
        if let Some(expire) = expire_time
            && expire <= entry_time
        {
            return Err(CommentError::InvalidExpiry {
                entry_time,
                expire_time: expire,
            });
        }

        Ok(Self {
            id,
            author: author.into(),
            text: text.into(),
            entry_type,
            entry_time,
            entity,
            expire_time,
            persistent,
            source,
        })
    }

    /// Reassemble a comment from raw parts, as they arrive from a journal
    /// row or an external command
    ///
    /// The service discriminator must agree with the presence of a service
    /// description: a service-scoped comment without a service, or a
    /// host-scoped comment carrying one, fails with
    /// [`CommentError::InvalidAssociation`] instead of being silently
    /// normalized.
    #[allow(clippy::too_many_arguments)]
    pub fn from_parts(
        id: CommentId,
        author: impl Into<String>,
        text: impl Into<String>,
        entry_type: CommentType,
        entry_time: DateTime<Utc>,
        applies_to_service: bool,
        host: HostRef,
        service_description: Option<String>,
        persistent: bool,
        source: CommentSource,
        expire_time: Option<DateTime<Utc>>,
    ) -> Result<Self, CommentError> {
        let entity = match (applies_to_service, service_description) {
            (true, Some(description)) => {
                EntityRef::Service(ServiceRef::new(host, description))
            }
            (false, None) => EntityRef::Host(host),
            (true, None) => {
                return Err(CommentError::InvalidAssociation(
                    "service comment without a service reference".to_string(),
                ));
            }
            (false, Some(_)) => {
                return Err(CommentError::InvalidAssociation(
                    "host comment carrying a service reference".to_string(),
                ));
            }
        };

        Self::new(
            id,
            author,
            text,
            entry_type,
            entry_time,
            entity,
            persistent,
            source,
            expire_time,
        )
    }

    /// Whether the comment is stale at the supplied instant
    ///
    /// Pure function of the record and the explicit clock reading; the
    /// boundary instant itself counts as expired. Callers sweep lazily, the
    /// record never removes itself.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expire_time.is_some_and(|expire| now >= expire)
    }

    /// Exact association check: host comments only match the host entity,
    /// service comments only match the exact (host, service) pair
    pub fn matches(&self, entity: &EntityRef) -> bool {
        self.entity == *entity
    }

    /// True iff the comment is attached to `host` as a whole
    pub fn matches_host(&self, host: &HostRef) -> bool {
        matches!(&self.entity, EntityRef::Host(h) if h == host)
    }

    /// True iff the comment is attached to exactly this service
    pub fn matches_service(&self, service: &ServiceRef) -> bool {
        matches!(&self.entity, EntityRef::Service(s) if s == service)
    }

    /// True when the comment is anchored on `host`, either directly or
    /// through one of its services
    ///
    /// Used when a host disappears: every comment anchored on it has to go.
    pub fn anchored_on(&self, host: &HostRef) -> bool {
        self.entity.host() == host
    }

    pub fn id(&self) -> CommentId {
        self.id
    }

    pub fn author(&self) -> &str {
        &self.author
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn entry_type(&self) -> CommentType {
        self.entry_type
    }

    /// Creation time, set once at construction
    pub fn entry_time(&self) -> DateTime<Utc> {
        self.entry_time
    }

    pub fn entity(&self) -> &EntityRef {
        &self.entity
    }

    pub fn applies_to_service(&self) -> bool {
        self.entity.is_service()
    }

    /// The anchoring host; for service comments this is the owning host
    pub fn host(&self) -> &HostRef {
        self.entity.host()
    }

    /// The service reference, present iff the comment is service-scoped
    pub fn service(&self) -> Option<&ServiceRef> {
        self.entity.service()
    }

    pub fn expires(&self) -> bool {
        self.expire_time.is_some()
    }

    pub fn expire_time(&self) -> Option<DateTime<Utc>> {
        self.expire_time
    }

    /// Whether the comment must survive a restart via the journal
    pub fn persistent(&self) -> bool {
        self.persistent
    }

    pub fn source(&self) -> CommentSource {
        self.source
    }
}
