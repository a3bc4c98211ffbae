//! Message types for the comment actor

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::oneshot;

use crate::comment::{Comment, CommentId, CommentSource, CommentType};
use crate::registry::{EntityRef, HostRef, ServiceRef};

/// A request to attach a new comment
///
/// Identity and entry time are assigned by the actor when the request is
/// processed; callers only describe the annotation itself.
#[derive(Debug, Clone)]
pub struct CommentRequest {
    pub author: String,
    pub text: String,
    pub entry_type: CommentType,
    pub entity: EntityRef,
    pub persistent: bool,
    pub source: CommentSource,

    /// Absolute expiry deadline; `None` means the comment never expires
    pub expire_time: Option<DateTime<Utc>>,
}

/// Commands that can be sent to the CommentActor
#[derive(Debug)]
pub enum CommentCommand {
    /// Attach a new comment to a registered entity
    Add {
        request: CommentRequest,
        respond_to: oneshot::Sender<anyhow::Result<Arc<Comment>>>,
    },

    /// Delete a comment by its identity
    Delete {
        id: CommentId,
        respond_to: oneshot::Sender<anyhow::Result<Arc<Comment>>>,
    },

    /// Look up a comment by identity
    Get {
        id: CommentId,
        respond_to: oneshot::Sender<Option<Arc<Comment>>>,
    },

    /// List comments, optionally restricted to one entity
    List {
        entity: Option<EntityRef>,
        respond_to: oneshot::Sender<Vec<Arc<Comment>>>,
    },

    /// Register a host in the entity registry
    AddHost {
        host: HostRef,
        display: Option<String>,
        respond_to: oneshot::Sender<bool>,
    },

    /// Register a service on an already-registered host
    AddService {
        service: ServiceRef,
        display: Option<String>,
        respond_to: oneshot::Sender<anyhow::Result<()>>,
    },

    /// Remove a host, its services, and every dependent comment
    ///
    /// Responds with the number of comments dropped.
    RemoveHost {
        host: HostRef,
        respond_to: oneshot::Sender<usize>,
    },

    /// Remove one service and its comments
    RemoveService {
        service: ServiceRef,
        respond_to: oneshot::Sender<usize>,
    },

    /// Run an expiry sweep immediately (bypassing the interval timer)
    ///
    /// Used for testing and manual maintenance.
    SweepNow {
        respond_to: oneshot::Sender<usize>,
    },

    /// Get store statistics
    GetStats {
        respond_to: oneshot::Sender<StoreStats>,
    },

    /// Gracefully shut down; flushes and closes the journal
    Shutdown,
}

/// Why a comment left the store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemovalReason {
    /// Explicitly deleted by identity
    Deleted,

    /// Its expiry deadline passed
    Expired,

    /// Its host or service was removed from the registry
    EntityRemoved,
}

/// Event published whenever the comment population changes
///
/// Broadcast to all interested subscribers; a lagging subscriber may miss
/// events, which is acceptable because the store remains the source of truth.
#[derive(Debug, Clone)]
pub enum CommentEvent {
    Added(Arc<Comment>),
    Removed {
        comment: Arc<Comment>,
        reason: RemovalReason,
    },
}

/// Store statistics
#[derive(Debug, Clone, Default)]
pub struct StoreStats {
    /// Live comments in the store
    pub live_comments: usize,

    /// Of those, how many are journaled
    pub persistent_comments: usize,

    /// Registered hosts
    pub hosts: usize,

    /// Registered services
    pub services: usize,

    /// Comments removed by expiry sweeps since startup
    pub swept_total: u64,
}
