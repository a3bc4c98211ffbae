//! The comment store: all live comments, keyed by identity
//!
//! ## Design
//!
//! - **Single owner**: the store is plain mutable state behind one owner
//!   (the comment actor); records themselves are immutable and handed out
//!   as `Arc<Comment>`, so readers never need a lock once they hold one.
//! - **Lazy expiry**: nothing in here runs timers. `sweep_expired` is called
//!   periodically by the owner with an explicit clock reading.
//! - **Weak entity references**: when the registry drops a host or service,
//!   the owner feeds the dead references into `remove_for_entity` and the
//!   dependent comments disappear before anyone resolves them again.
//!
//! Identities are handed out by a monotonic allocator and never reused for
//! a live comment. Hydrating from a journal advances the allocator past
//! every restored identity.

pub mod error;

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, trace};

use crate::comment::{Comment, CommentId};
use crate::registry::{EntityRef, EntityRegistry};

pub use error::{StoreError, StoreResult};

/// Collection of all live comments, keyed by identity
#[derive(Debug)]
pub struct CommentStore {
    comments: BTreeMap<CommentId, Arc<Comment>>,

    /// Next identity to hand out; always above every identity ever inserted
    next_id: CommentId,
}

impl Default for CommentStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CommentStore {
    /// Create an empty store; identities start at 1
    pub fn new() -> Self {
        Self {
            comments: BTreeMap::new(),
            next_id: 1,
        }
    }

    /// Rebuild a store from journaled comments
    ///
    /// Fails on the first duplicate identity; a journal that collides with
    /// itself is corrupt and must not be silently repaired.
    pub fn hydrate(restored: Vec<Comment>) -> StoreResult<Self> {
        let mut store = Self::new();
        for comment in restored {
            store.insert(comment)?;
        }

        debug!(
            "hydrated store with {} comments, next identity {}",
            store.len(),
            store.next_id
        );
        Ok(store)
    }

    /// Hand out the next unique identity
    pub fn allocate_id(&mut self) -> CommentId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Insert a fully constructed comment under its own identity
    pub fn insert(&mut self, comment: Comment) -> StoreResult<Arc<Comment>> {
        let id = comment.id();
        match self.comments.entry(id) {
            Entry::Occupied(_) => Err(StoreError::DuplicateIdentity(id)),
            Entry::Vacant(entry) => {
                // Keep the allocator above externally supplied identities
                if id >= self.next_id {
                    self.next_id = id + 1;
                }

                trace!("storing comment {id} on {}", comment.entity());
                let comment = Arc::new(comment);
                entry.insert(Arc::clone(&comment));
                Ok(comment)
            }
        }
    }

    pub fn get(&self, id: CommentId) -> Option<Arc<Comment>> {
        self.comments.get(&id).cloned()
    }

    /// Delete a comment by identity
    pub fn remove(&mut self, id: CommentId) -> StoreResult<Arc<Comment>> {
        self.comments
            .remove(&id)
            .ok_or(StoreError::UnknownIdentity(id))
    }

    pub fn len(&self) -> usize {
        self.comments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.comments.is_empty()
    }

    /// All live comments, in identity order
    pub fn iter(&self) -> impl Iterator<Item = &Arc<Comment>> {
        self.comments.values()
    }

    /// Comments exactly associated with `entity`
    ///
    /// Host comments for a host entity, service comments for a service
    /// entity; never a mix.
    pub fn comments_for(&self, entity: &EntityRef) -> Vec<Arc<Comment>> {
        self.comments
            .values()
            .filter(|comment| comment.matches(entity))
            .cloned()
            .collect()
    }

    /// Comments that must survive a restart
    pub fn persistent(&self) -> Vec<Arc<Comment>> {
        self.comments
            .values()
            .filter(|comment| comment.persistent())
            .cloned()
            .collect()
    }

    /// Drop every comment that is expired at `now`, returning the victims
    pub fn sweep_expired(&mut self, now: DateTime<Utc>) -> Vec<Arc<Comment>> {
        let expired: Vec<CommentId> = self
            .comments
            .values()
            .filter(|comment| comment.is_expired(now))
            .map(|comment| comment.id())
            .collect();

        let removed: Vec<Arc<Comment>> = expired
            .iter()
            .filter_map(|id| self.comments.remove(id))
            .collect();

        if !removed.is_empty() {
            debug!("swept {} expired comments", removed.len());
        }
        removed
    }

    /// Drop comments whose entity was removed from the registry
    ///
    /// For a host reference this takes every comment anchored on the host,
    /// service-scoped ones included, since those services died with it. For
    /// a service reference only that service's comments go.
    pub fn remove_for_entity(&mut self, entity: &EntityRef) -> Vec<Arc<Comment>> {
        let dead: Vec<CommentId> = self
            .comments
            .values()
            .filter(|comment| match entity {
                EntityRef::Host(host) => comment.anchored_on(host),
                EntityRef::Service(service) => comment.matches_service(service),
            })
            .map(|comment| comment.id())
            .collect();

        let removed: Vec<Arc<Comment>> = dead
            .iter()
            .filter_map(|id| self.comments.remove(id))
            .collect();

        if !removed.is_empty() {
            debug!("dropped {} comments for removed entity {entity}", removed.len());
        }
        removed
    }

    /// Drop every comment whose entity is not present in `registry`
    ///
    /// Hydration runs this before the store goes live: hosts and services
    /// can disappear between runs, and comments restored for them must not
    /// become resolvable again.
    pub fn remove_unregistered(&mut self, registry: &EntityRegistry) -> Vec<Arc<Comment>> {
        let dead: Vec<CommentId> = self
            .comments
            .values()
            .filter(|comment| !registry.contains(comment.entity()))
            .map(|comment| comment.id())
            .collect();

        let removed: Vec<Arc<Comment>> = dead
            .iter()
            .filter_map(|id| self.comments.remove(id))
            .collect();

        if !removed.is_empty() {
            debug!(
                "dropped {} comments without a registered entity",
                removed.len()
            );
        }
        removed
    }
}
