//! CommentActor - owns the comment store and the entity registry
//!
//! The actor is the single writer (spec'd as the "comment store"
//! collaborator): it assigns identities, validates requests against the
//! registry, runs the periodic expiry sweep, and keeps the journal in step
//! with the in-memory store. Everything it hands out is an immutable
//! `Arc<Comment>` snapshot.
//!
//! A failing journal write is logged and does not fail the command: losing
//! durability is an operational problem, losing the engine's live state over
//! it would be worse.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Utc;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::time::interval;
use tracing::{debug, error, instrument, trace, warn};

use crate::comment::{Comment, CommentId};
use crate::journal::CommentJournal;
use crate::registry::{EntityRef, EntityRegistry, HostRef, ServiceRef};
use crate::store::CommentStore;

use super::messages::{
    CommentCommand, CommentEvent, CommentRequest, RemovalReason, StoreStats,
};

/// Actor that serializes all comment mutation
pub struct CommentActor {
    store: CommentStore,
    registry: EntityRegistry,

    /// Durable storage for persistent comments (None = memory-only engine)
    journal: Option<Box<dyn CommentJournal>>,

    /// Command receiver
    command_rx: mpsc::Receiver<CommentCommand>,

    /// Broadcast sender for comment events
    event_tx: broadcast::Sender<CommentEvent>,

    /// How often the expiry sweep runs
    sweep_interval: Duration,

    /// Comments removed by sweeps since startup
    swept_total: u64,
}

impl CommentActor {
    pub fn new(
        store: CommentStore,
        registry: EntityRegistry,
        journal: Option<Box<dyn CommentJournal>>,
        command_rx: mpsc::Receiver<CommentCommand>,
        event_tx: broadcast::Sender<CommentEvent>,
        sweep_interval: Duration,
    ) -> Self {
        Self {
            store,
            registry,
            journal,
            command_rx,
            event_tx,
            sweep_interval,
            swept_total: 0,
        }
    }

    /// Run the actor's main loop
    ///
    /// Runs until a Shutdown command arrives or the command channel closes.
    #[instrument(skip(self))]
    pub async fn run(mut self) {
        debug!(
            "starting comment actor with {} comments, sweep every {:?}",
            self.store.len(),
            self.sweep_interval
        );

        let mut ticker = interval(self.sweep_interval);
        // The first tick fires immediately; that initial sweep is harmless
        // but noisy, so skip it.
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.sweep().await;
                }

                cmd = self.command_rx.recv() => {
                    match cmd {
                        Some(CommentCommand::Shutdown) | None => {
                            debug!("shutting down comment actor");
                            self.close_journal().await;
                            break;
                        }
                        Some(cmd) => self.handle_command(cmd).await,
                    }
                }
            }
        }
    }

    async fn handle_command(&mut self, cmd: CommentCommand) {
        match cmd {
            CommentCommand::Add {
                request,
                respond_to,
            } => {
                let result = self.add_comment(request).await;
                let _ = respond_to.send(result);
            }

            CommentCommand::Delete { id, respond_to } => {
                let result = self.delete_comment(id).await;
                let _ = respond_to.send(result);
            }

            CommentCommand::Get { id, respond_to } => {
                let _ = respond_to.send(self.store.get(id));
            }

            CommentCommand::List { entity, respond_to } => {
                let comments = match entity {
                    Some(entity) => self.store.comments_for(&entity),
                    None => self.store.iter().cloned().collect(),
                };
                let _ = respond_to.send(comments);
            }

            CommentCommand::AddHost {
                host,
                display,
                respond_to,
            } => {
                let _ = respond_to.send(self.registry.add_host(host, display));
            }

            CommentCommand::AddService {
                service,
                display,
                respond_to,
            } => {
                let result = self
                    .registry
                    .add_service(service, display)
                    .map_err(Into::into);
                let _ = respond_to.send(result);
            }

            CommentCommand::RemoveHost { host, respond_to } => {
                let dead = self.registry.remove_host(&host);
                let dropped = self.drop_for_entities(&dead).await;
                let _ = respond_to.send(dropped);
            }

            CommentCommand::RemoveService {
                service,
                respond_to,
            } => {
                let dead: Vec<EntityRef> =
                    self.registry.remove_service(&service).into_iter().collect();
                let dropped = self.drop_for_entities(&dead).await;
                let _ = respond_to.send(dropped);
            }

            CommentCommand::SweepNow { respond_to } => {
                let swept = self.sweep().await;
                let _ = respond_to.send(swept);
            }

            CommentCommand::GetStats { respond_to } => {
                let _ = respond_to.send(StoreStats {
                    live_comments: self.store.len(),
                    persistent_comments: self.store.persistent().len(),
                    hosts: self.registry.host_count(),
                    services: self.registry.service_count(),
                    swept_total: self.swept_total,
                });
            }

            // Shutdown is handled in the run loop
            CommentCommand::Shutdown => unreachable!("handled by run loop"),
        }
    }

    async fn add_comment(&mut self, request: CommentRequest) -> Result<Arc<Comment>> {
        if !self.registry.contains(&request.entity) {
            anyhow::bail!("unknown entity: {}", request.entity);
        }

        let id = self.store.allocate_id();
        let comment = Comment::new(
            id,
            request.author,
            request.text,
            request.entry_type,
            Utc::now(),
            request.entity,
            request.persistent,
            request.source,
            request.expire_time,
        )?;

        let comment = self.store.insert(comment)?;
        trace!("added comment {id} on {}", comment.entity());

        if comment.persistent() {
            self.journal_record(&comment).await;
        }

        let _ = self.event_tx.send(CommentEvent::Added(Arc::clone(&comment)));
        Ok(comment)
    }

    async fn delete_comment(&mut self, id: CommentId) -> Result<Arc<Comment>> {
        let comment = self.store.remove(id)?;
        trace!("deleted comment {id}");

        self.journal_forget(&comment).await;
        let _ = self.event_tx.send(CommentEvent::Removed {
            comment: Arc::clone(&comment),
            reason: RemovalReason::Deleted,
        });
        Ok(comment)
    }

    /// Drop every expired comment, using one clock reading for the whole pass
    async fn sweep(&mut self) -> usize {
        let removed = self.store.sweep_expired(Utc::now());
        let count = removed.len();
        self.swept_total += count as u64;

        for comment in removed {
            self.journal_forget(&comment).await;
            let _ = self.event_tx.send(CommentEvent::Removed {
                comment,
                reason: RemovalReason::Expired,
            });
        }

        count
    }

    async fn drop_for_entities(&mut self, dead: &[EntityRef]) -> usize {
        let mut dropped = 0;

        for entity in dead {
            for comment in self.store.remove_for_entity(entity) {
                self.journal_forget(&comment).await;
                let _ = self.event_tx.send(CommentEvent::Removed {
                    comment,
                    reason: RemovalReason::EntityRemoved,
                });
                dropped += 1;
            }
        }

        dropped
    }

    async fn journal_record(&self, comment: &Comment) {
        if let Some(journal) = &self.journal
            && let Err(e) = journal.record(comment).await
        {
            error!("failed to journal comment {}: {e}", comment.id());
        }
    }

    async fn journal_forget(&self, comment: &Comment) {
        if !comment.persistent() {
            return;
        }

        if let Some(journal) = &self.journal
            && let Err(e) = journal.forget(comment.id()).await
        {
            error!("failed to remove comment {} from journal: {e}", comment.id());
        }
    }

    async fn close_journal(&self) {
        if let Some(journal) = &self.journal {
            if let Err(e) = journal.close().await {
                warn!("failed to close journal cleanly: {e}");
            }
        }
    }
}

/// Handle for controlling a CommentActor
///
/// Cloneable; every method is a typed wrapper around one command message.
#[derive(Clone)]
pub struct CommentHandle {
    sender: mpsc::Sender<CommentCommand>,
}

impl CommentHandle {
    /// Hydrate the store from the journal, spawn the actor, return a handle
    ///
    /// When a journal is supplied, every journaled comment is restored
    /// before the actor starts taking commands, and the identity allocator
    /// continues above the restored identities. Restored comments whose
    /// host or service is no longer registered are discarded and purged
    /// from the journal, the same as if the entity had been removed while
    /// the engine was running.
    pub async fn spawn(
        registry: EntityRegistry,
        journal: Option<Box<dyn CommentJournal>>,
        sweep_interval: Duration,
        event_tx: broadcast::Sender<CommentEvent>,
    ) -> Result<Self> {
        let store = match &journal {
            Some(journal) => {
                let restored = journal
                    .load_all()
                    .await
                    .context("failed to load journaled comments")?;
                let mut store =
                    CommentStore::hydrate(restored).context("journal is inconsistent")?;

                for comment in store.remove_unregistered(&registry) {
                    warn!(
                        "discarding restored comment {} on unknown entity {}",
                        comment.id(),
                        comment.entity()
                    );
                    if let Err(e) = journal.forget(comment.id()).await {
                        error!(
                            "failed to remove comment {} from journal: {e}",
                            comment.id()
                        );
                    }
                }
                store
            }
            None => CommentStore::new(),
        };

        let (cmd_tx, cmd_rx) = mpsc::channel(32);
        let actor =
            CommentActor::new(store, registry, journal, cmd_rx, event_tx, sweep_interval);

        tokio::spawn(actor.run());

        Ok(Self { sender: cmd_tx })
    }

    /// Attach a new comment; responds with the stored record
    pub async fn add_comment(&self, request: CommentRequest) -> Result<Arc<Comment>> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(CommentCommand::Add {
                request,
                respond_to: tx,
            })
            .await
            .context("failed to send Add command")?;

        rx.await.context("failed to receive response")?
    }

    /// Delete a comment by identity; responds with the removed record
    pub async fn delete_comment(&self, id: CommentId) -> Result<Arc<Comment>> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(CommentCommand::Delete { id, respond_to: tx })
            .await
            .context("failed to send Delete command")?;

        rx.await.context("failed to receive response")?
    }

    pub async fn get_comment(&self, id: CommentId) -> Result<Option<Arc<Comment>>> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(CommentCommand::Get { id, respond_to: tx })
            .await
            .context("failed to send Get command")?;

        rx.await.context("failed to receive response")
    }

    /// List all comments, or just those exactly associated with `entity`
    pub async fn list_comments(
        &self,
        entity: Option<EntityRef>,
    ) -> Result<Vec<Arc<Comment>>> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(CommentCommand::List {
                entity,
                respond_to: tx,
            })
            .await
            .context("failed to send List command")?;

        rx.await.context("failed to receive response")
    }

    /// Register a host; returns false when it already existed
    pub async fn add_host(&self, host: HostRef, display: Option<String>) -> Result<bool> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(CommentCommand::AddHost {
                host,
                display,
                respond_to: tx,
            })
            .await
            .context("failed to send AddHost command")?;

        rx.await.context("failed to receive response")
    }

    pub async fn add_service(
        &self,
        service: ServiceRef,
        display: Option<String>,
    ) -> Result<()> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(CommentCommand::AddService {
                service,
                display,
                respond_to: tx,
            })
            .await
            .context("failed to send AddService command")?;

        rx.await.context("failed to receive response")?
    }

    /// Remove a host with its services; returns how many comments died
    pub async fn remove_host(&self, host: HostRef) -> Result<usize> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(CommentCommand::RemoveHost {
                host,
                respond_to: tx,
            })
            .await
            .context("failed to send RemoveHost command")?;

        rx.await.context("failed to receive response")
    }

    /// Remove one service; returns how many comments died
    pub async fn remove_service(&self, service: ServiceRef) -> Result<usize> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(CommentCommand::RemoveService {
                service,
                respond_to: tx,
            })
            .await
            .context("failed to send RemoveService command")?;

        rx.await.context("failed to receive response")
    }

    /// Run an expiry sweep immediately; returns how many comments expired
    pub async fn sweep_now(&self) -> Result<usize> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(CommentCommand::SweepNow { respond_to: tx })
            .await
            .context("failed to send SweepNow command")?;

        rx.await.context("failed to receive response")
    }

    pub async fn stats(&self) -> Result<StoreStats> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(CommentCommand::GetStats { respond_to: tx })
            .await
            .context("failed to send GetStats command")?;

        rx.await.context("failed to receive response")
    }

    /// Gracefully shut down the actor
    pub async fn shutdown(&self) -> Result<()> {
        self.sender
            .send(CommentCommand::Shutdown)
            .await
            .context("failed to send Shutdown command")?;
        Ok(())
    }
}
