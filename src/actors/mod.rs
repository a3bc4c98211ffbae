//! Actor front end for the comment subsystem
//!
//! All mutation of the store and registry is serialized through a single
//! actor task; readers get immutable `Arc<Comment>` snapshots back, so no
//! locking is needed anywhere.
//!
//! ## Message Flow
//!
//! ```text
//! Commands (mpsc) ──► CommentActor ──► CommentEvent (broadcast)
//!                        │
//!     sweep timer ───────┤
//!                        ▼
//!              CommentStore + EntityRegistry + journal
//! ```
//!
//! ## Communication Patterns
//!
//! 1. **Commands**: an mpsc command channel per actor for control messages
//! 2. **Events**: comment additions/removals published to a broadcast channel
//! 3. **Request/Response**: oneshot channels for synchronous queries

pub mod comments;
pub mod messages;
