//! Journal backends for persistent comments
//!
//! Comments flagged `persistent` must survive a process restart. This module
//! provides a trait-based abstraction over the durable storage that holds
//! them between runs.
//!
//! ## Design
//!
//! - **Trait-based**: `CommentJournal` allows swapping implementations
//! - **Async**: all operations are async for compatibility with the actor
//! - **Lossless**: every field of the record survives a round trip; restored
//!   rows are rebuilt through the validating constructor, so a corrupt
//!   journal is rejected instead of yielding half-valid records
//!
//! ## Backends
//!
//! - **SQLite** (default): embedded database, one row per comment
//! - **In-memory**: no real persistence, for tests and journal-less setups

pub mod backend;
pub mod error;
pub mod memory;
pub mod schema;
#[cfg(feature = "journal-sqlite")]
pub mod sqlite;

pub use backend::CommentJournal;
pub use error::{JournalError, JournalResult};
pub use schema::CommentRow;
