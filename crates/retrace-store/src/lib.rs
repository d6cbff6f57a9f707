//! # retrace-store: Persistence backends for `Retrace`
//!
//! The kernel computes diffs and replays histories; this crate owns where
//! entities and their events actually live. Two seams keep the rest of the
//! system backend-agnostic:
//!
//! - [`EntityStore`] holds the current state of each entity
//! - [`AuditLog`] holds the append-only event history
//!
//! Each seam has an in-memory implementation ([`InMemoryEntityStore`],
//! [`InMemoryAuditLog`]) for tests and ephemeral use, and a file-backed one
//! ([`FileEntityStore`], [`FileAuditLog`]) for durable deployments.
//!
//! # Durability
//!
//! [`FileAuditLog`] appends one JSON document per line and calls `fsync`
//! before acknowledging an append, so an accepted event survives a crash.
//! On open it replays the log to recover the sequence counter.
//! [`FileEntityStore`] keeps one JSON document per entity and rewrites the
//! whole document on every persist.

use std::path::PathBuf;

pub mod file;
pub mod memory;
pub mod traits;

pub use file::{FileAuditLog, FileEntityStore};
pub use memory::{InMemoryAuditLog, InMemoryEntityStore};
pub use traits::{AuditLog, EntityStore};

/// Errors produced by entity stores and audit logs.
#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    /// An underlying filesystem operation failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// An event or state could not be encoded or decoded.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A persisted log line is not a valid event.
    #[error("corrupt record at {path}:{line}: {reason}")]
    CorruptRecord {
        path: PathBuf,
        line: usize,
        reason: String,
    },
}
