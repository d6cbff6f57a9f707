//! # Retrace
//!
//! Append-only audit trails with point-in-time reconstruction.
//!
//! Retrace records every accepted mutation of an entity as an immutable
//! audit event and replays those events on demand. This provides:
//!
//! - **Full audit trail** - Every create, update, and delete is captured
//! - **Point-in-time queries** - "What did this entity look like at T?"
//! - **Two-instant comparison** - "What changed between T1 and T2?"
//! - **No-op rejection** - Updates that change nothing never enter history
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                         Retrace                             │
//! │  ┌──────────┐   ┌────────────┐   ┌──────────┐   ┌────────┐ │
//! │  │  Entity  │ → │   Kernel   │ → │  Audit   │ → │ Replay │ │
//! │  │  store   │   │(diff/build)│   │   log    │   │ (fold) │ │
//! │  └──────────┘   └────────────┘   └──────────┘   └────────┘ │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! The write path diffs the submission against current state, persists the
//! result, and appends one event. The read path fetches an entity's ordered
//! events once and folds them into a snapshot.
//!
//! # Quick Start
//!
//! ```ignore
//! use retrace::{EntityId, Retrace, Timestamp};
//! use serde_json::json;
//!
//! // Open a file-backed trail (replays any existing log)
//! let mut trail = Retrace::open("./data")?;
//! let id = EntityId::generate();
//!
//! // Record mutations
//! trail.create_from_json(id, json!({"name": "Apollo", "status": "active"}))?;
//! trail.update_from_json(id, json!({"status": "done"}))?;
//!
//! // Reconstruct and compare
//! let snapshot = trail.snapshot_at(id, cutoff)?;
//! let changes = trail.compare(id, t1, t2)?;
//! ```
//!
//! # Modules
//!
//! - **Facade**: [`Retrace`], [`MemoryRetrace`], [`FileRetrace`] - Main API
//! - **Time queries**: [`time_query`] - String-to-[`Timestamp`] parsing edge
//! - **Foundation**: Types, kernel, and stores re-exported below

mod error;
mod retrace;
pub mod time_query;

// Facade - Main API
pub use error::{Result, RetraceError};
pub use retrace::{FileRetrace, MemoryRetrace, Retrace};
pub use time_query::TimeQueryError;

// Re-export core types from retrace-types
pub use retrace_types::{
    AuditAction, AuditEvent, Diff, EntityId, EntityKind, EventId, FieldDelta, FlatState, Sequence,
    Snapshot, StateError, Timestamp, Value,
};

// Re-export the pure computation core
pub use retrace_kernel::{
    BuildError, StateComparison, build_create_event, build_delete_event, build_update_event,
    compare_at, compute_diff, reconstruct, reconstruct_up_to,
};

// Re-export store traits and the provided backends
pub use retrace_store::{
    AuditLog, EntityStore, FileAuditLog, FileEntityStore, InMemoryAuditLog, InMemoryEntityStore,
    StoreError,
};

// Re-export configuration
pub use retrace_config::{
    AuditConfig, ConfigError, ConfigLoader, LoggingConfig, ProjectConfig, RetraceConfig,
    StorageBackend, StorageConfig,
};
