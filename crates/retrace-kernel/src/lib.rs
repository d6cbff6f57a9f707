//! # retrace-kernel: Functional core of `Retrace`
//!
//! The kernel is the pure, deterministic heart of the system: it turns state
//! submissions into field-level diffs and audit events, and folds ordered
//! event sequences back into point-in-time snapshots.
//!
//! ## Key Principles
//!
//! - **No IO**: the kernel never touches disk, network, or any store
//! - **No clocks**: timestamps are supplied by the caller, never read here
//! - **Deterministic replay**: the same event sequence always reconstructs
//!   the same snapshot; minting fresh event ids in the builders is the one
//!   impure edge, and replay never looks at them
//!
//! ## Architecture
//!
//! - [`diff`]: field-level comparison of flat states
//! - [`event`]: audit event builders with no-op rejection
//! - [`replay`]: the fold that reconstructs snapshots and compares instants
//!
//! ## Example
//!
//! ```ignore
//! use retrace_kernel::{build_update_event, reconstruct_up_to};
//!
//! let event = build_update_event(kind, id, &previous, &submitted, now)?;
//! log.append(event)?;
//!
//! let snapshot = reconstruct_up_to(&log.events_up_to(id, cutoff)?, cutoff);
//! ```

pub mod diff;
pub mod event;
pub mod replay;


// Re-export commonly used items
pub use diff::compute_diff;
pub use event::{BuildError, build_create_event, build_delete_event, build_update_event};
pub use replay::{StateComparison, apply_event, compare_at, reconstruct, reconstruct_up_to};
