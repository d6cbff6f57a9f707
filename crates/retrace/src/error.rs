//! Facade error types.
//!
//! Every failure a caller can see funnels into [`RetraceError`], one variant
//! per distinguishable kind. Callers embedding Retrace behind a transport map
//! variants to status codes; nothing here assumes any particular transport.

use retrace_kernel::BuildError;
use retrace_store::StoreError;
use retrace_types::{EntityId, StateError};
use thiserror::Error;

use crate::time_query::TimeQueryError;

/// Result type for facade operations.
pub type Result<T> = std::result::Result<T, RetraceError>;

/// Errors that can occur during audit-trail operations.
#[derive(Debug, Error)]
pub enum RetraceError {
    /// The submitted payload is not a valid entity state.
    #[error("invalid input: {0}")]
    InvalidInput(#[from] StateError),

    /// An update changed nothing; it was rejected before any store was
    /// touched.
    #[error("no changes detected for entity {entity_id}")]
    NoChanges {
        /// Entity the no-op update targeted.
        entity_id: EntityId,
    },

    /// The entity does not exist in the entity store.
    #[error("entity {entity_id} does not exist")]
    EntityNotFound {
        /// Entity that was looked up.
        entity_id: EntityId,
    },

    /// A time query parameter was missing or unparseable.
    #[error(transparent)]
    TimeQuery(#[from] TimeQueryError),

    /// A store collaborator failed. Propagated unchanged, never retried.
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

impl From<BuildError> for RetraceError {
    fn from(err: BuildError) -> Self {
        match err {
            BuildError::NoChanges { entity_id } => RetraceError::NoChanges { entity_id },
        }
    }
}

impl RetraceError {
    /// Returns true if this is a `NoChanges` rejection.
    pub fn is_no_changes(&self) -> bool {
        matches!(self, Self::NoChanges { .. })
    }

    /// Returns true if this is an `EntityNotFound` error.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::EntityNotFound { .. })
    }

    /// Returns true if the failure came from a time query parameter.
    pub fn is_time_query(&self) -> bool {
        matches!(self, Self::TimeQuery(_))
    }
}
