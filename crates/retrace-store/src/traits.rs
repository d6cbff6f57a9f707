//! Seams between the runtime and its persistence backends.
//!
//! The runtime is generic over these traits, so swapping a backend never
//! touches diff or replay logic.

use retrace_types::{AuditEvent, EntityId, FlatState, Sequence, Timestamp};

use crate::StoreError;

/// Holds the current state of entities.
///
/// The store is a plain key-value view and knows nothing about history.
/// History lives in the [`AuditLog`]; the runtime writes the two together.
pub trait EntityStore {
    /// Returns the current state of an entity, or `None` if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the backend cannot be read.
    fn fetch(&self, entity_id: &EntityId) -> Result<Option<FlatState>, StoreError>;

    /// Writes the full state of an entity, replacing any previous state.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the backend cannot be written.
    fn persist(&mut self, entity_id: &EntityId, state: FlatState) -> Result<(), StoreError>;

    /// Removes an entity, returning its last state if it existed.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the backend cannot be written.
    fn remove(&mut self, entity_id: &EntityId) -> Result<Option<FlatState>, StoreError>;
}

/// Append-only history of audit events.
///
/// Events are immutable once accepted: implementations expose no mutation
/// or deletion of stored events. The log assigns each accepted event a
/// [`Sequence`], making replay order total even when timestamps collide.
pub trait AuditLog {
    /// Accepts an event, assigns it the next sequence, and returns that
    /// sequence.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the event could not be recorded. On error
    /// the sequence is not consumed.
    fn append(&mut self, event: AuditEvent) -> Result<Sequence, StoreError>;

    /// Returns every event for an entity, ascending by `(timestamp, sequence)`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the log cannot be read.
    fn events_for(&self, entity_id: &EntityId) -> Result<Vec<AuditEvent>, StoreError>;

    /// Returns the events for an entity with `timestamp <= cutoff`, ascending
    /// by `(timestamp, sequence)`.
    ///
    /// The cutoff is inclusive: an event stamped exactly at `cutoff` is part
    /// of the result.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the log cannot be read.
    fn events_up_to(
        &self,
        entity_id: &EntityId,
        cutoff: Timestamp,
    ) -> Result<Vec<AuditEvent>, StoreError>;

    /// Returns the highest timestamp across all entities, or `None` for an
    /// empty log.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the log cannot be read.
    fn latest_timestamp(&self) -> Result<Option<Timestamp>, StoreError>;
}
