//! Audit event construction with no-op rejection.
//!
//! Builders are the single place events come into existence. They validate
//! before anything can reach a log: an update whose diff is empty is rejected
//! here, so no-op mutations never leave a trace in the history.
//!
//! Timestamps are supplied by the caller; minting a fresh [`EventId`] is the
//! builders' one impure edge.

use retrace_types::{
    AuditAction, AuditEvent, Diff, EntityId, EntityKind, EventId, FlatState, Timestamp,
};

use crate::diff::compute_diff;

/// Errors that can occur while building audit events.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum BuildError {
    /// An update changed nothing; nothing may be appended for it.
    #[error("no changes detected for entity {entity_id}")]
    NoChanges { entity_id: EntityId },
}

/// Builds the create event for a newly created entity.
///
/// The diff is computed against the empty state, so every field of
/// `new_state` appears as an addition with no old value.
pub fn build_create_event(
    entity_kind: EntityKind,
    entity_id: EntityId,
    new_state: &FlatState,
    timestamp: Timestamp,
) -> AuditEvent {
    let diff = compute_diff(&FlatState::new(), new_state);

    // Postcondition: one delta per field of the created state
    debug_assert_eq!(
        diff.len(),
        new_state.len(),
        "create diff must cover every field of the new state"
    );

    AuditEvent::new(
        EventId::generate(),
        entity_kind,
        entity_id,
        AuditAction::Create,
        diff,
        timestamp,
    )
}

/// Builds the update event for a partial state submission.
///
/// `submitted` holds only the fields the caller wants to change; the diff is
/// computed against `previous` so unchanged submissions drop out.
///
/// # Errors
///
/// Returns [`BuildError::NoChanges`] when every submitted field already has
/// its submitted value. Rejection happens before any store involvement.
pub fn build_update_event(
    entity_kind: EntityKind,
    entity_id: EntityId,
    previous: &FlatState,
    submitted: &FlatState,
    timestamp: Timestamp,
) -> Result<AuditEvent, BuildError> {
    let diff = compute_diff(previous, submitted);
    if diff.is_empty() {
        return Err(BuildError::NoChanges { entity_id });
    }

    Ok(AuditEvent::new(
        EventId::generate(),
        entity_kind,
        entity_id,
        AuditAction::Update,
        diff,
        timestamp,
    ))
}

/// Builds the delete event for an entity removal.
///
/// The diff is empty by contract: the removal itself is the change, and
/// replay treats delete as unconditional regardless of diff contents.
pub fn build_delete_event(
    entity_kind: EntityKind,
    entity_id: EntityId,
    timestamp: Timestamp,
) -> AuditEvent {
    AuditEvent::new(
        EventId::generate(),
        entity_kind,
        entity_id,
        AuditAction::Delete,
        Diff::empty(),
        timestamp,
    )
}
