//! End-to-end tests for the audit trail facade.
//!
//! These drive the full write path (diff → validate → persist → append) and
//! read path (fetch → fold) through the public API. They verify correctness
//! properties:
//! - Create events carry one delta per field, with no old values
//! - Update events carry exactly the changed fields
//! - No-op updates are rejected and leave no trace
//! - Reconstruction reproduces the state at every recorded instant
//! - Two-instant comparison is order-independent
//! - The file backend replays its log across reopen and resumes numbering

use retrace::{
    AuditAction, EntityId, FlatState, Retrace, RetraceError, Sequence, Snapshot, Timestamp,
    Value, time_query,
};
use serde_json::json;
use tempfile::tempdir;

fn state(fields: serde_json::Value) -> FlatState {
    FlatState::try_from(fields).unwrap()
}

/// Instant strictly before the given one.
fn just_before(ts: Timestamp) -> Timestamp {
    Timestamp::from_nanos(ts.as_nanos() - 1)
}

// ============================================================================
// Write path scenarios
// ============================================================================

/// Creating an entity records a diff covering every field, with no priors.
#[test]
fn create_records_a_full_diff_with_no_old_values() {
    let mut trail = Retrace::in_memory();
    let id = EntityId::generate();

    trail
        .create(id, state(json!({"name": "Apollo", "status": "active"})))
        .unwrap();

    let events = trail.history(id).unwrap();
    assert_eq!(events.len(), 1);

    let event = &events[0];
    assert_eq!(event.action, AuditAction::Create);
    assert_eq!(event.entity_id, id);
    assert_eq!(event.sequence, Sequence::FIRST);

    let deltas: Vec<_> = event.diff.iter().collect();
    assert_eq!(deltas.len(), 2, "one delta per created field");
    for (_, delta) in deltas {
        assert_eq!(delta.old, None, "created fields have no prior value");
    }
    assert_eq!(event.diff.get("name").unwrap().new, Value::from("Apollo"));
    assert_eq!(event.diff.get("status").unwrap().new, Value::from("active"));
}

/// An update records exactly the fields whose values changed.
#[test]
fn update_records_only_the_changed_fields() {
    let mut trail = Retrace::in_memory();
    let id = EntityId::generate();

    trail
        .create(id, state(json!({"name": "Apollo", "status": "active"})))
        .unwrap();
    let merged = trail
        .update(id, state(json!({"name": "Apollo", "status": "done"})))
        .unwrap();

    assert_eq!(merged, state(json!({"name": "Apollo", "status": "done"})));

    let events = trail.history(id).unwrap();
    assert_eq!(events.len(), 2);

    let update = &events[1];
    assert_eq!(update.action, AuditAction::Update);
    assert_eq!(update.diff.len(), 1, "unchanged fields must not be recorded");

    let delta = update.diff.get("status").unwrap();
    assert_eq!(delta.old, Some(Value::from("active")));
    assert_eq!(delta.new, Value::from("done"));
}

/// Resubmitting current values is rejected and appends nothing.
#[test]
fn no_op_update_is_rejected_and_leaves_no_trace() {
    let mut trail = Retrace::in_memory();
    let id = EntityId::generate();

    trail
        .create(id, state(json!({"name": "Apollo", "status": "active"})))
        .unwrap();
    let before = trail.current(id).unwrap();

    let err = trail
        .update(id, state(json!({"status": "active"})))
        .unwrap_err();

    assert!(matches!(err, RetraceError::NoChanges { entity_id } if entity_id == id));
    assert_eq!(trail.history(id).unwrap().len(), 1, "no event was appended");
    assert_eq!(trail.current(id).unwrap(), before, "state is untouched");
}

/// A second create is a full reset, not a merge.
#[test]
fn create_over_existing_entity_resets_all_fields() {
    let mut trail = Retrace::in_memory();
    let id = EntityId::generate();

    trail
        .create(id, state(json!({"name": "Apollo", "status": "active"})))
        .unwrap();
    trail.update(id, state(json!({"owner": "ops"}))).unwrap();
    trail.create(id, state(json!({"name": "Artemis"}))).unwrap();

    let expected = state(json!({"name": "Artemis"}));
    assert_eq!(trail.current(id).unwrap(), Some(expected.clone()));

    // Replay agrees with the live store.
    let now = trail.history(id).unwrap().last().unwrap().timestamp;
    assert_eq!(trail.snapshot_at(id, now).unwrap(), Snapshot::Present(expected));
}

// ============================================================================
// Read path scenarios
// ============================================================================

/// Reconstruction reproduces the state as of each recorded instant.
#[test]
fn lifecycle_reconstructs_at_every_instant() {
    let mut trail = Retrace::in_memory();
    let id = EntityId::generate();

    trail
        .create(id, state(json!({"name": "Apollo", "status": "active"})))
        .unwrap();
    trail.update(id, state(json!({"status": "done"}))).unwrap();
    trail.delete(id).unwrap();

    let events = trail.history(id).unwrap();
    let (t_create, t_update, t_delete) = (
        events[0].timestamp,
        events[1].timestamp,
        events[2].timestamp,
    );

    assert_eq!(
        trail.snapshot_at(id, just_before(t_create)).unwrap(),
        Snapshot::Absent,
        "before any event the entity does not exist"
    );
    assert_eq!(
        trail.snapshot_at(id, t_create).unwrap(),
        Snapshot::Present(state(json!({"name": "Apollo", "status": "active"})))
    );
    assert_eq!(
        trail.snapshot_at(id, t_update).unwrap(),
        Snapshot::Present(state(json!({"name": "Apollo", "status": "done"})))
    );
    assert_eq!(trail.snapshot_at(id, t_delete).unwrap(), Snapshot::Absent);
}

/// Swapping the two cutoffs swaps the result fields and nothing else.
#[test]
fn compare_is_order_independent() {
    let mut trail = Retrace::in_memory();
    let id = EntityId::generate();

    trail.create(id, state(json!({"status": "active"}))).unwrap();
    trail.update(id, state(json!({"status": "done"}))).unwrap();

    let events = trail.history(id).unwrap();
    let (t1, t2) = (events[0].timestamp, events[1].timestamp);

    let forward = trail.compare(id, t1, t2).unwrap();
    let backward = trail.compare(id, t2, t1).unwrap();

    assert_eq!(forward.at_t1, backward.at_t2);
    assert_eq!(forward.at_t2, backward.at_t1);
    assert_eq!(
        forward.at_t1,
        Snapshot::Present(state(json!({"status": "active"})))
    );
    assert_eq!(
        forward.at_t2,
        Snapshot::Present(state(json!({"status": "done"})))
    );
}

/// A comparison spanning a delete sees the entity on one side only.
#[test]
fn compare_spanning_a_delete_shows_absence() {
    let mut trail = Retrace::in_memory();
    let id = EntityId::generate();

    trail.create(id, state(json!({"name": "Apollo"}))).unwrap();
    trail.delete(id).unwrap();

    let events = trail.history(id).unwrap();
    let comparison = trail
        .compare(id, events[0].timestamp, events[1].timestamp)
        .unwrap();

    assert_eq!(
        comparison.at_t1,
        Snapshot::Present(state(json!({"name": "Apollo"})))
    );
    assert_eq!(comparison.at_t2, Snapshot::Absent);
}

/// Histories of different entities never bleed into each other.
#[test]
fn histories_are_scoped_per_entity() {
    let mut trail = Retrace::in_memory();
    let apollo = EntityId::generate();
    let artemis = EntityId::generate();

    trail.create(apollo, state(json!({"name": "Apollo"}))).unwrap();
    trail.create(artemis, state(json!({"name": "Artemis"}))).unwrap();
    trail.update(apollo, state(json!({"status": "done"}))).unwrap();

    assert_eq!(trail.history(apollo).unwrap().len(), 2);
    assert_eq!(trail.history(artemis).unwrap().len(), 1);

    let horizon = trail.history(apollo).unwrap().last().unwrap().timestamp;
    assert_eq!(
        trail.snapshot_at(artemis, horizon).unwrap(),
        Snapshot::Present(state(json!({"name": "Artemis"})))
    );
}

/// The time-query edge feeds the same typed surface the tests use directly.
#[test]
fn rfc3339_query_parameters_drive_reconstruction() {
    let mut trail = Retrace::in_memory();
    let id = EntityId::generate();

    trail.create(id, state(json!({"status": "active"}))).unwrap();
    let recorded = trail.history(id).unwrap()[0].timestamp;

    // Render the instant the way a client would send it back.
    let raw = recorded.to_rfc3339();
    let cutoff = time_query::parse_required("time", Some(&raw)).unwrap();
    assert_eq!(cutoff, recorded);

    assert_eq!(
        trail.snapshot_at(id, cutoff).unwrap(),
        Snapshot::Present(state(json!({"status": "active"})))
    );

    let err = time_query::parse_required("time", None).unwrap_err();
    assert_eq!(err.to_string(), "missing required query parameter `time`");
}

// ============================================================================
// File backend
// ============================================================================

/// A reopened trail replays its log and serves the same answers.
#[test]
fn file_backend_survives_reopen() {
    let dir = tempdir().unwrap();
    let id = EntityId::generate();
    let t_create;

    {
        let mut trail = Retrace::open(dir.path()).unwrap();
        trail
            .create(id, state(json!({"name": "Apollo", "status": "active"})))
            .unwrap();
        trail.update(id, state(json!({"status": "done"}))).unwrap();
        t_create = trail.history(id).unwrap()[0].timestamp;
    }

    let trail = Retrace::open(dir.path()).unwrap();

    assert_eq!(
        trail.current(id).unwrap(),
        Some(state(json!({"name": "Apollo", "status": "done"})))
    );
    assert_eq!(trail.history(id).unwrap().len(), 2);
    assert_eq!(
        trail.snapshot_at(id, t_create).unwrap(),
        Snapshot::Present(state(json!({"name": "Apollo", "status": "active"})))
    );
}

/// Appending after reopen continues the sequence and stays after the last
/// recorded timestamp.
#[test]
fn file_backend_resumes_numbering_after_reopen() {
    let dir = tempdir().unwrap();
    let id = EntityId::generate();

    {
        let mut trail = Retrace::open(dir.path()).unwrap();
        trail.create(id, state(json!({"status": "active"}))).unwrap();
        trail.update(id, state(json!({"status": "paused"}))).unwrap();
    }

    let mut trail = Retrace::open(dir.path()).unwrap();
    trail.update(id, state(json!({"status": "done"}))).unwrap();

    let events = trail.history(id).unwrap();
    assert_eq!(events.len(), 3);
    assert_eq!(events[2].sequence, Sequence::new(3));
    assert!(
        events[1].timestamp < events[2].timestamp,
        "stamping resumes strictly after the replayed log"
    );
}

/// Deleting in one process generation is visible in the next.
#[test]
fn file_backend_replays_deletes() {
    let dir = tempdir().unwrap();
    let id = EntityId::generate();

    {
        let mut trail = Retrace::open(dir.path()).unwrap();
        trail.create(id, state(json!({"name": "Apollo"}))).unwrap();
        trail.delete(id).unwrap();
    }

    let trail = Retrace::open(dir.path()).unwrap();
    let events = trail.history(id).unwrap();

    assert_eq!(trail.current(id).unwrap(), None);
    assert_eq!(events.len(), 2);
    assert_eq!(
        trail.snapshot_at(id, events[1].timestamp).unwrap(),
        Snapshot::Absent
    );
}
