//! The replay fold - deterministic reconstruction from ordered events.
//!
//! Replay is a pure left fold over an entity's events in `(timestamp,
//! sequence)` order. The same sequence always produces the same snapshot:
//! no IO, no clocks, no randomness.

use retrace_types::{AuditAction, AuditEvent, Snapshot, Timestamp};

/// Applies one event to a snapshot, producing the successor snapshot.
///
/// The transition table:
///
/// | before    | action | after                                      |
/// |-----------|--------|--------------------------------------------|
/// | *any*     | create | present, exactly the diff's new values     |
/// | absent    | update | absent (updates never resurrect)           |
/// | present   | update | present, new values shallow-merged in      |
/// | *any*     | delete | absent                                     |
///
/// A create on an existing entity is a full reset: fields that are not in
/// the create diff are dropped, not carried over.
pub fn apply_event(snapshot: Snapshot, event: &AuditEvent) -> Snapshot {
    match (snapshot, event.action) {
        (_, AuditAction::Create) => Snapshot::Present(event.diff.new_values()),
        (Snapshot::Present(state), AuditAction::Update) => {
            Snapshot::Present(state.merged(&event.diff.new_values()))
        }
        (Snapshot::Absent, AuditAction::Update) => Snapshot::Absent,
        (_, AuditAction::Delete) => Snapshot::Absent,
    }
}

/// Reconstructs entity state by folding every event in order.
///
/// Callers supply events ascending by `(timestamp, sequence)`, which is the
/// order the stores hand them out in. An empty sequence reconstructs to
/// [`Snapshot::Absent`]: an entity with no history does not exist.
pub fn reconstruct(events: &[AuditEvent]) -> Snapshot {
    debug_assert!(
        events_are_ordered(events),
        "events must be ordered ascending by (timestamp, sequence)"
    );

    events.iter().fold(Snapshot::Absent, apply_event)
}

/// Reconstructs entity state as of `cutoff`, inclusive.
///
/// Folds only the prefix of events with `timestamp <= cutoff`. An event
/// stamped exactly at the cutoff is included.
pub fn reconstruct_up_to(events: &[AuditEvent], cutoff: Timestamp) -> Snapshot {
    debug_assert!(
        events_are_ordered(events),
        "events must be ordered ascending by (timestamp, sequence)"
    );

    events
        .iter()
        .take_while(|event| event.timestamp <= cutoff)
        .fold(Snapshot::Absent, apply_event)
}

/// The two snapshots produced by a point-in-time comparison.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateComparison {
    /// Entity state as of the first requested instant.
    pub at_t1: Snapshot,
    /// Entity state as of the second requested instant.
    pub at_t2: Snapshot,
}

/// Compares one entity's state at two instants from a single event sequence.
///
/// `events` must cover everything up to the later of the two cutoffs; both
/// snapshots are then folded from that one shared sequence, so the two sides
/// can never disagree about an event they both include. The cutoffs are
/// inclusive and order-independent: swapping `t1` and `t2` swaps the result
/// fields and nothing else.
pub fn compare_at(events: &[AuditEvent], t1: Timestamp, t2: Timestamp) -> StateComparison {
    StateComparison {
        at_t1: reconstruct_up_to(events, t1),
        at_t2: reconstruct_up_to(events, t2),
    }
}

fn events_are_ordered(events: &[AuditEvent]) -> bool {
    events
        .windows(2)
        .all(|pair| pair[0].ordering_key() <= pair[1].ordering_key())
}
