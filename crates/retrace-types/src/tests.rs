//! Unit tests for the shared type vocabulary.

use proptest::prelude::*;
use serde_json::json;
use test_case::test_case;

use crate::{
    AuditAction, AuditEvent, Diff, EntityId, EntityKind, EventId, FieldDelta, FlatState, Sequence,
    Snapshot, StateError, Timestamp, Value,
};

// ============================================================================
// Test Helpers
// ============================================================================

fn state_from(json: serde_json::Value) -> FlatState {
    FlatState::try_from(json).expect("test payload must be a JSON object")
}

fn sample_event(action: AuditAction) -> AuditEvent {
    AuditEvent::new(
        EventId::generate(),
        EntityKind::new("project"),
        EntityId::generate(),
        action,
        Diff::empty(),
        Timestamp::from_nanos(42),
    )
}

// ============================================================================
// Timestamps
// ============================================================================

#[test]
fn now_monotonic_strictly_increases_across_calls() {
    let first = Timestamp::now_monotonic(None);
    let second = Timestamp::now_monotonic(Some(first));
    let third = Timestamp::now_monotonic(Some(second));

    assert!(first < second);
    assert!(second < third);
}

#[test]
fn now_monotonic_advances_past_a_future_last_timestamp() {
    // A last timestamp far in the future forces the +1ns path
    let future = Timestamp::from_nanos(u64::MAX - 1);
    let next = Timestamp::now_monotonic(Some(future));

    assert_eq!(next, Timestamp::from_nanos(u64::MAX));
}

#[test]
fn rfc3339_parsing_handles_whole_and_fractional_seconds() {
    let whole = Timestamp::from_rfc3339("1970-01-01T00:00:01Z").unwrap();
    assert_eq!(whole.as_nanos(), 1_000_000_000);

    let fractional = Timestamp::from_rfc3339("1970-01-01T00:00:00.000000042Z").unwrap();
    assert_eq!(fractional.as_nanos(), 42);
}

#[test]
fn rfc3339_rendering_round_trips() {
    let ts = Timestamp::from_nanos(1_756_000_000_123_456_789);
    let rendered = ts.to_rfc3339();

    assert_eq!(Timestamp::from_rfc3339(&rendered).unwrap(), ts);
}

#[test]
fn pre_epoch_instants_clamp_to_epoch() {
    let ts = Timestamp::from_rfc3339("1969-12-31T23:59:59Z").unwrap();
    assert_eq!(ts, Timestamp::EPOCH);
}

#[test]
fn malformed_rfc3339_fails_to_parse() {
    assert!(Timestamp::from_rfc3339("not-a-time").is_err());
    assert!(Timestamp::from_rfc3339("2026-13-40T99:00:00Z").is_err());
}

// ============================================================================
// Values
// ============================================================================

#[test]
fn float_equality_uses_bit_patterns() {
    assert_eq!(Value::Float(f64::NAN), Value::Float(f64::NAN));
    assert_eq!(Value::Float(0.5), Value::Float(0.5));
    assert_ne!(Value::Float(0.0), Value::Float(-0.0));
}

#[test]
fn values_of_different_shapes_are_never_equal() {
    assert_ne!(Value::Int(1), Value::Float(1.0));
    assert_ne!(Value::Null, Value::Bool(false));
    assert_ne!(Value::Text("1".into()), Value::Int(1));
}

#[test]
fn nested_values_compare_deeply() {
    let a = Value::from(json!({"tags": ["x", "y"], "meta": {"depth": 2}}));
    let b = Value::from(json!({"meta": {"depth": 2}, "tags": ["x", "y"]}));
    let c = Value::from(json!({"tags": ["x", "z"], "meta": {"depth": 2}}));

    assert_eq!(a, b);
    assert_ne!(a, c);
}

#[test]
fn json_numbers_split_into_int_and_float() {
    assert_eq!(Value::from(json!(7)), Value::Int(7));
    assert_eq!(Value::from(json!(-3)), Value::Int(-3));
    assert_eq!(Value::from(json!(7.5)), Value::Float(7.5));
    // u64 values beyond i64 range degrade to float
    assert_eq!(Value::from(json!(u64::MAX)), Value::Float(u64::MAX as f64));
}

#[test]
fn value_json_conversion_round_trips() {
    let original = json!({"name": "Alpha", "budget": 100, "done": false, "owner": null});
    let converted = serde_json::Value::from(Value::from(original.clone()));

    assert_eq!(converted, original);
}

// ============================================================================
// Flat States
// ============================================================================

#[test]
fn merged_prefers_overlay_and_keeps_base_only_fields() {
    let base = state_from(json!({"name": "Alpha", "phase": "draft", "budget": 100}));
    let overlay = state_from(json!({"phase": "active", "owner": "dana"}));

    let merged = base.merged(&overlay);

    assert_eq!(merged.get("name"), Some(&Value::from("Alpha")));
    assert_eq!(merged.get("phase"), Some(&Value::from("active")));
    assert_eq!(merged.get("budget"), Some(&Value::from(100)));
    assert_eq!(merged.get("owner"), Some(&Value::from("dana")));
    assert_eq!(merged.len(), 4);
}

#[test]
fn merged_leaves_both_inputs_untouched() {
    let base = state_from(json!({"phase": "draft"}));
    let overlay = state_from(json!({"phase": "active"}));

    let _ = base.merged(&overlay);

    assert_eq!(base.get("phase"), Some(&Value::from("draft")));
    assert_eq!(overlay.get("phase"), Some(&Value::from("active")));
    assert_eq!(base.len(), 1);
    assert_eq!(overlay.len(), 1);
}

#[test_case(json!(null), "null")]
#[test_case(json!(true), "boolean")]
#[test_case(json!(3), "number")]
#[test_case(json!("state"), "string")]
#[test_case(json!([1, 2]), "array")]
fn non_object_payloads_are_rejected(payload: serde_json::Value, kind: &'static str) {
    let err = FlatState::try_from(payload).unwrap_err();
    assert_eq!(err, StateError::NotAnObject { found: kind });
}

#[test]
fn object_payloads_round_trip_through_json() {
    let original = json!({"name": "Alpha", "tags": ["a", "b"], "budget": 100});
    let state = state_from(original.clone());

    assert_eq!(state.to_json(), original);
}

// ============================================================================
// Deltas and Diffs
// ============================================================================

#[test]
fn added_deltas_omit_the_old_side_when_serialized() {
    let added = serde_json::to_value(FieldDelta::added(Value::from("active"))).unwrap();
    assert_eq!(added, json!({"new": "active"}));

    let changed =
        serde_json::to_value(FieldDelta::changed(Value::from("draft"), Value::from("active")))
            .unwrap();
    assert_eq!(changed, json!({"old": "draft", "new": "active"}));
}

#[test]
fn new_values_projects_the_post_change_state() {
    let mut diff = Diff::empty();
    diff.insert("phase", FieldDelta::changed(Value::from("draft"), Value::from("active")));
    diff.insert("owner", FieldDelta::added(Value::from("dana")));

    let projected = diff.new_values();

    assert_eq!(projected, state_from(json!({"phase": "active", "owner": "dana"})));
}

#[test]
fn empty_diff_projects_an_empty_state() {
    assert!(Diff::empty().new_values().is_empty());
}

// ============================================================================
// Actions and Events
// ============================================================================

#[test]
fn actions_serialize_lowercase() {
    assert_eq!(serde_json::to_value(AuditAction::Create).unwrap(), json!("create"));
    assert_eq!(serde_json::to_value(AuditAction::Update).unwrap(), json!("update"));
    assert_eq!(serde_json::to_value(AuditAction::Delete).unwrap(), json!("delete"));
}

#[test]
fn fresh_events_carry_no_log_position() {
    let event = sample_event(AuditAction::Create);

    assert_eq!(event.sequence, Sequence::UNASSIGNED);
    assert!(!event.sequence.is_assigned());
}

#[test]
fn with_sequence_assigns_the_log_position() {
    let event = sample_event(AuditAction::Update).with_sequence(Sequence::FIRST);

    assert!(event.sequence.is_assigned());
    assert_eq!(event.ordering_key(), (Timestamp::from_nanos(42), Sequence::FIRST));
}

#[test]
fn events_round_trip_through_json() {
    let event = sample_event(AuditAction::Delete).with_sequence(Sequence::new(7));
    let encoded = serde_json::to_string(&event).unwrap();
    let decoded: AuditEvent = serde_json::from_str(&encoded).unwrap();

    assert_eq!(decoded, event);
}

// ============================================================================
// Snapshots
// ============================================================================

#[test]
fn absent_and_empty_snapshots_serialize_differently() {
    let absent = serde_json::to_value(Snapshot::Absent).unwrap();
    let empty = serde_json::to_value(Snapshot::Present(FlatState::new())).unwrap();

    assert_eq!(absent, json!(null));
    assert_eq!(empty, json!({}));
}

#[test]
fn snapshots_deserialize_from_null_and_objects() {
    let absent: Snapshot = serde_json::from_value(json!(null)).unwrap();
    let present: Snapshot = serde_json::from_value(json!({"phase": "active"})).unwrap();

    assert!(absent.is_absent());
    assert_eq!(present.get("phase"), Some(&Value::from("active")));
}

// ============================================================================
// Property Tests
// ============================================================================

proptest! {
    #[test]
    fn merged_state_is_the_union_with_overlay_winning(
        base in prop::collection::btree_map("[a-e]", 0i64..100, 0..6),
        overlay in prop::collection::btree_map("[a-e]", 0i64..100, 0..6),
    ) {
        let base_state: FlatState = base
            .iter()
            .map(|(field, value)| (field.clone(), Value::from(*value)))
            .collect();
        let overlay_state: FlatState = overlay
            .iter()
            .map(|(field, value)| (field.clone(), Value::from(*value)))
            .collect();

        let merged = base_state.merged(&overlay_state);

        for (field, value) in &overlay {
            prop_assert_eq!(merged.get(field), Some(&Value::from(*value)));
        }
        for (field, value) in &base {
            if !overlay.contains_key(field) {
                prop_assert_eq!(merged.get(field), Some(&Value::from(*value)));
            }
        }
        let union: std::collections::BTreeSet<_> = base.keys().chain(overlay.keys()).collect();
        prop_assert_eq!(merged.len(), union.len());
    }

    #[test]
    fn sequences_stay_ordered_under_next(start in 0u64..1_000_000) {
        let seq = Sequence::new(start);
        prop_assert!(seq.next() > seq);
    }
}
