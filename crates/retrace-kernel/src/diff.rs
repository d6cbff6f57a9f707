//! The diff engine - pure field-level comparison of flat states.

use retrace_types::{Diff, FieldDelta, FlatState};

/// Computes the field-level difference between two flat states.
///
/// Iterates the fields of `new` only. A field appears in the result when it
/// is absent in `old` or its value differs by deep equality; unchanged fields
/// are omitted. Fields present only in `old` are never reported: removal is
/// expressed by the delete action, not by a diff.
///
/// Comparison is atomic per field. A one-element change inside a nested
/// array or object replaces the whole field, with the full old and new
/// values recorded in the delta.
///
/// Pure and total: no IO, no clocks, no failure modes.
pub fn compute_diff(old: &FlatState, new: &FlatState) -> Diff {
    let mut diff = Diff::empty();

    for (field, new_value) in new.iter() {
        match old.get(field) {
            Some(old_value) if old_value == new_value => {}
            Some(old_value) => {
                diff.insert(
                    field.clone(),
                    FieldDelta::changed(old_value.clone(), new_value.clone()),
                );
            }
            None => {
                diff.insert(field.clone(), FieldDelta::added(new_value.clone()));
            }
        }
    }

    // Postcondition: every reported field exists in the new state
    debug_assert!(
        diff.fields().all(|field| new.contains_field(field)),
        "diff must only mention fields of the new state"
    );

    diff
}
