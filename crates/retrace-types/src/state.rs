//! Flat entity states and the field-level change records derived from them.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::value::Value;

// ============================================================================
// Flat State - Clone (one-level map, values may be nested but stay atomic)
// ============================================================================

/// A flat key→value entity state.
///
/// One level deep by contract: values may themselves be nested JSON shapes,
/// but diffing and merging treat every top-level field as an atomic unit.
/// Backed by a `BTreeMap` so iteration and serialization order are
/// deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FlatState(BTreeMap<String, Value>);

impl FlatState {
    /// Creates an empty state.
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Returns true if the state has no fields.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the number of fields.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns the value of a field, if present.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    /// Returns true if the field is present.
    pub fn contains_field(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    /// Sets a field, returning the previous value if any.
    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(field.into(), value.into())
    }

    /// Iterates fields in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    /// Iterates field names in key order.
    pub fn fields(&self) -> impl Iterator<Item = &String> {
        self.0.keys()
    }

    /// Pure merge: fields of `overlay` replace fields of `self`.
    ///
    /// Neither input is modified; a fresh state is returned. Fields present
    /// only in `self` survive, fields present in `overlay` win.
    pub fn merged(&self, overlay: &FlatState) -> FlatState {
        let mut merged = self.0.clone();
        for (field, value) in &overlay.0 {
            merged.insert(field.clone(), value.clone());
        }
        Self(merged)
    }

    /// Renders the state as a JSON object.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::Value::Object(
            self.0
                .iter()
                .map(|(key, value)| (key.clone(), serde_json::Value::from(value.clone())))
                .collect(),
        )
    }
}

impl From<BTreeMap<String, Value>> for FlatState {
    fn from(fields: BTreeMap<String, Value>) -> Self {
        Self(fields)
    }
}

impl From<FlatState> for BTreeMap<String, Value> {
    fn from(state: FlatState) -> Self {
        state.0
    }
}

impl FromIterator<(String, Value)> for FlatState {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Ingestion boundary: only JSON objects describe entity states.
///
/// Scalars, arrays, and null are rejected here so the diff and replay layers
/// never see a malformed state.
impl TryFrom<serde_json::Value> for FlatState {
    type Error = StateError;

    fn try_from(json: serde_json::Value) -> Result<Self, Self::Error> {
        match json {
            serde_json::Value::Object(fields) => Ok(Self(
                fields
                    .into_iter()
                    .map(|(key, value)| (key, Value::from(value)))
                    .collect(),
            )),
            other => Err(StateError::NotAnObject {
                found: json_kind(&other),
            }),
        }
    }
}

/// Error raised when a payload cannot be interpreted as an entity state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StateError {
    /// The submitted payload was valid JSON but not an object.
    #[error("entity state must be a JSON object, got {found}")]
    NotAnObject {
        /// JSON shape of the rejected payload.
        found: &'static str,
    },
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

// ============================================================================
// Field Delta - Clone (before/after pair for one field)
// ============================================================================

/// The before/after pair recorded for one changed field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDelta {
    /// Prior value. `None` when the field was newly introduced, and omitted
    /// from the serialized form in that case.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old: Option<Value>,
    /// Value after the change.
    pub new: Value,
}

impl FieldDelta {
    /// Delta for a field that did not exist before.
    pub fn added(new: Value) -> Self {
        Self { old: None, new }
    }

    /// Delta for a field whose value changed.
    pub fn changed(old: Value, new: Value) -> Self {
        Self {
            old: Some(old),
            new,
        }
    }
}

// ============================================================================
// Diff - Clone (field-level difference between two states)
// ============================================================================

/// Field-level difference between two flat states.
///
/// Contains one entry per field of the NEW state whose value differs from
/// (or is absent in) the old state. Fields present only in the old state are
/// not recorded: removals are invisible to a diff by contract, a delete is
/// expressed as its own audit action instead.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Diff(BTreeMap<String, FieldDelta>);

impl Diff {
    /// Creates an empty diff.
    pub fn empty() -> Self {
        Self(BTreeMap::new())
    }

    /// Returns true if no field changed.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the number of changed fields.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns the delta for a field, if it changed.
    pub fn get(&self, field: &str) -> Option<&FieldDelta> {
        self.0.get(field)
    }

    /// Records a delta for a field.
    pub fn insert(&mut self, field: impl Into<String>, delta: FieldDelta) {
        self.0.insert(field.into(), delta);
    }

    /// Iterates deltas in field order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &FieldDelta)> {
        self.0.iter()
    }

    /// Iterates changed field names in key order.
    pub fn fields(&self) -> impl Iterator<Item = &String> {
        self.0.keys()
    }

    /// Projects the post-change values as a flat state.
    ///
    /// This is exactly what a replay fold applies: the `new` side of every
    /// delta, keyed by field.
    pub fn new_values(&self) -> FlatState {
        self.0
            .iter()
            .map(|(field, delta)| (field.clone(), delta.new.clone()))
            .collect()
    }
}

impl From<BTreeMap<String, FieldDelta>> for Diff {
    fn from(deltas: BTreeMap<String, FieldDelta>) -> Self {
        Self(deltas)
    }
}

impl FromIterator<(String, FieldDelta)> for Diff {
    fn from_iter<I: IntoIterator<Item = (String, FieldDelta)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
