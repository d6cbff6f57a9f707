//! # retrace-types: Core types for `Retrace`
//!
//! This crate contains shared types used across the `Retrace` system:
//! - Entity identity ([`EntityId`], [`EntityKind`], [`EventId`])
//! - Temporal types ([`Timestamp`], [`Sequence`])
//! - Field values and states ([`Value`], [`FlatState`])
//! - Change description ([`FieldDelta`], [`Diff`])
//! - Audit records ([`AuditAction`], [`AuditEvent`])
//! - Replay results ([`Snapshot`])

pub mod state;
pub mod value;

use std::fmt::Display;
use std::time::{SystemTime, UNIX_EPOCH};

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub use state::{Diff, FieldDelta, FlatState, StateError};
pub use value::Value;

// ============================================================================
// Entity Identity - Copy (16-byte UUID values)
// ============================================================================

/// Unique identifier for an entity instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityId(Uuid);

impl EntityId {
    /// Creates an entity id from an existing UUID.
    pub fn new(id: Uuid) -> Self {
        Self(id)
    }

    /// Generates a fresh random (v4) entity id.
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Returns the underlying UUID.
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for EntityId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl From<EntityId> for Uuid {
    fn from(id: EntityId) -> Self {
        id.0
    }
}

impl std::str::FromStr for EntityId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// Unique identifier for a single audit event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EventId(Uuid);

impl EventId {
    /// Creates an event id from an existing UUID.
    pub fn new(id: Uuid) -> Self {
        Self(id)
    }

    /// Generates a fresh random (v4) event id.
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Returns the underlying UUID.
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Display for EventId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for EventId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl From<EventId> for Uuid {
    fn from(id: EventId) -> Self {
        id.0
    }
}

// ============================================================================
// Entity Kind - Clone (contains String, but rarely cloned)
// ============================================================================

/// Name of the entity type an audit event belongs to.
///
/// Retrace records the kind on every event so one log can hold histories of
/// several entity families side by side.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityKind(String);

impl EntityKind {
    pub fn new(kind: impl Into<String>) -> Self {
        Self(kind.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for EntityKind {
    fn from(kind: String) -> Self {
        Self(kind)
    }
}

impl From<&str> for EntityKind {
    fn from(kind: &str) -> Self {
        Self(kind.to_string())
    }
}

impl From<EntityKind> for String {
    fn from(kind: EntityKind) -> Self {
        kind.0
    }
}

// ============================================================================
// Timestamp - Copy (8-byte value with monotonic guarantee)
// ============================================================================

/// Wall-clock timestamp with monotonic guarantee within the system.
///
/// Audit trails need real-world time; monotonicity prevents ordering issues
/// when system clocks are adjusted between writes.
///
/// Stored as nanoseconds since Unix epoch (1970-01-01 00:00:00 UTC).
/// This gives ~584 years of range, well beyond any practical use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(u64);

impl Timestamp {
    /// The Unix epoch (1970-01-01 00:00:00 UTC).
    pub const EPOCH: Timestamp = Timestamp(0);

    /// Creates a timestamp from nanoseconds since Unix epoch.
    pub fn from_nanos(nanos: u64) -> Self {
        Self(nanos)
    }

    /// Returns the timestamp as nanoseconds since Unix epoch.
    pub fn as_nanos(&self) -> u64 {
        self.0
    }

    /// Returns the timestamp as seconds since Unix epoch (truncates nanoseconds).
    pub fn as_secs(&self) -> u64 {
        self.0 / 1_000_000_000
    }

    /// Creates a timestamp for the current time.
    ///
    /// # Panics
    ///
    /// Panics if the system clock is before Unix epoch (should never happen).
    pub fn now() -> Self {
        let duration = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system clock is before Unix epoch");
        Self(duration.as_nanos() as u64)
    }

    /// Creates a timestamp ensuring monotonicity: `max(now, last + 1ns)`.
    ///
    /// This guarantees that each timestamp is strictly greater than the
    /// previous, even if the system clock moves backwards or two events occur
    /// in the same nanosecond.
    ///
    /// # Arguments
    ///
    /// * `last` - The previous timestamp, if any. Pass `None` for the first timestamp.
    pub fn now_monotonic(last: Option<Timestamp>) -> Self {
        let now = Self::now();
        match last {
            Some(prev) => {
                // Ensure strictly increasing: at least prev + 1 nanosecond
                if now.0 <= prev.0 {
                    Timestamp(prev.0.saturating_add(1))
                } else {
                    now
                }
            }
            None => now,
        }
    }

    /// Parses an RFC 3339 instant (`2026-03-01T12:00:00Z`).
    ///
    /// # Errors
    ///
    /// Returns the underlying chrono error if the string is not a valid
    /// RFC 3339 timestamp.
    pub fn from_rfc3339(value: &str) -> Result<Self, chrono::ParseError> {
        let parsed = DateTime::parse_from_rfc3339(value)?;
        Ok(Self::from_datetime(parsed.with_timezone(&Utc)))
    }

    /// Converts a chrono instant into a timestamp.
    ///
    /// Instants before the Unix epoch clamp to [`Timestamp::EPOCH`]; instants
    /// beyond the nanosecond range (year 2262+) clamp to the maximum.
    pub fn from_datetime(instant: DateTime<Utc>) -> Self {
        match instant.timestamp_nanos_opt() {
            Some(nanos) => Self(nanos.max(0) as u64),
            None if instant.timestamp() < 0 => Self::EPOCH,
            None => Self(i64::MAX as u64),
        }
    }

    /// Returns the timestamp as a chrono instant.
    pub fn to_datetime(&self) -> DateTime<Utc> {
        DateTime::from_timestamp_nanos(i64::try_from(self.0).unwrap_or(i64::MAX))
    }

    /// Renders the timestamp as an RFC 3339 string with nanosecond precision.
    pub fn to_rfc3339(&self) -> String {
        self.to_datetime()
            .to_rfc3339_opts(SecondsFormat::Nanos, true)
    }
}

impl Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Display as seconds.nanoseconds for readability
        let secs = self.0 / 1_000_000_000;
        let nanos = self.0 % 1_000_000_000;
        write!(f, "{secs}.{nanos:09}")
    }
}

impl Default for Timestamp {
    fn default() -> Self {
        Self::EPOCH
    }
}

impl From<u64> for Timestamp {
    fn from(nanos: u64) -> Self {
        Self(nanos)
    }
}

impl From<Timestamp> for u64 {
    fn from(ts: Timestamp) -> Self {
        ts.0
    }
}

// ============================================================================
// Sequence - Copy (log-assigned position for deterministic tie-breaks)
// ============================================================================

/// Position assigned to an event when the audit log accepts it.
///
/// Events are ordered by `(timestamp, sequence)`. Timestamps produced by
/// [`Timestamp::now_monotonic`] never collide, but events ingested from
/// external sources can; the sequence makes replay order deterministic
/// anyway. Zero until the log assigns a real position.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub struct Sequence(u64);

impl Sequence {
    /// Marker for an event not yet accepted by a log.
    pub const UNASSIGNED: Sequence = Sequence(0);

    /// The first position a log hands out.
    pub const FIRST: Sequence = Sequence(1);

    pub fn new(value: u64) -> Self {
        Self(value)
    }

    /// Returns the sequence as a u64.
    pub fn as_u64(&self) -> u64 {
        self.0
    }

    /// Returns true once a log has assigned a real position.
    pub fn is_assigned(&self) -> bool {
        self.0 != 0
    }

    /// Returns the next position (incremented by 1).
    pub fn next(&self) -> Self {
        Sequence(self.0.saturating_add(1))
    }
}

impl Display for Sequence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for Sequence {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl From<Sequence> for u64 {
    fn from(sequence: Sequence) -> Self {
        sequence.0
    }
}

// ============================================================================
// Audit Actions - Copy (closed verb set)
// ============================================================================

/// The mutation kind an audit event records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditAction {
    /// The entity came into existence (or was fully reset).
    Create,
    /// A subset of the entity's fields changed.
    Update,
    /// The entity was removed.
    Delete,
}

impl AuditAction {
    /// Returns the lowercase wire name of the action.
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::Create => "create",
            AuditAction::Update => "update",
            AuditAction::Delete => "delete",
        }
    }
}

impl Display for AuditAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// Audit Events - Clone (immutable once appended)
// ============================================================================

/// One immutable entry in an entity's change log.
///
/// Events are never updated or removed after the log accepts them; the full
/// history of an entity is the ascending `(timestamp, sequence)` fold of its
/// events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEvent {
    /// Unique id of this event.
    pub event_id: EventId,
    /// Entity family the event belongs to.
    pub entity_kind: EntityKind,
    /// Entity instance the event belongs to.
    pub entity_id: EntityId,
    /// What happened.
    pub action: AuditAction,
    /// Field-level changes. Empty for deletes.
    pub diff: Diff,
    /// When the mutation was accepted (monotonic wall-clock).
    pub timestamp: Timestamp,
    /// Log position, assigned at append. [`Sequence::UNASSIGNED`] before.
    pub sequence: Sequence,
}

impl AuditEvent {
    /// Creates an event that has not been accepted by a log yet.
    pub fn new(
        event_id: EventId,
        entity_kind: EntityKind,
        entity_id: EntityId,
        action: AuditAction,
        diff: Diff,
        timestamp: Timestamp,
    ) -> Self {
        Self {
            event_id,
            entity_kind,
            entity_id,
            action,
            diff,
            timestamp,
            sequence: Sequence::UNASSIGNED,
        }
    }

    /// Returns the event with its log position filled in.
    pub fn with_sequence(mut self, sequence: Sequence) -> Self {
        self.sequence = sequence;
        self
    }

    /// The total replay order: ascending timestamp, then ascending sequence.
    pub fn ordering_key(&self) -> (Timestamp, Sequence) {
        (self.timestamp, self.sequence)
    }
}

// ============================================================================
// Snapshots - Clone (replay output, never persisted)
// ============================================================================

/// The reconstructed state of an entity at a point in time.
///
/// Absence is a distinguished outcome, not an empty map: an entity that was
/// never created (or was deleted) reconstructs to [`Snapshot::Absent`], while
/// an entity that exists with no fields is `Present` of an empty state. The
/// two serialize differently (`null` vs `{}`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Snapshot {
    /// The entity did not exist at the requested instant.
    #[default]
    Absent,
    /// The entity existed with the contained state.
    Present(FlatState),
}

impl Snapshot {
    /// Returns true if the entity did not exist.
    pub fn is_absent(&self) -> bool {
        matches!(self, Snapshot::Absent)
    }

    /// Returns true if the entity existed.
    pub fn is_present(&self) -> bool {
        matches!(self, Snapshot::Present(_))
    }

    /// Returns the state, if the entity existed.
    pub fn as_state(&self) -> Option<&FlatState> {
        match self {
            Snapshot::Absent => None,
            Snapshot::Present(state) => Some(state),
        }
    }

    /// Consumes the snapshot, returning the state if the entity existed.
    pub fn into_state(self) -> Option<FlatState> {
        match self {
            Snapshot::Absent => None,
            Snapshot::Present(state) => Some(state),
        }
    }

    /// Returns a field of the state, if the entity existed and has it.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.as_state().and_then(|state| state.get(field))
    }
}

impl From<Option<FlatState>> for Snapshot {
    fn from(state: Option<FlatState>) -> Self {
        state.map_or(Snapshot::Absent, Snapshot::Present)
    }
}

impl From<Snapshot> for Option<FlatState> {
    fn from(snapshot: Snapshot) -> Self {
        snapshot.into_state()
    }
}

#[cfg(test)]
mod tests;
