//! In-memory backends.
//!
//! Useful for tests and for callers that want audit semantics without
//! durability. Both types are plain collections behind the seam traits.

use std::collections::BTreeMap;

use retrace_types::{AuditEvent, EntityId, FlatState, Sequence, Timestamp};

use crate::StoreError;
use crate::traits::{AuditLog, EntityStore};

/// Entity store backed by a [`BTreeMap`].
#[derive(Debug, Default)]
pub struct InMemoryEntityStore {
    entities: BTreeMap<EntityId, FlatState>,
}

impl InMemoryEntityStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entities currently present.
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Returns true if no entity is present.
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

impl EntityStore for InMemoryEntityStore {
    fn fetch(&self, entity_id: &EntityId) -> Result<Option<FlatState>, StoreError> {
        Ok(self.entities.get(entity_id).cloned())
    }

    fn persist(&mut self, entity_id: &EntityId, state: FlatState) -> Result<(), StoreError> {
        self.entities.insert(*entity_id, state);
        Ok(())
    }

    fn remove(&mut self, entity_id: &EntityId) -> Result<Option<FlatState>, StoreError> {
        Ok(self.entities.remove(entity_id))
    }
}

/// Append-only audit log held in a `Vec`.
///
/// Immutability is structural: the API provides no way to modify or delete
/// an event once appended.
#[derive(Debug)]
pub struct InMemoryAuditLog {
    events: Vec<AuditEvent>,
    next_sequence: Sequence,
}

impl InMemoryAuditLog {
    /// Creates an empty log. The first accepted event gets [`Sequence::FIRST`].
    pub fn new() -> Self {
        Self {
            events: Vec::new(),
            next_sequence: Sequence::FIRST,
        }
    }

    /// Total number of events in the log.
    pub fn count(&self) -> usize {
        self.events.len()
    }
}

impl Default for InMemoryAuditLog {
    fn default() -> Self {
        Self::new()
    }
}

impl AuditLog for InMemoryAuditLog {
    fn append(&mut self, event: AuditEvent) -> Result<Sequence, StoreError> {
        let count_before = self.events.len();

        let sequence = self.next_sequence;
        self.events.push(event.with_sequence(sequence));
        self.next_sequence = sequence.next();

        // Post-condition: the log grew by exactly one event.
        assert_eq!(self.events.len(), count_before + 1);

        Ok(sequence)
    }

    fn events_for(&self, entity_id: &EntityId) -> Result<Vec<AuditEvent>, StoreError> {
        let mut events: Vec<AuditEvent> = self
            .events
            .iter()
            .filter(|event| event.entity_id == *entity_id)
            .cloned()
            .collect();
        events.sort_by_key(|event| event.ordering_key());
        Ok(events)
    }

    fn events_up_to(
        &self,
        entity_id: &EntityId,
        cutoff: Timestamp,
    ) -> Result<Vec<AuditEvent>, StoreError> {
        let mut events: Vec<AuditEvent> = self
            .events
            .iter()
            .filter(|event| event.entity_id == *entity_id && event.timestamp <= cutoff)
            .cloned()
            .collect();
        events.sort_by_key(|event| event.ordering_key());
        Ok(events)
    }

    fn latest_timestamp(&self) -> Result<Option<Timestamp>, StoreError> {
        Ok(self.events.iter().map(|event| event.timestamp).max())
    }
}
