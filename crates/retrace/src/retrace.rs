//! Main entry point for the Retrace audit trail.
//!
//! The `Retrace` struct composes an entity store and an audit log into the
//! two paths of the system: the write path (validate → persist → append) and
//! the read path (fetch ordered events once → fold).

use std::path::Path;

use retrace_config::{RetraceConfig, StorageConfig};
use retrace_kernel::{
    StateComparison, build_create_event, build_delete_event, build_update_event, compare_at,
    reconstruct,
};
use retrace_store::{
    AuditLog, EntityStore, FileAuditLog, FileEntityStore, InMemoryAuditLog, InMemoryEntityStore,
    StoreError,
};
use retrace_types::{AuditEvent, EntityId, EntityKind, FlatState, Snapshot, Timestamp};
use tracing::instrument;

use crate::error::{Result, RetraceError};

/// Retrace over the in-memory stores. Nothing outlives the handle.
pub type MemoryRetrace = Retrace<InMemoryEntityStore, InMemoryAuditLog>;

/// Retrace over the file-backed stores.
pub type FileRetrace = Retrace<FileEntityStore, FileAuditLog>;

/// The main audit-trail handle.
///
/// Generic over its two collaborators so embedders can supply their own
/// backends; [`MemoryRetrace`] and [`FileRetrace`] cover the provided ones.
/// Every accepted mutation appends exactly one immutable event, stamped
/// strictly after everything already in the log, so replay order is total.
///
/// # Example
///
/// ```ignore
/// use retrace::{EntityId, Retrace};
///
/// let mut trail = Retrace::open("./data")?;
/// let id = EntityId::generate();
///
/// trail.create(id, state)?;
/// trail.update(id, changes)?;
///
/// let before = trail.snapshot_at(id, earlier)?;
/// ```
pub struct Retrace<E, L>
where
    E: EntityStore,
    L: AuditLog,
{
    /// Current state of every live entity.
    entity_store: E,
    /// Append-only history of accepted mutations.
    audit_log: L,
    /// Kind recorded on events this handle produces.
    entity_kind: EntityKind,
}

impl MemoryRetrace {
    /// Creates an audit trail held entirely in memory.
    ///
    /// Useful for tests and short-lived embedding; nothing is persisted.
    pub fn in_memory() -> Self {
        Self::in_memory_with_config(&RetraceConfig::default())
    }

    /// Creates an in-memory audit trail with settings from a configuration.
    pub fn in_memory_with_config(config: &RetraceConfig) -> Self {
        Self::with_stores(
            InMemoryEntityStore::new(),
            InMemoryAuditLog::new(),
            EntityKind::new(config.audit.default_entity_kind.clone()),
        )
    }
}

impl FileRetrace {
    /// Opens a file-backed audit trail at the given data directory.
    ///
    /// If the directory doesn't exist, it will be created. If a trail already
    /// exists there, its log is replayed and appending resumes after the
    /// highest recorded position.
    pub fn open(data_dir: impl AsRef<Path>) -> Result<Self> {
        let config = RetraceConfig {
            storage: StorageConfig {
                data_dir: data_dir.as_ref().to_path_buf(),
                ..StorageConfig::default()
            },
            ..RetraceConfig::default()
        };
        Self::open_with_config(&config)
    }

    /// Opens a file-backed audit trail with custom configuration.
    ///
    /// Uses the configuration's data directory, log filename, and default
    /// entity kind. Applications wanting [`retrace_config::StorageBackend::Memory`]
    /// call [`MemoryRetrace::in_memory_with_config`] instead.
    pub fn open_with_config(config: &RetraceConfig) -> Result<Self> {
        // Ensure the data directory exists before the log file is created in it.
        std::fs::create_dir_all(&config.storage.data_dir).map_err(StoreError::Io)?;

        let entity_store = FileEntityStore::open(config.entities_dir())?;
        let audit_log = FileAuditLog::open(config.audit_log_path())?;

        Ok(Self::with_stores(
            entity_store,
            audit_log,
            EntityKind::new(config.audit.default_entity_kind.clone()),
        ))
    }
}

impl<E, L> Retrace<E, L>
where
    E: EntityStore,
    L: AuditLog,
{
    /// Creates a handle over caller-supplied stores.
    pub fn with_stores(entity_store: E, audit_log: L, entity_kind: EntityKind) -> Self {
        Self {
            entity_store,
            audit_log,
            entity_kind,
        }
    }

    /// Sets the entity kind recorded on subsequent events.
    pub fn with_entity_kind(mut self, kind: impl Into<EntityKind>) -> Self {
        self.entity_kind = kind.into();
        self
    }

    /// Returns the kind recorded on events this handle produces.
    pub fn entity_kind(&self) -> &EntityKind {
        &self.entity_kind
    }

    /// Returns a reference to the entity store.
    pub fn entity_store(&self) -> &E {
        &self.entity_store
    }

    /// Returns a reference to the audit log.
    pub fn audit_log(&self) -> &L {
        &self.audit_log
    }

    // ========================================================================
    // Write path: validate → persist → append
    // ========================================================================

    /// Creates an entity, recording a create event.
    ///
    /// Creating over an existing entity is a full reset: the stored state
    /// becomes exactly `state`, and replay treats the event the same way.
    /// Returns the stored state.
    ///
    /// # Errors
    ///
    /// Returns [`RetraceError::Store`] if either collaborator fails.
    #[instrument(skip_all, fields(entity_id = %entity_id))]
    pub fn create(&mut self, entity_id: EntityId, state: FlatState) -> Result<FlatState> {
        let timestamp = self.next_timestamp()?;
        let event = build_create_event(self.entity_kind.clone(), entity_id, &state, timestamp);

        self.entity_store.persist(&entity_id, state.clone())?;
        let sequence = self.audit_log.append(event)?;

        tracing::debug!(%timestamp, %sequence, fields = state.len(), "recorded create event");
        Ok(state)
    }

    /// Applies a partial update to an existing entity.
    ///
    /// `submitted` holds only the fields to change. The update is diffed
    /// against the current state first: an update that changes nothing is
    /// rejected with [`RetraceError::NoChanges`] and neither store is
    /// touched. Returns the merged state that was persisted.
    ///
    /// # Errors
    ///
    /// Returns [`RetraceError::EntityNotFound`] if the entity does not
    /// exist, [`RetraceError::NoChanges`] if the diff is empty, and
    /// [`RetraceError::Store`] if either collaborator fails.
    #[instrument(skip_all, fields(entity_id = %entity_id))]
    pub fn update(&mut self, entity_id: EntityId, submitted: FlatState) -> Result<FlatState> {
        let previous = self
            .entity_store
            .fetch(&entity_id)?
            .ok_or(RetraceError::EntityNotFound { entity_id })?;

        // Rejection happens here: an empty diff never reaches either store.
        let timestamp = self.next_timestamp()?;
        let event = build_update_event(
            self.entity_kind.clone(),
            entity_id,
            &previous,
            &submitted,
            timestamp,
        )?;
        let changed = event.diff.len();

        let merged = previous.merged(&submitted);
        self.entity_store.persist(&entity_id, merged.clone())?;
        let sequence = self.audit_log.append(event)?;

        tracing::debug!(%timestamp, %sequence, changed, "recorded update event");
        Ok(merged)
    }

    /// Deletes an entity, recording a delete event with an empty diff.
    ///
    /// # Errors
    ///
    /// Returns [`RetraceError::EntityNotFound`] if the entity does not
    /// exist, and [`RetraceError::Store`] if either collaborator fails.
    #[instrument(skip_all, fields(entity_id = %entity_id))]
    pub fn delete(&mut self, entity_id: EntityId) -> Result<()> {
        self.entity_store
            .remove(&entity_id)?
            .ok_or(RetraceError::EntityNotFound { entity_id })?;

        let timestamp = self.next_timestamp()?;
        let event = build_delete_event(self.entity_kind.clone(), entity_id, timestamp);
        let sequence = self.audit_log.append(event)?;

        tracing::debug!(%timestamp, %sequence, "recorded delete event");
        Ok(())
    }

    /// Creates an entity from a raw JSON payload.
    ///
    /// # Errors
    ///
    /// Returns [`RetraceError::InvalidInput`] if the payload is not a JSON
    /// object, plus everything [`Retrace::create`] can return.
    pub fn create_from_json(
        &mut self,
        entity_id: EntityId,
        payload: serde_json::Value,
    ) -> Result<FlatState> {
        let state = FlatState::try_from(payload)?;
        self.create(entity_id, state)
    }

    /// Applies a partial update from a raw JSON payload.
    ///
    /// # Errors
    ///
    /// Returns [`RetraceError::InvalidInput`] if the payload is not a JSON
    /// object, plus everything [`Retrace::update`] can return.
    pub fn update_from_json(
        &mut self,
        entity_id: EntityId,
        payload: serde_json::Value,
    ) -> Result<FlatState> {
        let submitted = FlatState::try_from(payload)?;
        self.update(entity_id, submitted)
    }

    // ========================================================================
    // Read path: fetch ordered events once → fold
    // ========================================================================

    /// Returns the current state of an entity, or `None` if it does not
    /// exist.
    ///
    /// # Errors
    ///
    /// Returns [`RetraceError::Store`] if the entity store fails.
    pub fn current(&self, entity_id: EntityId) -> Result<Option<FlatState>> {
        Ok(self.entity_store.fetch(&entity_id)?)
    }

    /// Returns the full event history of an entity, ascending by
    /// `(timestamp, sequence)`.
    ///
    /// # Errors
    ///
    /// Returns [`RetraceError::Store`] if the audit log fails.
    pub fn history(&self, entity_id: EntityId) -> Result<Vec<AuditEvent>> {
        Ok(self.audit_log.events_for(&entity_id)?)
    }

    /// Reconstructs the state of an entity as of `cutoff`, inclusive.
    ///
    /// An entity with no events at or before the cutoff reconstructs to
    /// [`Snapshot::Absent`].
    ///
    /// # Errors
    ///
    /// Returns [`RetraceError::Store`] if the audit log fails.
    #[instrument(skip_all, fields(entity_id = %entity_id, cutoff = %cutoff))]
    pub fn snapshot_at(&self, entity_id: EntityId, cutoff: Timestamp) -> Result<Snapshot> {
        let events = self.audit_log.events_up_to(&entity_id, cutoff)?;
        Ok(reconstruct(&events))
    }

    /// Compares the state of an entity at two instants.
    ///
    /// The cutoffs are inclusive and order-independent: swapping `t1` and
    /// `t2` swaps the result fields and nothing else. Events are fetched
    /// once, at the later of the two cutoffs; both snapshots fold from that
    /// shared sequence.
    ///
    /// # Errors
    ///
    /// Returns [`RetraceError::Store`] if the audit log fails.
    #[instrument(skip_all, fields(entity_id = %entity_id, t1 = %t1, t2 = %t2))]
    pub fn compare(
        &self,
        entity_id: EntityId,
        t1: Timestamp,
        t2: Timestamp,
    ) -> Result<StateComparison> {
        let horizon = t1.max(t2);
        let events = self.audit_log.events_up_to(&entity_id, horizon)?;
        Ok(compare_at(&events, t1, t2))
    }

    /// Stamps a mutation: strictly after everything already in the log.
    fn next_timestamp(&self) -> Result<Timestamp> {
        let last = self.audit_log.latest_timestamp()?;
        Ok(Timestamp::now_monotonic(last))
    }
}
