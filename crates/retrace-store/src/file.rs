//! File-backed stores.
//!
//! [`FileAuditLog`] is a JSON-lines append log: one event per line, `fsync`
//! before an append is acknowledged, full replay on open to recover the
//! sequence counter. [`FileEntityStore`] keeps one JSON document per entity
//! under a directory.

use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use retrace_types::{AuditEvent, EntityId, FlatState, Sequence, Timestamp};

use crate::StoreError;
use crate::traits::{AuditLog, EntityStore};

/// Durable append-only audit log.
///
/// # Invariants
///
/// 1. Writes are atomic at line granularity (one event per line)
/// 2. An append is only acknowledged after the event is on disk
/// 3. The log is never truncated or rewritten
#[derive(Debug)]
pub struct FileAuditLog {
    /// Path to the log file.
    path: PathBuf,
    /// Handle open in append mode.
    file: File,
    /// Sequence the next accepted event will get.
    next_sequence: Sequence,
    /// Highest timestamp seen so far, across all entities.
    last_timestamp: Option<Timestamp>,
}

impl FileAuditLog {
    /// Opens or creates an audit log at `path`.
    ///
    /// An existing log is replayed to recover the next sequence and the
    /// latest timestamp.
    ///
    /// # Errors
    ///
    /// Fails if the file cannot be opened, or contains a line that does not
    /// decode as an event.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();

        let mut next_sequence = Sequence::FIRST;
        let mut last_timestamp = None;
        for event in read_events(&path)? {
            next_sequence = next_sequence.max(event.sequence.next());
            last_timestamp = last_timestamp.max(Some(event.timestamp));
        }

        let file = OpenOptions::new().create(true).append(true).open(&path)?;

        Ok(Self {
            path,
            file,
            next_sequence,
            last_timestamp,
        })
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl AuditLog for FileAuditLog {
    fn append(&mut self, event: AuditEvent) -> Result<Sequence, StoreError> {
        let sequence = self.next_sequence;
        let stamped = event.with_sequence(sequence);

        let line = serde_json::to_string(&stamped)?;
        writeln!(self.file, "{line}")?;
        // The sequence is only handed out once the event is on disk.
        self.file.sync_all()?;

        self.next_sequence = sequence.next();
        self.last_timestamp = self.last_timestamp.max(Some(stamped.timestamp));
        Ok(sequence)
    }

    fn events_for(&self, entity_id: &EntityId) -> Result<Vec<AuditEvent>, StoreError> {
        let mut events: Vec<AuditEvent> = read_events(&self.path)?
            .into_iter()
            .filter(|event| event.entity_id == *entity_id)
            .collect();
        events.sort_by_key(|event| event.ordering_key());
        Ok(events)
    }

    fn events_up_to(
        &self,
        entity_id: &EntityId,
        cutoff: Timestamp,
    ) -> Result<Vec<AuditEvent>, StoreError> {
        let mut events: Vec<AuditEvent> = read_events(&self.path)?
            .into_iter()
            .filter(|event| event.entity_id == *entity_id && event.timestamp <= cutoff)
            .collect();
        events.sort_by_key(|event| event.ordering_key());
        Ok(events)
    }

    fn latest_timestamp(&self) -> Result<Option<Timestamp>, StoreError> {
        Ok(self.last_timestamp)
    }
}

/// Reads and decodes every event line in the log at `path`.
///
/// Returns an empty vector if the file does not exist yet.
fn read_events(path: &Path) -> Result<Vec<AuditEvent>, StoreError> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let reader = BufReader::new(File::open(path)?);
    let mut events = Vec::new();

    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        let event = serde_json::from_str(&line).map_err(|err| StoreError::CorruptRecord {
            path: path.to_path_buf(),
            line: index + 1,
            reason: err.to_string(),
        })?;
        events.push(event);
    }

    Ok(events)
}

/// Entity store keeping one JSON document per entity.
///
/// Documents live directly under the store directory, named by entity id.
/// Persist rewrites the whole document; there is no partial update.
#[derive(Debug)]
pub struct FileEntityStore {
    dir: PathBuf,
}

impl FileEntityStore {
    /// Opens a store rooted at `dir`, creating the directory if needed.
    ///
    /// # Errors
    ///
    /// Fails if the directory cannot be created.
    pub fn open<P: AsRef<Path>>(dir: P) -> Result<Self, StoreError> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    fn document_path(&self, entity_id: &EntityId) -> PathBuf {
        self.dir.join(format!("{entity_id}.json"))
    }
}

impl EntityStore for FileEntityStore {
    fn fetch(&self, entity_id: &EntityId) -> Result<Option<FlatState>, StoreError> {
        let path = self.document_path(entity_id);
        if !path.exists() {
            return Ok(None);
        }
        let json = fs::read_to_string(path)?;
        let state = serde_json::from_str(&json)?;
        Ok(Some(state))
    }

    fn persist(&mut self, entity_id: &EntityId, state: FlatState) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(&state)?;
        fs::write(self.document_path(entity_id), json)?;
        Ok(())
    }

    fn remove(&mut self, entity_id: &EntityId) -> Result<Option<FlatState>, StoreError> {
        let previous = self.fetch(entity_id)?;
        if previous.is_some() {
            fs::remove_file(self.document_path(entity_id))?;
        }
        Ok(previous)
    }
}
