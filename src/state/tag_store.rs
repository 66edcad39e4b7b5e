//! Ordered record list of the active session with two-phase entries.
//!
//! A finalize appends a `pending` entry under a placeholder id, then either
//! promotes it to `committed` with the backend id or drops every pending entry
//! of its attempt. Entries are never reordered.

use std::{fmt, time::SystemTime};

use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    dao::models::RecordEntity,
    state::{mode::TaggingMode, session::DraftRecord},
};

/// Identifier of a record in the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, ToSchema)]
#[serde(untagged)]
pub enum RecordId {
    /// Local placeholder used until the backend answers.
    Pending(Uuid),
    /// Id assigned by the backend.
    Remote(i64),
}

impl RecordId {
    /// Fresh placeholder id.
    pub fn placeholder() -> Self {
        RecordId::Pending(Uuid::new_v4())
    }

    /// Backend id, when the record was committed.
    pub fn remote(&self) -> Option<i64> {
        match self {
            RecordId::Remote(id) => Some(*id),
            RecordId::Pending(_) => None,
        }
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordId::Pending(id) => write!(f, "pending-{id}"),
            RecordId::Remote(id) => write!(f, "{id}"),
        }
    }
}

/// Identifier of one finalize call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AttemptId(Uuid);

impl AttemptId {
    /// Fresh attempt id.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for AttemptId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for AttemptId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Lifecycle of an entry. Failed attempts are removed rather than kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum EntryStatus {
    /// Appended locally, backend answer outstanding.
    Pending,
    /// Acknowledged by the backend.
    Committed,
}

/// A tagged event.
#[derive(Debug, Clone, PartialEq)]
pub struct CommittedRecord {
    /// Placeholder or backend id.
    pub record_id: RecordId,
    /// Game the event belongs to.
    pub game_id: i64,
    /// Tagging surface that produced it.
    pub mode: TaggingMode,
    /// Answered fields in visitation order.
    pub fields: DraftRecord,
    /// Local creation time.
    pub created_at: SystemTime,
}

impl CommittedRecord {
    /// New record for a completed draft, still without an id.
    pub fn new(game_id: i64, mode: TaggingMode, fields: DraftRecord) -> Self {
        Self {
            record_id: RecordId::placeholder(),
            game_id,
            mode,
            fields,
            created_at: SystemTime::now(),
        }
    }

    /// Record loaded from the backend for an existing game.
    pub fn from_entity(entity: RecordEntity, game_id: i64, mode: TaggingMode) -> Self {
        Self {
            record_id: RecordId::Remote(entity.id),
            game_id: entity.game_id.unwrap_or(game_id),
            mode,
            fields: entity.fields,
            created_at: SystemTime::now(),
        }
    }
}

/// A record plus its commit bookkeeping.
#[derive(Debug, Clone, PartialEq)]
pub struct TagEntry {
    /// The record.
    pub record: CommittedRecord,
    /// Finalize call that appended it; `None` for hydrated records.
    pub attempt_id: Option<AttemptId>,
    /// Commit status.
    pub status: EntryStatus,
}

/// Point-in-time copy of the store.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TagSnapshot(Vec<TagEntry>);

impl TagSnapshot {
    /// Snapshot made of already committed records, in the given order.
    pub fn from_committed(records: impl IntoIterator<Item = CommittedRecord>) -> Self {
        Self(
            records
                .into_iter()
                .map(|record| TagEntry {
                    record,
                    attempt_id: None,
                    status: EntryStatus::Committed,
                })
                .collect(),
        )
    }

    /// Number of entries in the snapshot.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the snapshot is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Records of the active (game, mode) pair, most recent last.
#[derive(Debug, Clone, Default)]
pub struct TagStore {
    entries: Vec<TagEntry>,
}

impl TagStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `record` as pending under a fresh placeholder id and return that id.
    pub fn append(&mut self, mut record: CommittedRecord, attempt: AttemptId) -> RecordId {
        let id = RecordId::placeholder();
        record.record_id = id;
        self.entries.push(TagEntry {
            record,
            attempt_id: Some(attempt),
            status: EntryStatus::Pending,
        });
        id
    }

    /// Swap a placeholder for the backend id and mark the entry committed.
    ///
    /// Returns `false` when no entry carries `temp`.
    pub fn replace_id(&mut self, temp: RecordId, real: i64) -> bool {
        match self.entries.iter_mut().find(|entry| entry.record.record_id == temp) {
            Some(entry) => {
                entry.record.record_id = RecordId::Remote(real);
                entry.status = EntryStatus::Committed;
                true
            }
            None => false,
        }
    }

    /// Remove a record, keeping the order of the others.
    pub fn remove_by_id(&mut self, id: RecordId) -> Option<CommittedRecord> {
        let position = self
            .entries
            .iter()
            .position(|entry| entry.record.record_id == id)?;
        Some(self.entries.remove(position).record)
    }

    /// Drop every pending entry appended by `attempt`, returning how many went.
    pub fn rollback_attempt(&mut self, attempt: AttemptId) -> usize {
        let before = self.entries.len();
        self.entries.retain(|entry| {
            !(entry.status == EntryStatus::Pending && entry.attempt_id == Some(attempt))
        });
        before - self.entries.len()
    }

    /// Copy the current entries.
    pub fn snapshot(&self) -> TagSnapshot {
        TagSnapshot(self.entries.clone())
    }

    /// Replace the entries with a snapshot.
    pub fn restore(&mut self, snapshot: TagSnapshot) {
        self.entries = snapshot.0;
    }

    /// Entries in insertion order.
    pub fn all(&self) -> &[TagEntry] {
        &self.entries
    }

    /// Look an entry up by id.
    pub fn get(&self, id: RecordId) -> Option<&TagEntry> {
        self.entries.iter().find(|entry| entry.record.record_id == id)
    }

    /// Number of entries, pending ones included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the store holds no entry.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
