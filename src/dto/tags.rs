use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;
use utoipa::ToSchema;

use crate::{
    dto::format_system_time,
    state::{
        mode::TaggingMode,
        tag_store::{EntryStatus, RecordId, TagEntry},
    },
};

/// A record of the summary list.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TagView {
    /// 1-based position in insertion order.
    pub position: usize,
    /// Backend id, or a `pending-` placeholder while the commit is in flight.
    pub record_id: RecordId,
    /// Pending while the commit is in flight.
    pub status: EntryStatus,
    /// Game the record belongs to.
    pub game_id: i64,
    /// Catalog the record was tagged with.
    pub mode: TaggingMode,
    /// Answered fields in visitation order.
    #[schema(value_type = Object)]
    pub fields: IndexMap<String, Value>,
    /// RFC 3339 creation time.
    pub created_at: String,
}

impl TagView {
    /// Project an entry found at `index` (0-based) of the store.
    pub fn from_entry(index: usize, entry: &TagEntry) -> Self {
        Self {
            position: index + 1,
            record_id: entry.record.record_id,
            status: entry.status,
            game_id: entry.record.game_id,
            mode: entry.record.mode,
            fields: entry.record.fields.clone(),
            created_at: format_system_time(entry.record.created_at),
        }
    }

    /// Project a whole store.
    pub fn list(entries: &[TagEntry]) -> Vec<Self> {
        entries
            .iter()
            .enumerate()
            .map(|(index, entry)| Self::from_entry(index, entry))
            .collect()
    }
}
