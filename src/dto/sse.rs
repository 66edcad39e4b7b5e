use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{dto::tags::TagView, state::{mode::TaggingMode, roster::RosterEntry}};

#[derive(Clone, Debug)]
/// Dispatched payload carried across SSE channels.
pub struct ServerEvent {
    /// SSE event name.
    pub event: Option<String>,
    /// Serialised JSON payload.
    pub data: String,
}

impl ServerEvent {
    /// Convenience wrapper that serialises `payload` into the SSE data field.
    pub fn json<E, T>(event: E, payload: &T) -> serde_json::Result<Self>
    where
        E: Into<Option<String>>,
        T: Serialize,
    {
        Ok(Self {
            event: event.into(),
            data: serde_json::to_string(payload)?,
        })
    }
}

#[derive(Debug, Serialize, ToSchema)]
/// Initial metadata sent when a client subscribes.
pub struct Handshake {
    /// Human-readable message confirming the subscription.
    pub message: String,
    /// Whether the service is running without a backend connection.
    pub degraded: bool,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast when the open session is closed or replaced.
pub struct SessionClosedEvent {
    /// Session that ended.
    pub session_id: Uuid,
    /// Game of that session.
    pub game_id: i64,
    /// Mode of that session.
    pub mode: TaggingMode,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast whenever the record list of the session changes.
pub struct TagsUpdatedEvent {
    /// Session owning the records.
    pub session_id: Uuid,
    /// Whole record list in insertion order.
    pub tags: Vec<TagView>,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast after the roster of the session's game was replaced.
pub struct RosterUpdatedEvent {
    /// Game the roster belongs to.
    pub game_id: i64,
    /// New roster.
    pub entries: Vec<RosterEntry>,
}

#[derive(Debug, Clone, Copy, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
/// Severity of a [`NoticeEvent`].
pub enum NoticeLevel {
    /// Informational.
    Info,
    /// Something degraded but the session goes on.
    Warning,
    /// An operation failed.
    Error,
}

#[derive(Debug, Serialize, ToSchema)]
/// User-facing notice, e.g. a rolled back commit.
pub struct NoticeEvent {
    /// Severity.
    pub level: NoticeLevel,
    /// Text to display.
    pub message: String,
}
