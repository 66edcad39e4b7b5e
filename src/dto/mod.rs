use std::time::SystemTime;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};

/// Health check payloads.
pub mod health;
/// Roster requests and responses.
pub mod roster;
/// Session views and navigation requests.
pub mod session;
/// Server-Sent Events payloads.
pub mod sse;
/// Recorded tag views.
pub mod tags;
/// Request validation helpers.
pub mod validation;

fn format_system_time(time: SystemTime) -> String {
    OffsetDateTime::from(time)
        .format(&Rfc3339)
        .unwrap_or_else(|_| "invalid-timestamp".into())
}
