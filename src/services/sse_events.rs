use serde::Serialize;
use tracing::warn;

use crate::{
    dto::{
        session::SessionView,
        sse::{
            NoticeEvent, NoticeLevel, RosterUpdatedEvent, ServerEvent, SessionClosedEvent,
            TagsUpdatedEvent,
        },
        tags::TagView,
    },
    state::{SharedState, roster::RosterEntry, tagging::ActiveSession},
};

const EVENT_SESSION_OPENED: &str = "session.opened";
const EVENT_SESSION_UPDATED: &str = "session.updated";
const EVENT_SESSION_CLOSED: &str = "session.closed";
const EVENT_TAGS_UPDATED: &str = "tags.updated";
const EVENT_ROSTER_UPDATED: &str = "roster.updated";
const EVENT_NOTICE: &str = "notice";

/// Broadcast the projection of a freshly opened session.
pub fn broadcast_session_opened(state: &SharedState, view: &SessionView) {
    send_event(state, EVENT_SESSION_OPENED, view);
}

/// Broadcast the projection of the session after a navigation step.
pub fn broadcast_session_updated(state: &SharedState, view: &SessionView) {
    send_event(state, EVENT_SESSION_UPDATED, view);
}

/// Broadcast that a session was closed or replaced.
pub fn broadcast_session_closed(state: &SharedState, session: &ActiveSession) {
    let payload = SessionClosedEvent {
        session_id: session.id,
        game_id: session.game_id,
        mode: session.mode,
    };
    send_event(state, EVENT_SESSION_CLOSED, &payload);
}

/// Broadcast the whole record list of a session.
pub fn broadcast_tags_updated(state: &SharedState, session: &ActiveSession) {
    let payload = TagsUpdatedEvent {
        session_id: session.id,
        tags: TagView::list(session.tags.all()),
    };
    send_event(state, EVENT_TAGS_UPDATED, &payload);
}

/// Broadcast the roster stored for a game.
pub fn broadcast_roster_updated(state: &SharedState, game_id: i64, entries: &[RosterEntry]) {
    let payload = RosterUpdatedEvent {
        game_id,
        entries: entries.to_vec(),
    };
    send_event(state, EVENT_ROSTER_UPDATED, &payload);
}

/// Broadcast a user-facing notice.
pub fn broadcast_notice(state: &SharedState, level: NoticeLevel, message: impl Into<String>) {
    let payload = NoticeEvent {
        level,
        message: message.into(),
    };
    send_event(state, EVENT_NOTICE, &payload);
}

fn send_event(state: &SharedState, event: &str, payload: &impl Serialize) {
    match ServerEvent::json(Some(event.to_string()), payload) {
        Ok(event) => {
            state.events().broadcast(event);
        }
        Err(err) => warn!(event, error = %err, "failed to serialize SSE payload"),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::Value;

    use super::*;
    use crate::{config::AppConfig, state::AppState};

    #[tokio::test]
    async fn notice_is_delivered_with_its_event_name() {
        let state = AppState::new(&AppConfig::default());
        let mut receiver = state.events().subscribe();

        broadcast_notice(&state, NoticeLevel::Error, "commit rolled back");

        let event = receiver.recv().await.unwrap();
        assert_eq!(event.event.as_deref(), Some("notice"));
        let data: Value = serde_json::from_str(&event.data).unwrap();
        assert_eq!(data["level"], "error");
        assert_eq!(data["message"], "commit rolled back");
    }
}
