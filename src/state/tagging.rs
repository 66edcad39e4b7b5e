use std::time::SystemTime;

use uuid::Uuid;

use crate::state::{mode::TaggingMode, navigator::Navigator, roster::Roster, tag_store::TagStore};

/// The (game, mode) pair currently being tagged.
#[derive(Debug)]
pub struct ActiveSession {
    /// Identifies this session; a replaced session never sees late commit results.
    pub id: Uuid,
    /// Game being tagged.
    pub game_id: i64,
    /// Tagging surface.
    pub mode: TaggingMode,
    /// Roster of the game, empty when it could not be loaded.
    pub roster: Roster,
    /// Records of the game for this mode.
    pub tags: TagStore,
    /// When the session was opened.
    pub opened_at: SystemTime,
}

impl ActiveSession {
    /// Fresh session with an empty roster and store.
    pub fn new(game_id: i64, mode: TaggingMode) -> Self {
        Self {
            id: Uuid::new_v4(),
            game_id,
            mode,
            roster: Roster::default(),
            tags: TagStore::new(),
            opened_at: SystemTime::now(),
        }
    }
}

/// Navigator plus the session it serves.
#[derive(Debug, Default)]
pub struct TaggingContext {
    /// Traversal over the session's question graph.
    pub navigator: Navigator,
    /// Open session, if any.
    pub active: Option<ActiveSession>,
}

impl TaggingContext {
    /// Whether `session_id` is still the open session.
    pub fn is_current(&self, session_id: Uuid) -> bool {
        self.active
            .as_ref()
            .is_some_and(|active| active.id == session_id)
    }

    /// Mutable access to the open session when it is still `session_id`.
    pub fn current_mut(&mut self, session_id: Uuid) -> Option<&mut ActiveSession> {
        self.active
            .as_mut()
            .filter(|active| active.id == session_id)
    }

    /// Drop the session and idle the navigator.
    pub fn close(&mut self) -> Option<ActiveSession> {
        self.navigator.close();
        self.active.take()
    }
}
