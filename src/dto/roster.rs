use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::{Validate, ValidationErrors};

use crate::{dto::validation::validate_roster_entries, state::roster::RosterEntry};

/// Roster of the session's game.
#[derive(Debug, Serialize, ToSchema)]
pub struct RosterResponse {
    /// Game the roster belongs to.
    pub game_id: i64,
    /// Entries ordered by line and slot.
    pub entries: Vec<RosterEntry>,
}

/// Full replacement of the session's roster.
#[derive(Debug, Deserialize, ToSchema)]
pub struct ReplaceRosterRequest {
    /// Complete new roster; duplicates are rejected.
    pub entries: Vec<RosterEntry>,
}

impl Validate for ReplaceRosterRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if let Err(e) = validate_roster_entries(&self.entries) {
            errors.add("entries", e);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
