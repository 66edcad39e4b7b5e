//! Validation helpers for DTOs.

use std::collections::HashSet;

use validator::ValidationError;

use crate::state::roster::{MAX_LINE, RosterEntry};

/// Validates that roster entries use lines 1 to 5, fill each slot once and
/// list each player once.
pub fn validate_roster_entries(entries: &[RosterEntry]) -> Result<(), ValidationError> {
    let mut slots = HashSet::new();
    let mut players = HashSet::new();

    for entry in entries {
        if !(1..=MAX_LINE).contains(&entry.line) {
            let mut err = ValidationError::new("roster_line_range");
            err.message = Some(
                format!("Line must be between 1 and {MAX_LINE} (got {})", entry.line).into(),
            );
            return Err(err);
        }

        if !slots.insert((entry.line, entry.position)) {
            let mut err = ValidationError::new("roster_slot_taken");
            err.message = Some(
                format!(
                    "Slot {}/{} is assigned more than once",
                    entry.line,
                    entry.position.code()
                )
                .into(),
            );
            return Err(err);
        }

        if !players.insert(entry.player.id) {
            let mut err = ValidationError::new("roster_player_repeated");
            err.message =
                Some(format!("Player {} appears more than once", entry.player.id).into());
            return Err(err);
        }
    }

    Ok(())
}
