//! Game roster and the participant marking used by PARTICIPANT_SET questions.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

use crate::dao::models::{PlayerEntity, RosterEntryEntity};

/// Backend player id.
pub type PlayerId = i64;

/// Highest line number a roster slot can use.
pub const MAX_LINE: u8 = 5;

/// Player reference stored in drafts for ROSTER_PICK answers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Player {
    /// Backend player id.
    pub id: PlayerId,
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
}

/// On-ice position of a roster slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum Position {
    /// Left defense.
    #[serde(rename = "LD")]
    LeftDefense,
    /// Right defense.
    #[serde(rename = "RD")]
    RightDefense,
    /// Left wing.
    #[serde(rename = "LW")]
    LeftWing,
    /// Center.
    #[serde(rename = "C")]
    Center,
    /// Right wing.
    #[serde(rename = "RW")]
    RightWing,
    /// Goalie.
    #[serde(rename = "G")]
    Goalie,
}

impl Position {
    /// Parse the two-letter position code used by the backend.
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_ascii_uppercase().as_str() {
            "LD" => Some(Self::LeftDefense),
            "RD" => Some(Self::RightDefense),
            "LW" => Some(Self::LeftWing),
            "C" => Some(Self::Center),
            "RW" => Some(Self::RightWing),
            "G" => Some(Self::Goalie),
            _ => None,
        }
    }

    /// Position code used by the backend.
    pub fn code(&self) -> &'static str {
        match self {
            Self::LeftDefense => "LD",
            Self::RightDefense => "RD",
            Self::LeftWing => "LW",
            Self::Center => "C",
            Self::RightWing => "RW",
            Self::Goalie => "G",
        }
    }
}

/// One slot of the game roster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct RosterEntry {
    /// Line number (1 to 5).
    pub line: u8,
    /// Position on the line.
    pub position: Position,
    /// Player holding the slot.
    pub player: Player,
}

/// Reasons a roster is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RosterError {
    /// Line number outside `1..=5`.
    #[error("line {line} is out of range (1..=5)")]
    LineOutOfRange {
        /// Offending line.
        line: u8,
    },
    /// Two entries fill the same slot.
    #[error("slot {line}/{} is assigned twice", .position.code())]
    DuplicateSlot {
        /// Line of the slot.
        line: u8,
        /// Position of the slot.
        position: Position,
    },
    /// A player appears in more than one slot.
    #[error("player {player_id} appears more than once")]
    DuplicatePlayer {
        /// Repeated player.
        player_id: PlayerId,
    },
    /// The backend sent a position code this engine does not know.
    #[error("unknown position `{0}`")]
    UnknownPosition(String),
}

/// Validated roster of the active game.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Roster {
    entries: Vec<RosterEntry>,
}

impl Roster {
    /// Validate and wrap roster entries.
    pub fn new(entries: Vec<RosterEntry>) -> Result<Self, RosterError> {
        let mut slots = HashSet::new();
        let mut players = HashSet::new();
        for entry in &entries {
            if !(1..=MAX_LINE).contains(&entry.line) {
                return Err(RosterError::LineOutOfRange { line: entry.line });
            }
            if !slots.insert((entry.line, entry.position)) {
                return Err(RosterError::DuplicateSlot {
                    line: entry.line,
                    position: entry.position,
                });
            }
            if !players.insert(entry.player.id) {
                return Err(RosterError::DuplicatePlayer {
                    player_id: entry.player.id,
                });
            }
        }
        Ok(Self { entries })
    }

    /// Entries in backend order.
    pub fn entries(&self) -> &[RosterEntry] {
        &self.entries
    }

    /// Look a player up by id.
    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.entries
            .iter()
            .map(|entry| &entry.player)
            .find(|player| player.id == id)
    }

    /// Whether the player holds a slot.
    pub fn contains(&self, id: PlayerId) -> bool {
        self.player(id).is_some()
    }

    /// Number of filled slots.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no slot is filled.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl From<PlayerEntity> for Player {
    fn from(value: PlayerEntity) -> Self {
        Self {
            id: value.id,
            first_name: value.first_name,
            last_name: value.last_name,
        }
    }
}

impl From<Player> for PlayerEntity {
    fn from(value: Player) -> Self {
        Self {
            id: value.id,
            first_name: value.first_name,
            last_name: value.last_name,
        }
    }
}

impl TryFrom<RosterEntryEntity> for RosterEntry {
    type Error = RosterError;

    fn try_from(value: RosterEntryEntity) -> Result<Self, Self::Error> {
        let position = Position::from_code(&value.position)
            .ok_or(RosterError::UnknownPosition(value.position))?;
        Ok(Self {
            line: value.line,
            position,
            player: value.player.into(),
        })
    }
}

impl TryFrom<Vec<RosterEntryEntity>> for Roster {
    type Error = RosterError;

    fn try_from(value: Vec<RosterEntryEntity>) -> Result<Self, Self::Error> {
        let entries = value
            .into_iter()
            .map(RosterEntry::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        Roster::new(entries)
    }
}

impl From<RosterEntry> for RosterEntryEntity {
    fn from(value: RosterEntry) -> Self {
        Self {
            line: value.line,
            position: value.position.code().to_string(),
            player: value.player.into(),
        }
    }
}

/// Marking state of one player inside a [`ParticipantSelection`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParticipantMark {
    /// Not marked.
    None,
    /// On ice during the play.
    OnIce,
    /// On ice and involved in the play.
    Participated,
}

/// Reasons a participant selection is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectionError {
    /// A marked player is not in the game roster.
    #[error("player {0} is not in the game roster")]
    NotInRoster(PlayerId),
    /// A player is listed twice in the same list.
    #[error("player {0} is listed more than once")]
    Duplicate(PlayerId),
    /// A participating player was not marked on ice.
    #[error("player {0} participated but was not on ice")]
    NotOnIce(PlayerId),
}

/// Players on ice and players involved in a play.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ParticipantSelection {
    /// Players on ice, in marking order.
    #[serde(default)]
    pub on_ices: Vec<PlayerId>,
    /// Players involved in the play; always a subset of `on_ices`.
    #[serde(default)]
    pub participations: Vec<PlayerId>,
}

impl ParticipantSelection {
    /// Current mark of a player.
    pub fn mark(&self, player_id: PlayerId) -> ParticipantMark {
        if self.participations.contains(&player_id) {
            ParticipantMark::Participated
        } else if self.on_ices.contains(&player_id) {
            ParticipantMark::OnIce
        } else {
            ParticipantMark::None
        }
    }

    /// Cycle a player none, on ice, participated, none, returning the new mark.
    pub fn toggle(&mut self, player_id: PlayerId) -> ParticipantMark {
        match self.mark(player_id) {
            ParticipantMark::None => {
                self.on_ices.push(player_id);
                ParticipantMark::OnIce
            }
            ParticipantMark::OnIce => {
                self.participations.push(player_id);
                ParticipantMark::Participated
            }
            ParticipantMark::Participated => {
                self.on_ices.retain(|id| *id != player_id);
                self.participations.retain(|id| *id != player_id);
                ParticipantMark::None
            }
        }
    }

    /// Check ids against the roster and the subset rule.
    pub fn validate(&self, roster: &Roster) -> Result<(), SelectionError> {
        let mut on_ice = HashSet::with_capacity(self.on_ices.len());
        for id in &self.on_ices {
            if !roster.contains(*id) {
                return Err(SelectionError::NotInRoster(*id));
            }
            if !on_ice.insert(*id) {
                return Err(SelectionError::Duplicate(*id));
            }
        }

        let mut seen = HashSet::with_capacity(self.participations.len());
        for id in &self.participations {
            if !roster.contains(*id) {
                return Err(SelectionError::NotInRoster(*id));
            }
            if !seen.insert(*id) {
                return Err(SelectionError::Duplicate(*id));
            }
            if !on_ice.contains(id) {
                return Err(SelectionError::NotOnIce(*id));
            }
        }
        Ok(())
    }
}
