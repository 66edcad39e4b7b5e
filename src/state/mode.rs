use std::fmt;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Tagging surface a session records events for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum TaggingMode {
    /// Team-level events (plays, shots, results).
    Team,
    /// Individual player events.
    Player,
    /// Goalie events. Declared but not backed by any remote endpoint yet.
    Goalie,
}

impl TaggingMode {
    /// Lowercase name used in remote paths and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            TaggingMode::Team => "team",
            TaggingMode::Player => "player",
            TaggingMode::Goalie => "goalie",
        }
    }

    /// Whether records of this mode can be persisted.
    pub fn is_supported(&self) -> bool {
        !matches!(self, TaggingMode::Goalie)
    }
}

impl fmt::Display for TaggingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
