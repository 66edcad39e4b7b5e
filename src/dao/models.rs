use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use serde_with::{DisplayFromStr, PickFirst, serde_as};

use crate::state::graph::NodeId;

/// Payload of `GET /tagging/questions/{mode}`.
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogResponse {
    /// Questions in catalog order.
    pub questions: Vec<NodeEntity>,
}

/// Question node as stored by the scoring backend.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NodeEntity {
    /// Catalog identifier.
    pub id: NodeId,
    /// Raw type name (`CHOICE`, `TEXT`, `SHOT LOCATION`, ...).
    #[serde(rename = "type")]
    pub kind: String,
    /// Draft field written by the question. Legacy widget nodes omit it.
    #[serde(default)]
    pub key: Option<String>,
    /// Question text.
    #[serde(default, alias = "text")]
    pub prompt: String,
    /// Outgoing edges.
    #[serde(default)]
    pub options: Vec<OptionEntity>,
    /// Node-level edge carried by legacy widget questions.
    #[serde(default, alias = "next_question_id")]
    pub next_node_id: Option<NodeId>,
    /// Node-level terminal flag carried by legacy widget questions.
    #[serde(default, alias = "last_question")]
    pub is_terminal: bool,
    /// Explicit entry point marker.
    #[serde(default)]
    pub is_start: bool,
}

/// Option of a question node as stored by the scoring backend.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OptionEntity {
    /// Value recorded when the option is picked.
    #[serde(default, alias = "answer")]
    pub value: Value,
    /// Button text; falls back to the value.
    #[serde(default)]
    pub label: Option<String>,
    /// Next question.
    #[serde(default, alias = "next_question_id")]
    pub next_node_id: Option<NodeId>,
    /// Whether the option completes the record.
    #[serde(default, alias = "last_question")]
    pub is_terminal: bool,
}

/// Body of `POST /tagging/add-{team|players}-tag`.
#[derive(Debug, Clone, Serialize)]
pub struct CommitTagBody {
    /// Draft fields plus the owning game.
    pub tag: TagBody,
}

/// Record fields sent to the backend.
#[derive(Debug, Clone, Serialize)]
pub struct TagBody {
    /// Game the record belongs to.
    pub game_id: i64,
    /// Answered fields in visitation order.
    #[serde(flatten)]
    pub fields: IndexMap<String, Value>,
}

/// Identifier assigned by the backend to a freshly committed record.
#[serde_as]
#[derive(Debug, Clone, Deserialize)]
pub struct IdResponse {
    /// Server id, accepted as a number or a numeric string.
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    pub id: i64,
}

/// Answer of the delete endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct DeleteResponse {
    /// Whether the backend removed the record. Missing means yes.
    #[serde(default = "default_success")]
    pub success: bool,
}

fn default_success() -> bool {
    true
}

/// A persisted record returned by `GET /tagging/load/{mode}-tags/{game_id}`.
#[serde_as]
#[derive(Debug, Clone, Deserialize)]
pub struct RecordEntity {
    /// Server id.
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    pub id: i64,
    /// Owning game, when the backend echoes it.
    #[serde_as(as = "Option<PickFirst<(_, DisplayFromStr)>>")]
    pub game_id: Option<i64>,
    /// Remaining fields of the record.
    #[serde(flatten)]
    pub fields: IndexMap<String, Value>,
}

/// Player as listed in a game roster.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlayerEntity {
    /// Backend player id.
    pub id: i64,
    /// Given name.
    #[serde(default)]
    pub first_name: String,
    /// Family name.
    #[serde(default)]
    pub last_name: String,
}

/// One roster slot of a game.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RosterEntryEntity {
    /// Line number (1 to 5).
    pub line: u8,
    /// Position code (`LD`, `RD`, `LW`, `C`, `RW`, `G`).
    pub position: String,
    /// Player holding the slot.
    pub player: PlayerEntity,
}
