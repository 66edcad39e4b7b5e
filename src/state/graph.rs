//! Immutable decision graph driving a tagging traversal.
//!
//! The graph is built from the server catalog once per session and validated
//! eagerly: every reference a traversal can follow is checked here, so the
//! navigator never meets a dangling node id at answer time.

use std::collections::HashMap;

use serde_json::Value;
use thiserror::Error;

use crate::dao::models::{NodeEntity, OptionEntity};

/// Identifier of a question node, as assigned by the catalog.
pub type NodeId = i64;

/// Widget family used to answer a question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QuestionType {
    /// Pick one of the listed options.
    Choice,
    /// Click a point on a picture (rink or net).
    LocationPick,
    /// Pick one player from the game roster.
    RosterPick,
    /// Mark players on ice and players participating in the play.
    ParticipantSet,
}

impl QuestionType {
    /// Parse a catalog type name, accepting both canonical and legacy spellings.
    pub fn from_wire(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "CHOICE" | "TEXT" => Some(Self::Choice),
            "LOCATION_PICK" | "SHOT LOCATION" | "NET LOCATION" => Some(Self::LocationPick),
            "ROSTER_PICK" | "SHOOTER" => Some(Self::RosterPick),
            "PARTICIPANT_SET" | "PARTICIPANTS" => Some(Self::ParticipantSet),
            _ => None,
        }
    }

    /// Stable name used in API projections.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Choice => "choice",
            Self::LocationPick => "location_pick",
            Self::RosterPick => "roster_pick",
            Self::ParticipantSet => "participant_set",
        }
    }
}

/// Field key written by legacy catalogs that omit `key` on widget questions.
fn legacy_default_key(raw_type: &str) -> Option<&'static str> {
    match raw_type.trim().to_ascii_uppercase().as_str() {
        "NET LOCATION" => Some("net"),
        "SHOT LOCATION" | "LOCATION_PICK" => Some("location"),
        "SHOOTER" | "ROSTER_PICK" => Some("shooter"),
        "PARTICIPANTS" | "PARTICIPANT_SET" => Some("participants"),
        _ => None,
    }
}

/// One outgoing edge of a question.
#[derive(Debug, Clone, PartialEq)]
pub struct QuestionOption {
    /// Value written into the draft when this option is chosen.
    pub value: Value,
    /// Text shown on the option button.
    pub label: String,
    /// Node reached when the option is not terminal.
    pub next_node_id: Option<NodeId>,
    /// Whether answering with this option completes the record.
    pub is_terminal: bool,
}

/// A single question of the decision graph.
#[derive(Debug, Clone, PartialEq)]
pub struct QuestionNode {
    /// Catalog identifier.
    pub id: NodeId,
    /// Widget family used to answer the question.
    pub kind: QuestionType,
    /// Draft field written by this question.
    pub key: String,
    /// Question text.
    pub prompt: String,
    /// Outgoing edges. Widget questions continue through their first option.
    pub options: Vec<QuestionOption>,
    /// Explicit entry point marker.
    pub is_start: bool,
}

impl QuestionNode {
    /// Edge followed by widget questions, whose value comes from the answer payload.
    pub fn continuation(&self) -> Option<&QuestionOption> {
        self.options.first()
    }
}

/// Reasons a catalog is rejected at load time.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MalformedGraph {
    /// The catalog has no questions at all.
    #[error("catalog contains no questions")]
    Empty,
    /// A question uses a type name this engine does not know.
    #[error("question {id} has unknown type `{kind}`")]
    UnknownType {
        /// Offending question.
        id: NodeId,
        /// Raw type name found in the catalog.
        kind: String,
    },
    /// Two questions share the same id.
    #[error("question id {id} appears more than once")]
    DuplicateNode {
        /// Duplicated id.
        id: NodeId,
    },
    /// A question has no draft key.
    #[error("question {id} has an empty key")]
    EmptyKey {
        /// Offending question.
        id: NodeId,
    },
    /// A question has no way forward.
    #[error("question {id} has no options")]
    NoOptions {
        /// Offending question.
        id: NodeId,
    },
    /// A choice option carries no value to record.
    #[error("choice option {index} of question {id} has no value")]
    MissingValue {
        /// Offending question.
        id: NodeId,
        /// Position of the option.
        index: usize,
    },
    /// A non-terminal option does not say where to go next.
    #[error("option {index} of question {id} is not terminal but has no next question")]
    MissingNext {
        /// Offending question.
        id: NodeId,
        /// Position of the option.
        index: usize,
    },
    /// A non-terminal option points outside the graph.
    #[error("option {index} of question {id} points to unknown question {next}")]
    DanglingNext {
        /// Offending question.
        id: NodeId,
        /// Position of the option.
        index: usize,
        /// Missing target id.
        next: NodeId,
    },
    /// More than one question claims to be the entry point.
    #[error("questions {first} and {second} are both flagged as start")]
    MultipleStarts {
        /// First flagged question.
        first: NodeId,
        /// Second flagged question.
        second: NodeId,
    },
}

/// Lookup failure for a node id that is not part of the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("unknown question node {0}")]
pub struct UnknownNode(pub NodeId);

impl TryFrom<NodeEntity> for QuestionNode {
    type Error = MalformedGraph;

    fn try_from(entity: NodeEntity) -> Result<Self, Self::Error> {
        let kind = QuestionType::from_wire(&entity.kind).ok_or_else(|| {
            MalformedGraph::UnknownType {
                id: entity.id,
                kind: entity.kind.clone(),
            }
        })?;

        let key = entity
            .key
            .filter(|key| !key.trim().is_empty())
            .or_else(|| legacy_default_key(&entity.kind).map(str::to_owned))
            .unwrap_or_default();

        let mut options: Vec<QuestionOption> =
            entity.options.into_iter().map(Into::into).collect();

        // Legacy widget questions carry their edge on the node itself.
        if options.is_empty() && (entity.next_node_id.is_some() || entity.is_terminal) {
            options.push(QuestionOption {
                value: Value::Null,
                label: String::new(),
                next_node_id: entity.next_node_id,
                is_terminal: entity.is_terminal,
            });
        }

        Ok(Self {
            id: entity.id,
            kind,
            key,
            prompt: entity.prompt,
            options,
            is_start: entity.is_start,
        })
    }
}

impl From<OptionEntity> for QuestionOption {
    fn from(entity: OptionEntity) -> Self {
        let label = entity.label.unwrap_or_else(|| match &entity.value {
            Value::String(text) => text.clone(),
            Value::Null => String::new(),
            other => other.to_string(),
        });

        Self {
            value: entity.value,
            label,
            next_node_id: entity.next_node_id,
            is_terminal: entity.is_terminal,
        }
    }
}

/// Validated, id-indexed question graph for one tagging mode.
#[derive(Debug, Clone)]
pub struct QuestionGraph {
    nodes: Vec<QuestionNode>,
    index: HashMap<NodeId, usize>,
    start: NodeId,
}

impl QuestionGraph {
    /// Index the catalog and check referential integrity.
    ///
    /// The entry point is the node flagged `is_start`; when no node carries the
    /// flag the first node in catalog order is used.
    pub fn load(catalog: Vec<QuestionNode>) -> Result<Self, MalformedGraph> {
        let Some(first) = catalog.first() else {
            return Err(MalformedGraph::Empty);
        };
        let mut start = first.id;

        let mut index = HashMap::with_capacity(catalog.len());
        let mut flagged_start: Option<NodeId> = None;
        for (position, node) in catalog.iter().enumerate() {
            if index.insert(node.id, position).is_some() {
                return Err(MalformedGraph::DuplicateNode { id: node.id });
            }
            if node.is_start {
                if let Some(first) = flagged_start {
                    return Err(MalformedGraph::MultipleStarts {
                        first,
                        second: node.id,
                    });
                }
                flagged_start = Some(node.id);
            }
        }
        if let Some(flagged) = flagged_start {
            start = flagged;
        }

        for node in &catalog {
            if node.key.trim().is_empty() {
                return Err(MalformedGraph::EmptyKey { id: node.id });
            }
            if node.options.is_empty() {
                return Err(MalformedGraph::NoOptions { id: node.id });
            }
            for (position, option) in node.options.iter().enumerate() {
                if node.kind == QuestionType::Choice && option.value.is_null() {
                    return Err(MalformedGraph::MissingValue {
                        id: node.id,
                        index: position,
                    });
                }
                if option.is_terminal {
                    continue;
                }
                let Some(next) = option.next_node_id else {
                    return Err(MalformedGraph::MissingNext {
                        id: node.id,
                        index: position,
                    });
                };
                if !index.contains_key(&next) {
                    return Err(MalformedGraph::DanglingNext {
                        id: node.id,
                        index: position,
                        next,
                    });
                }
            }
        }

        Ok(Self {
            nodes: catalog,
            index,
            start,
        })
    }

    /// Look up a node by id.
    pub fn node_by_id(&self, id: NodeId) -> Result<&QuestionNode, UnknownNode> {
        self.index
            .get(&id)
            .and_then(|position| self.nodes.get(*position))
            .ok_or(UnknownNode(id))
    }

    /// Entry point of every traversal.
    pub fn start_node_id(&self) -> NodeId {
        self.start
    }

    /// Nodes in catalog order.
    pub fn nodes(&self) -> impl Iterator<Item = &QuestionNode> {
        self.nodes.iter()
    }

    /// Number of questions in the graph.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the graph has no questions (never true for a loaded graph).
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
