//! DTOs of the session endpoints.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::{format_system_time, tags::TagView},
    state::{
        graph::{NodeId, QuestionNode},
        mode::TaggingMode,
        navigator::Answer,
        tagging::TaggingContext,
    },
};

/// Request opening (or replacing) the tagging session.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct OpenSessionRequest {
    /// Game to tag.
    #[validate(range(min = 1))]
    pub game_id: i64,
    /// Tagging surface.
    pub mode: TaggingMode,
}

/// Answer for the current question.
#[derive(Debug, Deserialize, ToSchema)]
pub struct AnswerRequest {
    /// Payload matching the current question's type.
    pub answer: Answer,
}

/// One option as shown by a question renderer.
#[derive(Debug, Serialize, ToSchema)]
pub struct OptionView {
    /// Index to send back in a `choice` answer.
    pub index: usize,
    /// Recorded value.
    pub value: Value,
    /// Button text.
    pub label: String,
    /// Next question, absent on terminal options.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_node_id: Option<NodeId>,
    /// Whether picking the option completes the record.
    pub is_terminal: bool,
}

/// The question waiting for an answer.
#[derive(Debug, Serialize, ToSchema)]
pub struct QuestionView {
    /// Catalog id of the question.
    pub id: NodeId,
    /// Widget family (`choice`, `location_pick`, `roster_pick`, `participant_set`).
    #[serde(rename = "type")]
    pub kind: String,
    /// Draft field the answer is stored under.
    pub key: String,
    /// Text shown to the tagger.
    pub prompt: String,
    /// Choices, empty for non-choice widgets.
    pub options: Vec<OptionView>,
}

impl From<&QuestionNode> for QuestionView {
    fn from(node: &QuestionNode) -> Self {
        Self {
            id: node.id,
            kind: node.kind.as_str().to_string(),
            key: node.key.clone(),
            prompt: node.prompt.clone(),
            options: node
                .options
                .iter()
                .enumerate()
                .map(|(index, option)| OptionView {
                    index,
                    value: option.value.clone(),
                    label: option.label.clone(),
                    next_node_id: option.next_node_id,
                    is_terminal: option.is_terminal,
                })
                .collect(),
        }
    }
}

/// Read projection of the open session.
#[derive(Debug, Serialize, ToSchema)]
pub struct SessionView {
    /// Identifier of this session, new on every open.
    pub session_id: Uuid,
    /// Game being tagged.
    pub game_id: i64,
    /// Catalog in use.
    pub mode: TaggingMode,
    /// `traversing` or `awaiting_commit`.
    pub phase: String,
    /// Bumped on every phase change.
    pub version: usize,
    /// Question waiting for an answer.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current: Option<QuestionView>,
    /// Fields answered so far, in visitation order.
    #[schema(value_type = Object)]
    pub draft: IndexMap<String, Value>,
    /// Answered question ids, oldest first.
    pub history: Vec<NodeId>,
    /// Whether `POST /session/back` has anything to undo.
    pub can_step_back: bool,
    /// Records in the session's store.
    pub tag_count: usize,
    /// RFC 3339 opening time.
    pub opened_at: String,
}

impl SessionView {
    /// Project the context, `None` when no session is open.
    pub fn from_context(context: &TaggingContext) -> Option<Self> {
        let active = context.active.as_ref()?;
        let navigator = &context.navigator;
        let snapshot = navigator.snapshot();
        let (draft, history) = navigator
            .state()
            .map(|state| (state.draft().clone(), state.history()))
            .unwrap_or_default();

        Some(Self {
            session_id: active.id,
            game_id: active.game_id,
            mode: active.mode,
            phase: snapshot.phase.as_str().to_string(),
            version: snapshot.version,
            current: navigator.current_node().map(QuestionView::from),
            can_step_back: !history.is_empty(),
            draft,
            history,
            tag_count: active.tags.len(),
            opened_at: format_system_time(active.opened_at),
        })
    }
}

/// Result of `POST /session/answer`.
#[derive(Debug, Serialize, ToSchema)]
pub struct AnswerResponse {
    /// Session after the answer (back on the entry point after a commit).
    pub session: SessionView,
    /// Record persisted by a terminal answer.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub committed: Option<TagView>,
}
