//! Per-traversal state and the reducer that mutates it.

use indexmap::IndexMap;
use serde_json::Value;
use tracing::debug;

use crate::state::graph::{NodeId, QuestionGraph, UnknownNode};

/// In-progress record: draft field key to answered value, in visitation order.
pub type DraftRecord = IndexMap<String, Value>;

/// One forward step, remembered so it can be undone exactly.
#[derive(Debug, Clone, PartialEq)]
struct HistoryStep {
    node_id: NodeId,
    /// Value the step overwrote when two questions on the path share a key.
    replaced: Option<Value>,
}

/// Named mutations accepted by [`SessionState::reduce`].
#[derive(Debug, Clone, PartialEq)]
pub enum SessionAction {
    /// Record `value` under the current question's key. With a `next` node the
    /// traversal moves forward; without one the draft is complete and the
    /// position stays put until the commit settles.
    Answer {
        /// Value to record.
        value: Value,
        /// Node to move to, `None` for a terminal answer.
        next: Option<NodeId>,
    },
    /// Undo the last forward step.
    StepBack,
    /// The completed draft was persisted.
    FinalizeSuccess,
    /// The completed draft was rolled back.
    FinalizeFailure,
    /// Abandon the traversal.
    Reset,
}

/// Mutable state of one traversal.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionState {
    current_node_id: NodeId,
    draft: DraftRecord,
    history: Vec<HistoryStep>,
    start_node_id: NodeId,
}

impl SessionState {
    /// Fresh traversal positioned on the graph's entry point.
    pub fn new(graph: &QuestionGraph) -> Self {
        let start = graph.start_node_id();
        Self {
            current_node_id: start,
            draft: DraftRecord::new(),
            history: Vec::new(),
            start_node_id: start,
        }
    }

    /// Question waiting for an answer.
    pub fn current_node_id(&self) -> NodeId {
        self.current_node_id
    }

    /// Fields answered so far.
    pub fn draft(&self) -> &DraftRecord {
        &self.draft
    }

    /// Node ids answered so far, oldest first.
    pub fn history(&self) -> Vec<NodeId> {
        self.history.iter().map(|step| step.node_id).collect()
    }

    /// Entry point the traversal returns to on reset.
    pub fn start_node_id(&self) -> NodeId {
        self.start_node_id
    }

    /// Whether the traversal sits on the start node with nothing answered.
    pub fn is_pristine(&self) -> bool {
        self.current_node_id == self.start_node_id
            && self.history.is_empty()
            && self.draft.is_empty()
    }

    /// Apply a single action.
    ///
    /// `StepBack` on an empty history leaves the state untouched.
    pub fn reduce(&mut self, graph: &QuestionGraph, action: SessionAction) -> Result<(), UnknownNode> {
        debug!(?action, current = self.current_node_id, "reducing session action");
        match action {
            SessionAction::Answer { value, next } => {
                let key = graph.node_by_id(self.current_node_id)?.key.clone();
                match next {
                    Some(next) => {
                        graph.node_by_id(next)?;
                        let replaced = self.draft.insert(key, value);
                        self.history.push(HistoryStep {
                            node_id: self.current_node_id,
                            replaced,
                        });
                        self.current_node_id = next;
                    }
                    None => {
                        self.draft.insert(key, value);
                    }
                }
            }
            SessionAction::StepBack => {
                let Some(step) = self.history.pop() else {
                    return Ok(());
                };
                let key = &graph.node_by_id(step.node_id)?.key;
                match step.replaced {
                    Some(previous) => {
                        self.draft.insert(key.clone(), previous);
                    }
                    None => {
                        self.draft.shift_remove(key);
                    }
                }
                self.current_node_id = step.node_id;
            }
            SessionAction::FinalizeSuccess
            | SessionAction::FinalizeFailure
            | SessionAction::Reset => {
                self.current_node_id = self.start_node_id;
                self.draft.clear();
                self.history.clear();
            }
        }
        Ok(())
    }
}
