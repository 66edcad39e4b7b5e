//! Answer resolution on top of the session reducer and the phase machine.

use std::sync::Arc;

use serde::Deserialize;
use serde_json::{Value, json};
use thiserror::Error;
use utoipa::ToSchema;

use crate::state::{
    graph::{NodeId, QuestionGraph, QuestionNode, QuestionOption, QuestionType, UnknownNode},
    roster::{ParticipantSelection, PlayerId, Roster},
    session::{DraftRecord, SessionAction, SessionState},
    state_machine::{InvalidTransition, NavigatorEvent, NavigatorPhase, PhaseMachine, Snapshot},
};

/// Answer submitted for the current question.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Answer {
    /// Pick an option of a CHOICE question by position.
    Choice {
        /// Zero-based option index.
        option: usize,
    },
    /// Point clicked on a LOCATION_PICK picture, in percent.
    Location {
        /// Horizontal position, 0 to 100.
        x: u8,
        /// Vertical position, 0 to 100.
        y: u8,
    },
    /// Player picked for a ROSTER_PICK question.
    Player {
        /// Roster player id.
        player_id: PlayerId,
    },
    /// Marked players for a PARTICIPANT_SET question.
    Participants {
        /// Players on ice.
        #[serde(default)]
        on_ices: Vec<PlayerId>,
        /// Players involved in the play.
        #[serde(default)]
        participations: Vec<PlayerId>,
    },
}

impl Answer {
    fn expected_type(&self) -> QuestionType {
        match self {
            Answer::Choice { .. } => QuestionType::Choice,
            Answer::Location { .. } => QuestionType::LocationPick,
            Answer::Player { .. } => QuestionType::RosterPick,
            Answer::Participants { .. } => QuestionType::ParticipantSet,
        }
    }
}

/// Result of a successful [`Navigator::answer`].
#[derive(Debug, Clone, PartialEq)]
pub enum AnswerOutcome {
    /// The traversal moved to the next question.
    Advanced,
    /// A terminal option completed the draft; it must now be committed.
    Completed(DraftRecord),
}

/// Reasons the navigator refuses an operation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum NavigationError {
    /// No graph is loaded.
    #[error("no tagging session is open")]
    NoGraph,
    /// A completed record is still being committed.
    #[error("a record is being committed; wait for it to settle")]
    CommitInFlight,
    /// The option index does not exist on the current question.
    #[error("question {node} has no option {index}")]
    UnknownOption {
        /// Current question.
        node: NodeId,
        /// Requested option.
        index: usize,
    },
    /// The answer kind does not fit the current question.
    #[error("question {node} expects a {} answer", .expected.as_str())]
    AnswerMismatch {
        /// Current question.
        node: NodeId,
        /// Widget family of the current question.
        expected: QuestionType,
    },
    /// The answer payload is out of range or references unknown players.
    #[error("invalid answer: {0}")]
    InvalidAnswer(String),
    /// The graph lost a node the traversal points to.
    #[error(transparent)]
    UnknownNode(#[from] UnknownNode),
    /// The phase machine refused the transition.
    #[error(transparent)]
    Transition(#[from] InvalidTransition),
}

/// Drives one traversal at a time over a shared, immutable graph.
#[derive(Debug, Default)]
pub struct Navigator {
    machine: PhaseMachine,
    graph: Option<Arc<QuestionGraph>>,
    state: Option<SessionState>,
}

impl Navigator {
    /// Idle navigator without a graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Install a graph and position the traversal on its entry point.
    ///
    /// Any previous traversal is dropped first.
    pub fn load(&mut self, graph: Arc<QuestionGraph>) -> Result<(), InvalidTransition> {
        if self.machine.phase() != NavigatorPhase::Idle {
            self.close();
        }
        self.machine.apply(NavigatorEvent::GraphLoaded)?;
        self.state = Some(SessionState::new(&graph));
        self.graph = Some(graph);
        Ok(())
    }

    /// Drop the graph and the traversal.
    pub fn close(&mut self) {
        // Closed is accepted from every phase.
        let _ = self.machine.apply(NavigatorEvent::Closed);
        self.graph = None;
        self.state = None;
    }

    /// Current phase.
    pub fn phase(&self) -> NavigatorPhase {
        self.machine.phase()
    }

    /// Phase and version of the underlying machine.
    pub fn snapshot(&self) -> Snapshot {
        self.machine.snapshot()
    }

    /// Loaded graph, if any.
    pub fn graph(&self) -> Option<&Arc<QuestionGraph>> {
        self.graph.as_ref()
    }

    /// Traversal state, if a graph is loaded.
    pub fn state(&self) -> Option<&SessionState> {
        self.state.as_ref()
    }

    /// Question waiting for an answer.
    pub fn current_node(&self) -> Option<&QuestionNode> {
        let graph = self.graph.as_ref()?;
        let state = self.state.as_ref()?;
        graph.node_by_id(state.current_node_id()).ok()
    }

    /// Resolve `answer` against the current question and apply it.
    pub fn answer(
        &mut self,
        answer: Answer,
        roster: &Roster,
    ) -> Result<AnswerOutcome, NavigationError> {
        self.ensure_traversing()?;
        let graph = self.graph.clone().ok_or(NavigationError::NoGraph)?;
        let state = self.state.as_mut().ok_or(NavigationError::NoGraph)?;

        let node = graph.node_by_id(state.current_node_id())?;
        let (value, option) = resolve(node, answer, roster)?;

        if option.is_terminal {
            state.reduce(&graph, SessionAction::Answer { value, next: None })?;
            let draft = state.draft().clone();
            self.machine.apply(NavigatorEvent::TerminalAnswered)?;
            return Ok(AnswerOutcome::Completed(draft));
        }

        state.reduce(
            &graph,
            SessionAction::Answer {
                value,
                next: option.next_node_id,
            },
        )?;
        Ok(AnswerOutcome::Advanced)
    }

    /// Release the commit lock and reset the traversal to its entry point.
    pub fn settle(&mut self, success: bool) -> Result<(), NavigationError> {
        self.machine.apply(NavigatorEvent::CommitSettled)?;
        let action = if success {
            SessionAction::FinalizeSuccess
        } else {
            SessionAction::FinalizeFailure
        };
        self.reduce(action)
    }

    /// Undo the last forward step. Does nothing on an empty history.
    pub fn step_back(&mut self) -> Result<(), NavigationError> {
        self.ensure_traversing()?;
        self.reduce(SessionAction::StepBack)
    }

    /// Abandon the traversal and return to the entry point.
    pub fn reset(&mut self) -> Result<(), NavigationError> {
        self.ensure_traversing()?;
        self.reduce(SessionAction::Reset)
    }

    fn reduce(&mut self, action: SessionAction) -> Result<(), NavigationError> {
        let graph = self.graph.as_ref().ok_or(NavigationError::NoGraph)?;
        let state = self.state.as_mut().ok_or(NavigationError::NoGraph)?;
        state.reduce(graph, action)?;
        Ok(())
    }

    fn ensure_traversing(&self) -> Result<(), NavigationError> {
        match self.machine.phase() {
            NavigatorPhase::Traversing => Ok(()),
            NavigatorPhase::Idle => Err(NavigationError::NoGraph),
            NavigatorPhase::AwaitingCommit => Err(NavigationError::CommitInFlight),
        }
    }
}

/// Turn an answer into the draft value and the edge to follow.
fn resolve<'g>(
    node: &'g QuestionNode,
    answer: Answer,
    roster: &Roster,
) -> Result<(Value, &'g QuestionOption), NavigationError> {
    if answer.expected_type() != node.kind {
        return Err(NavigationError::AnswerMismatch {
            node: node.id,
            expected: node.kind,
        });
    }

    let value = match answer {
        Answer::Choice { option } => {
            let picked = node
                .options
                .get(option)
                .ok_or(NavigationError::UnknownOption {
                    node: node.id,
                    index: option,
                })?;
            return Ok((picked.value.clone(), picked));
        }
        Answer::Location { x, y } => {
            if x > 100 || y > 100 {
                return Err(NavigationError::InvalidAnswer(format!(
                    "location ({x}, {y}) is outside the picture"
                )));
            }
            json!({ "x": x, "y": y })
        }
        Answer::Player { player_id } => {
            let player = roster.player(player_id).ok_or_else(|| {
                NavigationError::InvalidAnswer(format!("player {player_id} is not in the game roster"))
            })?;
            json!({
                "id": player.id,
                "first_name": player.first_name,
                "last_name": player.last_name,
            })
        }
        Answer::Participants {
            on_ices,
            participations,
        } => {
            let selection = ParticipantSelection {
                on_ices,
                participations,
            };
            selection
                .validate(roster)
                .map_err(|err| NavigationError::InvalidAnswer(err.to_string()))?;
            json!({
                "on_ices": selection.on_ices,
                "participations": selection.participations,
            })
        }
    };

    let option = node.continuation().ok_or(NavigationError::UnknownOption {
        node: node.id,
        index: 0,
    })?;
    Ok((value, option))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{
        graph::tests::{choice, node, shot_catalog},
        roster::tests::first_line,
    };

    fn widget(id: NodeId, key: &str, kind: QuestionType, next: Option<NodeId>) -> QuestionNode {
        let mut question = node(
            id,
            key,
            vec![QuestionOption {
                value: Value::Null,
                label: String::new(),
                next_node_id: next,
                is_terminal: next.is_none(),
            }],
        );
        question.kind = kind;
        question
    }

    fn loaded(catalog: Vec<QuestionNode>) -> Navigator {
        let mut navigator = Navigator::new();
        navigator
            .load(Arc::new(QuestionGraph::load(catalog).unwrap()))
            .unwrap();
        navigator
    }

    fn player_catalog() -> Vec<QuestionNode> {
        vec![
            widget(1, "location", QuestionType::LocationPick, Some(2)),
            widget(2, "shooter", QuestionType::RosterPick, Some(3)),
            widget(3, "participants", QuestionType::ParticipantSet, Some(4)),
            node(4, "shot_result", vec![choice("Goal", None)]),
        ]
    }

    #[test]
    fn terminal_answer_completes_draft_and_locks_input() {
        let mut navigator = loaded(shot_catalog());
        let roster = Roster::default();

        assert_eq!(
            navigator.answer(Answer::Choice { option: 0 }, &roster).unwrap(),
            AnswerOutcome::Advanced
        );
        let outcome = navigator
            .answer(Answer::Choice { option: 0 }, &roster)
            .unwrap();

        let AnswerOutcome::Completed(draft) = outcome else {
            panic!("expected a completed draft");
        };
        let keys: Vec<&str> = draft.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["shot_result", "shot_type"]);
        assert_eq!(navigator.phase(), NavigatorPhase::AwaitingCommit);

        assert_eq!(
            navigator.answer(Answer::Choice { option: 1 }, &roster),
            Err(NavigationError::CommitInFlight)
        );
        assert_eq!(navigator.step_back(), Err(NavigationError::CommitInFlight));

        navigator.settle(true).unwrap();
        assert_eq!(navigator.phase(), NavigatorPhase::Traversing);
        assert!(navigator.state().unwrap().is_pristine());
    }

    #[test]
    fn failed_commit_also_returns_to_start() {
        let mut navigator = loaded(shot_catalog());
        let roster = Roster::default();
        navigator.answer(Answer::Choice { option: 1 }, &roster).unwrap();
        navigator.answer(Answer::Choice { option: 1 }, &roster).unwrap();

        navigator.settle(false).unwrap();
        assert!(navigator.state().unwrap().is_pristine());
        assert_eq!(navigator.current_node().unwrap().id, 1);
    }

    #[test]
    fn settle_without_commit_in_flight_is_rejected() {
        let mut navigator = loaded(shot_catalog());
        assert!(matches!(
            navigator.settle(true),
            Err(NavigationError::Transition(_))
        ));
    }

    #[test]
    fn idle_navigator_reports_no_graph() {
        let mut navigator = Navigator::new();
        assert_eq!(
            navigator.answer(Answer::Choice { option: 0 }, &Roster::default()),
            Err(NavigationError::NoGraph)
        );
        assert_eq!(navigator.reset(), Err(NavigationError::NoGraph));
        assert!(navigator.current_node().is_none());
    }

    #[test]
    fn answer_kind_must_match_question_type() {
        let mut navigator = loaded(shot_catalog());
        let err = navigator
            .answer(Answer::Location { x: 10, y: 10 }, &Roster::default())
            .unwrap_err();
        assert_eq!(
            err,
            NavigationError::AnswerMismatch {
                node: 1,
                expected: QuestionType::Choice
            }
        );
        assert!(navigator.state().unwrap().is_pristine());
    }

    #[test]
    fn unknown_option_index_is_rejected() {
        let mut navigator = loaded(shot_catalog());
        assert_eq!(
            navigator.answer(Answer::Choice { option: 5 }, &Roster::default()),
            Err(NavigationError::UnknownOption { node: 1, index: 5 })
        );
    }

    #[test]
    fn widget_answers_write_structured_values() {
        let mut navigator = loaded(player_catalog());
        let roster = first_line();

        navigator
            .answer(Answer::Location { x: 40, y: 75 }, &roster)
            .unwrap();
        navigator
            .answer(Answer::Player { player_id: 13 }, &roster)
            .unwrap();
        navigator
            .answer(
                Answer::Participants {
                    on_ices: vec![10, 13],
                    participations: vec![13],
                },
                &roster,
            )
            .unwrap();

        let draft = navigator.state().unwrap().draft().clone();
        assert_eq!(draft["location"], json!({ "x": 40, "y": 75 }));
        assert_eq!(draft["shooter"]["id"], json!(13));
        assert_eq!(
            draft["participants"],
            json!({ "on_ices": [10, 13], "participations": [13] })
        );
        assert_eq!(navigator.state().unwrap().history(), vec![1, 2, 3]);
    }

    #[test]
    fn widget_answers_are_validated() {
        let mut navigator = loaded(player_catalog());
        let roster = first_line();

        assert!(matches!(
            navigator.answer(Answer::Location { x: 101, y: 0 }, &roster),
            Err(NavigationError::InvalidAnswer(_))
        ));

        navigator
            .answer(Answer::Location { x: 0, y: 100 }, &roster)
            .unwrap();
        assert!(matches!(
            navigator.answer(Answer::Player { player_id: 99 }, &roster),
            Err(NavigationError::InvalidAnswer(_))
        ));

        navigator
            .answer(Answer::Player { player_id: 10 }, &roster)
            .unwrap();
        assert!(matches!(
            navigator.answer(
                Answer::Participants {
                    on_ices: vec![10],
                    participations: vec![11],
                },
                &roster,
            ),
            Err(NavigationError::InvalidAnswer(_))
        ));
        assert_eq!(navigator.state().unwrap().history().len(), 2);
    }

    #[test]
    fn step_back_and_reset_follow_the_reducer() {
        let mut navigator = loaded(shot_catalog());
        let roster = Roster::default();

        navigator.step_back().unwrap();
        assert!(navigator.state().unwrap().is_pristine());

        navigator.answer(Answer::Choice { option: 0 }, &roster).unwrap();
        navigator.step_back().unwrap();
        assert!(navigator.state().unwrap().is_pristine());

        navigator.answer(Answer::Choice { option: 0 }, &roster).unwrap();
        navigator.reset().unwrap();
        assert!(navigator.state().unwrap().is_pristine());
    }

    #[test]
    fn reload_replaces_previous_traversal() {
        let mut navigator = loaded(shot_catalog());
        navigator
            .answer(Answer::Choice { option: 0 }, &Roster::default())
            .unwrap();

        navigator
            .load(Arc::new(QuestionGraph::load(player_catalog()).unwrap()))
            .unwrap();
        assert_eq!(navigator.phase(), NavigatorPhase::Traversing);
        assert_eq!(navigator.current_node().unwrap().key, "location");

        navigator.close();
        assert_eq!(navigator.phase(), NavigatorPhase::Idle);
        assert!(navigator.graph().is_none());
    }
}
