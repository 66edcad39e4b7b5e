use thiserror::Error;

/// High-level phases of the navigator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigatorPhase {
    /// No question graph is loaded; nothing can be answered.
    Idle,
    /// A traversal is in progress and accepts answers.
    Traversing,
    /// A completed draft is being persisted; input is locked until it settles.
    AwaitingCommit,
}

impl NavigatorPhase {
    /// Stable name used in API projections and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            NavigatorPhase::Idle => "idle",
            NavigatorPhase::Traversing => "traversing",
            NavigatorPhase::AwaitingCommit => "awaiting_commit",
        }
    }
}

/// Events that can be applied to the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigatorEvent {
    /// A validated graph was installed for a new session.
    GraphLoaded,
    /// A terminal option was answered and the draft handed to the submitter.
    TerminalAnswered,
    /// The in-flight commit finished, successfully or not.
    CommitSettled,
    /// The session was closed or replaced.
    Closed,
}

/// Error returned when attempting to apply an invalid transition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid transition: {event:?} cannot be applied while in {from:?}")]
pub struct InvalidTransition {
    /// The phase the state machine was in when the invalid event was received.
    pub from: NavigatorPhase,
    /// The event that cannot be applied from this phase.
    pub event: NavigatorEvent,
}

/// Snapshot of the current state machine state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Snapshot {
    /// Current phase of the state machine.
    pub phase: NavigatorPhase,
    /// Version number of the state machine (increments on each transition).
    pub version: usize,
}

/// State machine gating which navigator operations are allowed.
#[derive(Debug, Clone)]
pub struct PhaseMachine {
    phase: NavigatorPhase,
    version: usize,
}

impl Default for PhaseMachine {
    fn default() -> Self {
        Self {
            phase: NavigatorPhase::Idle,
            version: 0,
        }
    }
}

impl PhaseMachine {
    /// Create a new state machine initialised in the idle state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inspect the current phase.
    pub fn phase(&self) -> NavigatorPhase {
        self.phase
    }

    /// Create a snapshot of the current state machine state.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            phase: self.phase,
            version: self.version,
        }
    }

    /// Apply an event, returning the new phase.
    pub fn apply(&mut self, event: NavigatorEvent) -> Result<NavigatorPhase, InvalidTransition> {
        let next = self.compute_transition(event)?;
        self.phase = next;
        self.version += 1;
        Ok(next)
    }

    /// Compute a transition from an event if the transition is valid.
    fn compute_transition(&self, event: NavigatorEvent) -> Result<NavigatorPhase, InvalidTransition> {
        let next = match (self.phase, event) {
            (NavigatorPhase::Idle, NavigatorEvent::GraphLoaded) => NavigatorPhase::Traversing,
            (NavigatorPhase::Traversing, NavigatorEvent::TerminalAnswered) => {
                NavigatorPhase::AwaitingCommit
            }
            (NavigatorPhase::AwaitingCommit, NavigatorEvent::CommitSettled) => {
                NavigatorPhase::Traversing
            }
            (_, NavigatorEvent::Closed) => NavigatorPhase::Idle,
            (from, event) => return Err(InvalidTransition { from, event }),
        };

        Ok(next)
    }
}
