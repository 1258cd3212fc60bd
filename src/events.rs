use crate::backend::{ChatReply, ChatRequest, HealthReport};
use crate::error::ChatError;
use crate::session::HealthStatus;

/// Inputs to the session state machine
#[derive(Debug, Clone)]
pub enum Event {
    /// The user submitted text from the composer or an example prompt
    Submit { text: String },

    /// The chat request numbered `seq` finished, one way or the other
    ChatResolved {
        seq: u64,
        outcome: Result<ChatReply, ChatError>,
    },

    /// The user asked for a fresh conversation
    ResetRequested,

    /// Something asked for the backend health to be re-checked
    ProbeRequested,

    /// Health probe number `probe` finished
    HealthResolved {
        probe: u64,
        result: Result<HealthReport, ChatError>,
    },
}

/// Work the state machine asks its owner to perform
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Issue `POST /api/chat` and report back with `Event::ChatResolved { seq, .. }`
    SendChat { seq: u64, request: ChatRequest },

    /// Issue `GET /api/health` and report back with `Event::HealthResolved { probe, .. }`
    ProbeHealth { probe: u64 },
}

/// Why a submission was turned away
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// Nothing left after trimming whitespace
    Empty,
    /// A chat request is already in flight
    Busy,
}

/// What a single event did to the session
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// User message appended, request `seq` is now in flight
    Accepted { seq: u64 },
    /// Submission refused; nothing changed
    Rejected(Rejection),
    /// Backend reply appended
    Answered,
    /// Synthesized error message appended
    Failed(ChatError),
    /// Log emptied
    Cleared,
    /// Reset will be applied when the in-flight request resolves
    ResetDeferred,
    /// Health probe requested
    ProbeIssued,
    /// Health status replaced
    HealthUpdated(HealthStatus),
    /// Completion for a request or probe that has been superseded; ignored
    Stale,
}

/// Result of feeding one event to the session
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub outcome: Outcome,
    pub effects: Vec<Effect>,
}

impl Transition {
    pub fn new(outcome: Outcome) -> Self {
        Self {
            outcome,
            effects: Vec::new(),
        }
    }

    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }
}
