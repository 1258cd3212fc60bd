//! Conversation session state and its transition function.
//!
//! `Session::apply` is the only way the session changes. It performs no I/O:
//! network work is handed back to the caller as [`Effect`]s, and the results
//! come back in as [`Event`]s.

use crate::backend::{ChatReply, ChatRequest, HealthReport};
use crate::conversation::{ConversationLog, Message};
use crate::error::ChatError;
use crate::events::{Effect, Event, Outcome, Rejection, Transition};
use chrono::{DateTime, Utc};
use std::fmt;
use uuid::Uuid;

/// Opaque correlation token sent with every chat request
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionId(String);

impl SessionId {
    /// Clock component plus random component, e.g. `session_1732960800000_3f9a0c2e1`
    pub fn generate() -> Self {
        let millis = Utc::now().timestamp_millis();
        let random = Uuid::new_v4().simple().to_string();
        Self(format!("session_{}_{}", millis, &random[..9]))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Admission gate for chat requests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RequestState {
    #[default]
    Idle,
    InFlight {
        seq: u64,
    },
}

/// Backend availability as of the latest health probe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HealthStatus {
    #[default]
    Unknown,
    Healthy {
        total_documents: Option<u64>,
    },
    Degraded,
    Offline,
}

impl HealthStatus {
    /// Short badge text for the header and the `health` command
    pub fn label(&self) -> String {
        match self {
            HealthStatus::Unknown => "Checking...".to_string(),
            HealthStatus::Healthy {
                total_documents: Some(count),
            } => format!("Online ({} conditions)", count),
            HealthStatus::Healthy {
                total_documents: None,
            } => "Online".to_string(),
            HealthStatus::Degraded => "Limited".to_string(),
            HealthStatus::Offline => "Offline".to_string(),
        }
    }

    pub fn is_healthy(&self) -> bool {
        matches!(self, HealthStatus::Healthy { .. })
    }
}

/// One continuous conversation with the backend
#[derive(Debug, Clone)]
pub struct Session {
    id: SessionId,
    created_at: DateTime<Utc>,
    backend_location: String,
    log: ConversationLog,
    request_state: RequestState,
    health: HealthStatus,
    next_seq: u64,
    next_probe: u64,
    /// Newest probe whose result has been applied
    applied_probe: u64,
    reset_pending: bool,
}

impl Session {
    pub fn new(backend_location: impl Into<String>) -> Self {
        Self::with_id(SessionId::generate(), backend_location)
    }

    pub fn with_id(id: SessionId, backend_location: impl Into<String>) -> Self {
        Self {
            id,
            created_at: Utc::now(),
            backend_location: backend_location.into(),
            log: ConversationLog::new(),
            request_state: RequestState::Idle,
            health: HealthStatus::Unknown,
            next_seq: 1,
            next_probe: 1,
            applied_probe: 0,
            reset_pending: false,
        }
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn backend_location(&self) -> &str {
        &self.backend_location
    }

    pub fn log(&self) -> &ConversationLog {
        &self.log
    }

    pub fn request_state(&self) -> RequestState {
        self.request_state
    }

    pub fn health(&self) -> HealthStatus {
        self.health
    }

    pub fn is_busy(&self) -> bool {
        matches!(self.request_state, RequestState::InFlight { .. })
    }

    pub fn reset_pending(&self) -> bool {
        self.reset_pending
    }

    /// Feed one event through the state machine
    pub fn apply(&mut self, event: Event) -> Transition {
        let transition = match event {
            Event::Submit { text } => self.on_submit(&text),
            Event::ChatResolved { seq, outcome } => self.on_chat_resolved(seq, outcome),
            Event::ResetRequested => self.on_reset(),
            Event::ProbeRequested => self.on_probe(),
            Event::HealthResolved { probe, result } => self.on_health(probe, result),
        };

        tracing::debug!(
            session_id = %self.id,
            outcome = ?transition.outcome,
            state = ?self.request_state,
            messages = self.log.len(),
            "Applied session event"
        );
        transition
    }

    fn on_submit(&mut self, text: &str) -> Transition {
        let text = text.trim();
        if text.is_empty() {
            return Transition::new(Outcome::Rejected(Rejection::Empty));
        }
        if self.is_busy() {
            return Transition::new(Outcome::Rejected(Rejection::Busy));
        }

        // History is the log as it stood before this message
        let conversation_history = self.log.history();
        self.log.push(Message::user(text));

        let seq = self.next_seq;
        self.next_seq += 1;
        self.request_state = RequestState::InFlight { seq };

        let request = ChatRequest {
            message: text.to_string(),
            session_id: self.id.to_string(),
            conversation_history,
        };

        Transition::new(Outcome::Accepted { seq }).with_effect(Effect::SendChat { seq, request })
    }

    fn on_chat_resolved(&mut self, seq: u64, outcome: Result<ChatReply, ChatError>) -> Transition {
        match self.request_state {
            RequestState::InFlight { seq: current } if current == seq => {}
            _ => {
                tracing::warn!(session_id = %self.id, seq, "Ignoring completion for a request that is not in flight");
                return Transition::new(Outcome::Stale);
            }
        }

        let result = match outcome {
            Ok(reply) => {
                self.log.push(Message::assistant(
                    reply.reply,
                    reply.context_used.unwrap_or_default(),
                ));
                Outcome::Answered
            }
            Err(err) => {
                tracing::warn!(session_id = %self.id, seq, error = %err, "Chat request failed");
                self.log
                    .push(Message::error(err.diagnostic(&self.backend_location)));
                Outcome::Failed(err)
            }
        };
        self.request_state = RequestState::Idle;

        if self.reset_pending {
            self.reset_pending = false;
            self.log.clear();
            tracing::info!(session_id = %self.id, "Applied deferred conversation reset");
        }

        Transition::new(result)
    }

    fn on_reset(&mut self) -> Transition {
        if self.is_busy() {
            self.reset_pending = true;
            return Transition::new(Outcome::ResetDeferred);
        }

        self.log.clear();
        Transition::new(Outcome::Cleared)
    }

    fn on_probe(&mut self) -> Transition {
        let probe = self.next_probe;
        self.next_probe += 1;
        Transition::new(Outcome::ProbeIssued).with_effect(Effect::ProbeHealth { probe })
    }

    fn on_health(&mut self, probe: u64, result: Result<HealthReport, ChatError>) -> Transition {
        if probe <= self.applied_probe {
            tracing::debug!(probe, applied = self.applied_probe, "Ignoring result of a superseded health probe");
            return Transition::new(Outcome::Stale);
        }
        self.applied_probe = probe;

        self.health = match result {
            Ok(report) => report.health_status(),
            Err(err) => {
                tracing::warn!(error = %err, "Health probe failed");
                HealthStatus::Offline
            }
        };
        Transition::new(Outcome::HealthUpdated(self.health))
    }
}
