use crate::backend::ChatBackend;
use crate::error::ChatError;
use crate::events::{Effect, Event, Outcome, Rejection, Transition};
use crate::session::{HealthStatus, Session};
use std::sync::Arc;
use tokio::sync::mpsc;

/// How a `submit` call ended
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// Nothing was sent and nothing changed
    Rejected(Rejection),
    /// The backend's reply was appended
    Answered,
    /// A synthesized error message was appended
    Failed(ChatError),
}

/// How a `reset_conversation` call ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetOutcome {
    Cleared,
    /// A request is in flight; the log is cleared once it resolves
    Deferred,
}

/// Owns one conversation session and mediates every request it makes.
///
/// Effects can run inline (`submit`, `probe_health` await the backend) or
/// detached (`*_detached` spawn the request and report back over a channel,
/// which the owner drains through [`SessionManager::dispatch`]).
pub struct SessionManager {
    session: Session,
    backend: Arc<dyn ChatBackend>,
}

impl SessionManager {
    pub fn new(backend: Arc<dyn ChatBackend>) -> Self {
        let session = Session::new(backend.location());
        tracing::info!(
            session_id = %session.id(),
            backend = %session.backend_location(),
            "Started conversation session"
        );
        Self { session, backend }
    }

    /// Start a session and wait for its first health probe
    pub async fn init_session(backend: Arc<dyn ChatBackend>) -> Self {
        let mut manager = Self::new(backend);
        manager.probe_health().await;
        manager
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Apply an event that arrived from elsewhere, typically a detached request
    pub fn dispatch(&mut self, event: Event) -> Transition {
        self.session.apply(event)
    }

    /// Submit user text and wait for the exchange to finish.
    ///
    /// Backend failures are absorbed into the log; they never surface as `Err`.
    pub async fn submit(&mut self, text: &str) -> SubmitOutcome {
        let transition = self.session.apply(Event::Submit {
            text: text.to_string(),
        });
        if let Outcome::Rejected(reason) = transition.outcome {
            tracing::debug!(?reason, "Submission rejected");
            return SubmitOutcome::Rejected(reason);
        }

        let mut result = SubmitOutcome::Answered;
        for outcome in self.run_inline(transition.effects).await {
            match outcome {
                Outcome::Answered => result = SubmitOutcome::Answered,
                Outcome::Failed(err) => result = SubmitOutcome::Failed(err),
                _ => {}
            }
        }
        result
    }

    /// Probe backend health and wait for the answer
    pub async fn probe_health(&mut self) -> HealthStatus {
        let transition = self.session.apply(Event::ProbeRequested);
        self.run_inline(transition.effects).await;
        self.session.health()
    }

    /// Clear the conversation, or schedule the clear if a request is in flight
    pub fn reset_conversation(&mut self) -> ResetOutcome {
        match self.session.apply(Event::ResetRequested).outcome {
            Outcome::ResetDeferred => ResetOutcome::Deferred,
            _ => ResetOutcome::Cleared,
        }
    }

    /// Submit without waiting; the completion arrives on `tx`
    pub fn submit_detached(&mut self, text: &str, tx: &mpsc::UnboundedSender<Event>) -> Outcome {
        let transition = self.session.apply(Event::Submit {
            text: text.to_string(),
        });
        self.spawn_effects(transition.effects, tx);
        transition.outcome
    }

    /// Probe health without waiting; the result arrives on `tx`
    pub fn probe_health_detached(&mut self, tx: &mpsc::UnboundedSender<Event>) {
        let transition = self.session.apply(Event::ProbeRequested);
        self.spawn_effects(transition.effects, tx);
    }

    fn spawn_effects(&self, effects: Vec<Effect>, tx: &mpsc::UnboundedSender<Event>) {
        for effect in effects {
            let backend = Arc::clone(&self.backend);
            let tx = tx.clone();
            tokio::spawn(async move {
                let event = perform(backend.as_ref(), effect).await;
                // The receiver is gone only when the UI is shutting down
                let _ = tx.send(event);
            });
        }
    }

    async fn run_inline(&mut self, effects: Vec<Effect>) -> Vec<Outcome> {
        let mut outcomes = Vec::with_capacity(effects.len());
        for effect in effects {
            let event = perform(self.backend.as_ref(), effect).await;
            let transition = self.session.apply(event);
            outcomes.push(transition.outcome);
        }
        outcomes
    }
}

/// Carry out one effect against the backend and describe its result as an event
pub async fn perform(backend: &dyn ChatBackend, effect: Effect) -> Event {
    match effect {
        Effect::SendChat { seq, request } => {
            let outcome = backend.chat(&request).await;
            match &outcome {
                Ok(_) => tracing::info!(seq, "Chat request answered"),
                Err(err) => tracing::warn!(seq, error = %err, "Chat request failed"),
            }
            Event::ChatResolved { seq, outcome }
        }
        Effect::ProbeHealth { probe } => Event::HealthResolved {
            probe,
            result: backend.health().await,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{ChatReply, ChatRequest, HealthReport};
    use crate::conversation::Role;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::time::Duration;

    /// Backend that returns queued answers and records what it was sent
    struct MockBackend {
        replies: Mutex<VecDeque<Result<ChatReply, ChatError>>>,
        health: Mutex<VecDeque<(Duration, Result<HealthReport, ChatError>)>>,
        requests: Mutex<Vec<ChatRequest>>,
    }

    impl MockBackend {
        fn new() -> Self {
            Self {
                replies: Mutex::new(VecDeque::new()),
                health: Mutex::new(VecDeque::new()),
                requests: Mutex::new(Vec::new()),
            }
        }

        fn queue_reply(self, reply: Result<ChatReply, ChatError>) -> Self {
            self.replies.lock().unwrap().push_back(reply);
            self
        }

        fn queue_health(self, report: Result<HealthReport, ChatError>) -> Self {
            self.queue_slow_health(Duration::ZERO, report)
        }

        fn queue_slow_health(self, delay: Duration, report: Result<HealthReport, ChatError>) -> Self {
            self.health.lock().unwrap().push_back((delay, report));
            self
        }

        fn recorded_requests(&self) -> Vec<ChatRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ChatBackend for MockBackend {
        async fn chat(&self, request: &ChatRequest) -> Result<ChatReply, ChatError> {
            self.requests.lock().unwrap().push(request.clone());
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(ChatError::Unreachable("no mock reply queued".into())))
        }

        async fn health(&self) -> Result<HealthReport, ChatError> {
            let next = self.health.lock().unwrap().pop_front();
            let Some((delay, report)) = next else {
                return Err(ChatError::Unreachable("no mock health queued".into()));
            };
            tokio::time::sleep(delay).await;
            report
        }

        fn location(&self) -> &str {
            "http://localhost:8000"
        }
    }

    fn healthy(count: u64) -> HealthReport {
        HealthReport {
            status: "healthy".into(),
            total_documents: Some(count),
            embeddings_loaded: Some(true),
            version: Some("1.0.0".into()),
        }
    }

    #[tokio::test]
    async fn init_session_probes_health() {
        let backend = Arc::new(MockBackend::new().queue_health(Ok(healthy(42))));
        let manager = SessionManager::init_session(backend).await;

        assert_eq!(
            manager.session().health(),
            HealthStatus::Healthy {
                total_documents: Some(42)
            }
        );
        assert!(manager.session().log().is_empty());
    }

    #[tokio::test]
    async fn init_session_marks_unreachable_backend_offline() {
        let manager = SessionManager::init_session(Arc::new(MockBackend::new())).await;
        assert_eq!(manager.session().health(), HealthStatus::Offline);
    }

    #[tokio::test]
    async fn submit_round_trip() {
        let backend = Arc::new(MockBackend::new().queue_reply(Ok(
            ChatReply::new("Try resting and hydration.").with_context(vec!["Flu overview".into()]),
        )));
        let mut manager = SessionManager::new(backend.clone());

        let outcome = manager.submit("I have a fever").await;

        assert_eq!(outcome, SubmitOutcome::Answered);
        let log = manager.session().log();
        assert_eq!(log.len(), 2);
        assert_eq!(log.messages()[0].role, Role::User);
        assert_eq!(log.messages()[1].content, "Try resting and hydration.");
        assert_eq!(log.messages()[1].context_used, vec!["Flu overview".to_string()]);
        assert!(!manager.session().is_busy());

        let requests = backend.recorded_requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].session_id, manager.session().id().as_str());
    }

    #[tokio::test]
    async fn submit_failure_is_absorbed() {
        let backend = Arc::new(MockBackend::new().queue_reply(Err(ChatError::Server {
            status: 500,
            detail: Some("Error processing chat request: boom".into()),
        })));
        let mut manager = SessionManager::new(backend);

        let outcome = manager.submit("I have a fever").await;

        assert!(matches!(outcome, SubmitOutcome::Failed(ChatError::Server { status: 500, .. })));
        let last = manager.session().log().last().unwrap();
        assert!(last.is_error);
        assert_eq!(last.content, "Server error: Error processing chat request: boom");
        assert!(!manager.session().is_busy());
    }

    #[tokio::test]
    async fn empty_submit_sends_nothing() {
        let backend = Arc::new(MockBackend::new());
        let mut manager = SessionManager::new(backend.clone());

        let outcome = manager.submit("   ").await;

        assert_eq!(outcome, SubmitOutcome::Rejected(Rejection::Empty));
        assert!(backend.recorded_requests().is_empty());
        assert!(manager.session().log().is_empty());
    }

    #[tokio::test]
    async fn detached_submit_gates_until_dispatched() {
        let backend = Arc::new(MockBackend::new().queue_reply(Ok(ChatReply::new("Rest."))));
        let mut manager = SessionManager::new(backend.clone());
        let (tx, mut rx) = mpsc::unbounded_channel();

        let first = manager.submit_detached("I have a cough", &tx);
        assert!(matches!(first, Outcome::Accepted { .. }));
        let second = manager.submit_detached("and a fever", &tx);
        assert_eq!(second, Outcome::Rejected(Rejection::Busy));
        assert_eq!(manager.reset_conversation(), ResetOutcome::Deferred);

        let event = rx.recv().await.unwrap();
        assert_eq!(manager.dispatch(event).outcome, Outcome::Answered);
        assert!(manager.session().log().is_empty());
        assert!(!manager.session().is_busy());
        assert_eq!(backend.recorded_requests().len(), 1);
    }

    #[tokio::test]
    async fn detached_probe_reports_back() {
        let backend = Arc::new(MockBackend::new().queue_health(Ok(HealthReport {
            status: "degraded".into(),
            total_documents: Some(0),
            embeddings_loaded: Some(false),
            version: None,
        })));
        let mut manager = SessionManager::new(backend);
        let (tx, mut rx) = mpsc::unbounded_channel();

        manager.probe_health_detached(&tx);
        let event = rx.recv().await.unwrap();
        manager.dispatch(event);

        assert_eq!(manager.session().health(), HealthStatus::Degraded);
        assert_eq!(manager.session().health().label(), "Limited");
    }

    #[tokio::test]
    async fn slow_earlier_probe_does_not_win() {
        let backend = Arc::new(
            MockBackend::new()
                .queue_slow_health(Duration::from_millis(200), Ok(healthy(1)))
                .queue_health(Err(ChatError::Unreachable("connection refused".into()))),
        );
        let mut manager = SessionManager::new(backend);
        let (tx, mut rx) = mpsc::unbounded_channel();

        manager.probe_health_detached(&tx);
        manager.probe_health_detached(&tx);

        let newer = rx.recv().await.unwrap();
        manager.dispatch(newer);
        assert_eq!(manager.session().health(), HealthStatus::Offline);

        let older = rx.recv().await.unwrap();
        assert_eq!(manager.dispatch(older).outcome, Outcome::Stale);
        assert_eq!(manager.session().health(), HealthStatus::Offline);
    }
}
