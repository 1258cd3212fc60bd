//! Terminal client for the AI Doctor symptom-chat backend.
//!
//! The conversation core lives in [`session`] (state and transitions) and
//! [`manager`] (executing requests against a [`backend::ChatBackend`]). The
//! [`ui`] module is a ratatui front-end that only reads session state.

pub mod backend;
pub mod config;
pub mod conversation;
pub mod error;
pub mod events;
pub mod manager;
pub mod markup;
pub mod prompts;
pub mod session;
pub mod ui;

pub use backend::{ChatBackend, HttpBackend};
pub use config::Config;
pub use error::ChatError;
pub use manager::{ResetOutcome, SessionManager, SubmitOutcome};
pub use session::{HealthStatus, RequestState, Session, SessionId};
