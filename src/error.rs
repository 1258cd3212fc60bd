//! Failure taxonomy for backend exchanges

use crate::prompts;
use thiserror::Error;

/// Why a chat exchange or health probe did not produce a usable answer.
///
/// Every variant is terminal for the one request attempt; nothing here is
/// retried automatically.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChatError {
    /// The server answered with a non-success status
    #[error("server responded with status {status}")]
    Server { status: u16, detail: Option<String> },

    /// DNS failure, connection refused, or any other transport problem
    #[error("backend unreachable: {0}")]
    Unreachable(String),

    /// No answer within the configured budget
    #[error("request timed out")]
    Timeout,

    /// The answer did not have the expected shape
    #[error("malformed response: {0}")]
    Malformed(String),
}

impl ChatError {
    /// True when the server itself produced the failure
    pub fn is_server_reported(&self) -> bool {
        matches!(self, ChatError::Server { .. })
    }

    /// Text shown to the user in place of a reply.
    ///
    /// Server-reported failures surface the server's `detail` verbatim;
    /// everything else points the user at the backend location.
    pub fn diagnostic(&self, backend_location: &str) -> String {
        match self {
            ChatError::Server { detail, .. } => prompts::server_error(detail.as_deref()),
            ChatError::Unreachable(_) | ChatError::Timeout | ChatError::Malformed(_) => {
                prompts::unreachable_guidance(backend_location)
            }
        }
    }
}

impl From<reqwest::Error> for ChatError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ChatError::Timeout
        } else if err.is_decode() {
            ChatError::Malformed(err.to_string())
        } else if let Some(status) = err.status() {
            ChatError::Server {
                status: status.as_u16(),
                detail: None,
            }
        } else {
            ChatError::Unreachable(err.to_string())
        }
    }
}
