//! HTTP contract of the chat backend and the reqwest client that speaks it

use crate::config::Config;
use crate::conversation::HistoryEntry;
use crate::error::ChatError;
use crate::session::HealthStatus;
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const CHAT_PATH: &str = "/api/chat";
pub const HEALTH_PATH: &str = "/api/health";

/// Body of `POST /api/chat`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    pub session_id: String,
    pub conversation_history: Vec<HistoryEntry>,
}

/// Successful answer of `POST /api/chat`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatReply {
    pub reply: String,
    #[serde(default)]
    pub context_used: Option<Vec<String>>,
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
}

impl ChatReply {
    pub fn new(reply: impl Into<String>) -> Self {
        Self {
            reply: reply.into(),
            context_used: None,
            session_id: None,
            timestamp: None,
        }
    }

    pub fn with_context(mut self, context: Vec<String>) -> Self {
        self.context_used = Some(context);
        self
    }
}

/// Answer of `GET /api/health`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthReport {
    pub status: String,
    #[serde(default)]
    pub total_documents: Option<u64>,
    #[serde(default)]
    pub embeddings_loaded: Option<bool>,
    #[serde(default)]
    pub version: Option<String>,
}

impl HealthReport {
    /// Map the reported status string onto the client's view of backend health
    pub fn health_status(&self) -> HealthStatus {
        if self.status == "healthy" {
            HealthStatus::Healthy {
                total_documents: self.total_documents,
            }
        } else {
            HealthStatus::Degraded
        }
    }
}

/// Error body the backend sends alongside non-2xx statuses
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    detail: Option<serde_json::Value>,
}

impl ErrorBody {
    fn detail_text(self) -> Option<String> {
        match self.detail? {
            serde_json::Value::String(text) => Some(text),
            serde_json::Value::Null => None,
            other => Some(other.to_string()),
        }
    }
}

/// The backend as the session manager sees it.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Run one chat exchange
    async fn chat(&self, request: &ChatRequest) -> Result<ChatReply, ChatError>;

    /// Probe backend health
    async fn health(&self) -> Result<HealthReport, ChatError>;

    /// Human-readable location of the backend, used in guidance messages
    fn location(&self) -> &str;
}

/// reqwest-based backend client
#[derive(Clone)]
pub struct HttpBackend {
    base_url: String,
    client: reqwest::Client,
    health_timeout: Duration,
}

impl HttpBackend {
    pub fn new(config: &Config) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.chat_timeout())
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            client,
            health_timeout: config.health_timeout(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn server_error(response: reqwest::Response) -> ChatError {
        let status = response.status().as_u16();
        let detail = response
            .json::<ErrorBody>()
            .await
            .ok()
            .and_then(ErrorBody::detail_text);
        ChatError::Server { status, detail }
    }
}

#[async_trait]
impl ChatBackend for HttpBackend {
    async fn chat(&self, request: &ChatRequest) -> Result<ChatReply, ChatError> {
        let url = self.endpoint(CHAT_PATH);
        tracing::debug!(
            %url,
            session_id = %request.session_id,
            history_len = request.conversation_history.len(),
            "Sending chat request"
        );

        let response = self.client.post(&url).json(request).send().await?;

        if !response.status().is_success() {
            return Err(Self::server_error(response).await);
        }

        Ok(response.json::<ChatReply>().await?)
    }

    async fn health(&self) -> Result<HealthReport, ChatError> {
        let url = self.endpoint(HEALTH_PATH);
        let response = self
            .client
            .get(&url)
            .timeout(self.health_timeout)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::server_error(response).await);
        }

        Ok(response.json::<HealthReport>().await?)
    }

    fn location(&self) -> &str {
        &self.base_url
    }
}
