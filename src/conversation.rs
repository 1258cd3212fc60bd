//! Conversation log and the history projection sent to the backend

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Role in conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single entry in the conversation log
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub role: Role,
    pub content: String,
    /// Set when the message is a locally synthesized error report
    pub is_error: bool,
    /// Snippets the backend reports having used for this reply
    pub context_used: Vec<String>,
    pub timestamp: DateTime<Local>,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content.into())
    }

    pub fn assistant(content: impl Into<String>, context_used: Vec<String>) -> Self {
        Self {
            context_used,
            ..Self::new(Role::Assistant, content.into())
        }
    }

    pub fn error(content: impl Into<String>) -> Self {
        Self {
            is_error: true,
            ..Self::new(Role::Assistant, content.into())
        }
    }

    fn new(role: Role, content: String) -> Self {
        Self {
            role,
            content,
            is_error: false,
            context_used: Vec::new(),
            timestamp: Local::now(),
        }
    }

    /// Minimal `{role, content}` view of this message
    pub fn to_history_entry(&self) -> HistoryEntry {
        HistoryEntry {
            role: self.role,
            content: self.content.clone(),
        }
    }
}

/// Wire projection of a message, as carried in `conversation_history`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub role: Role,
    pub content: String,
}

impl From<HistoryEntry> for Message {
    fn from(entry: HistoryEntry) -> Self {
        Message::new(entry.role, entry.content)
    }
}

/// Ordered, append-only record of exchanged messages.
///
/// `clear` is the only bulk mutation; it is reached through a conversation
/// reset and nowhere else.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConversationLog {
    messages: Vec<Message>,
}

impl ConversationLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a log from a history projection
    pub fn from_history(entries: impl IntoIterator<Item = HistoryEntry>) -> Self {
        Self {
            messages: entries.into_iter().map(Message::from).collect(),
        }
    }

    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Project the log to `{role, content}` pairs, dropping error flags,
    /// context annotations and timestamps.
    pub fn history(&self) -> Vec<HistoryEntry> {
        self.messages.iter().map(Message::to_history_entry).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn history_drops_transient_fields() {
        let mut log = ConversationLog::new();
        log.push(Message::user("I have a headache"));
        log.push(Message::assistant(
            "How long has it lasted?",
            vec!["Migraine overview".to_string()],
        ));
        log.push(Message::error("Server error: Unknown error"));

        let history = log.history();
        assert_eq!(history.len(), 3);
        assert_eq!(history[0].role, Role::User);
        assert_eq!(history[1].content, "How long has it lasted?");
        assert_eq!(history[2].role, Role::Assistant);

        let json = serde_json::to_value(&history[2]).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"role": "assistant", "content": "Server error: Unknown error"})
        );
    }

    #[test]
    fn from_history_restores_role_and_content() {
        let mut log = ConversationLog::new();
        log.push(Message::user("I feel dizzy"));
        log.push(Message::assistant("Are you also nauseous?", vec!["Vertigo".into()]));

        let rebuilt = ConversationLog::from_history(log.history());
        assert_eq!(rebuilt.history(), log.history());
        assert!(rebuilt.messages()[1].context_used.is_empty());
        assert!(!rebuilt.messages()[1].is_error);
    }

    #[test]
    fn role_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Role::User).unwrap(), "\"user\"");
        let role: Role = serde_json::from_str("\"assistant\"").unwrap();
        assert_eq!(role, Role::Assistant);
    }
}
