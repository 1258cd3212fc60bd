//! Conversation UI components for the consultation screen

pub mod commands;
pub mod composer;
pub mod history;
pub mod manager;
pub mod typing;

pub use commands::{get_help_text, ParsedCommand, SlashCommand};
pub use composer::{ComposerResult, ConversationComposer};
pub use history::ConversationHistory;
pub use manager::{ConversationAction, ConversationView};
pub use typing::TypingIndicator;
