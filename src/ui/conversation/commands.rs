use std::str::FromStr;

use strum::{AsRefStr, EnumIter, EnumString, IntoEnumIterator, IntoStaticStr};

use crate::prompts::{self, EXAMPLE_PROMPTS};

/// Commands that can be invoked by starting a message with a leading slash.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumString, EnumIter, AsRefStr, IntoStaticStr,
)]
#[strum(serialize_all = "kebab-case")]
pub enum SlashCommand {
    /// Start a new consultation
    New,
    /// Send one of the example symptom descriptions
    Example,
    /// Re-check the backend status
    Health,
    /// Toggle the medical context list under replies
    Context,
    /// Show help
    Help,
    /// Exit the application
    Bye,
}

pub fn command_entries() -> Vec<CommandEntry> {
    SlashCommand::iter()
        .map(|command| CommandEntry {
            command,
            keyword: command.command(),
            description: command.description(),
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCommand {
    pub command: SlashCommand,
    pub argument: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandEntry {
    pub command: SlashCommand,
    pub keyword: &'static str,
    pub description: &'static str,
}

impl ParsedCommand {
    pub fn argument(&self) -> Option<&str> {
        self.argument.as_deref()
    }

    /// The example prompt selected by `/example N`
    pub fn example_prompt(&self) -> Option<&'static str> {
        if self.command != SlashCommand::Example {
            return None;
        }

        let number = self.argument()?.trim().parse::<usize>().ok()?;
        prompts::example_prompt(number)
    }
}

impl SlashCommand {
    /// User-visible description shown in help.
    pub fn description(self) -> &'static str {
        match self {
            SlashCommand::New => "start a new consultation (clears the conversation)",
            SlashCommand::Example => "send an example prompt, e.g. /example 2",
            SlashCommand::Health => "check whether the backend is online",
            SlashCommand::Context => "show or hide the medical context used for replies",
            SlashCommand::Help => "show available commands",
            SlashCommand::Bye => "exit the application",
        }
    }

    /// Command string without the leading '/'.
    pub fn command(self) -> &'static str {
        self.into()
    }

    /// Whether this command does anything useful while a reply is pending.
    pub fn available_while_busy(self) -> bool {
        !matches!(self, SlashCommand::Example)
    }
}

/// Parse a slash command from user input
pub fn parse_slash_command(input: &str) -> Option<ParsedCommand> {
    let body = input.trim().strip_prefix('/')?;

    let mut parts = body.split_whitespace();
    let head = parts.next()?;
    let rest: Vec<&str> = parts.collect();

    let command = SlashCommand::from_str(head).ok().or_else(|| match head.to_lowercase().as_str() {
        "q" | "quit" | "exit" => Some(SlashCommand::Bye),
        "reset" | "clear" => Some(SlashCommand::New),
        "ex" | "e" => Some(SlashCommand::Example),
        "status" => Some(SlashCommand::Health),
        "h" | "?" => Some(SlashCommand::Help),
        _ => None,
    })?;

    let argument = if rest.is_empty() {
        None
    } else {
        Some(rest.join(" "))
    };

    Some(ParsedCommand { command, argument })
}

/// Get help text for all available commands
pub fn get_help_text() -> String {
    let mut help = String::from("Available commands:\n");
    for entry in command_entries() {
        help.push_str(&format!("/{} - {}\n", entry.keyword, entry.description));
    }

    help.push_str("\nExample prompts:\n");
    for (index, prompt) in EXAMPLE_PROMPTS.iter().enumerate() {
        help.push_str(&format!("  {}. {}\n", index + 1, prompt));
    }
    help.push_str("\nAliases: /q for /bye, /reset for /new, /ex for /example, /status for /health");

    help
}
