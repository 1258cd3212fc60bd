use crate::config::Config;
use crate::events::{Event, Outcome, Rejection};
use crate::manager::{ResetOutcome, SessionManager};
use crate::prompts;
use crate::ui::conversation::{
    get_help_text, ComposerResult, ConversationComposer, ConversationHistory, ParsedCommand,
    SlashCommand, TypingIndicator,
};
use crate::ui::status::StatusBar;
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{
    layout::{Constraint, Direction, Layout},
    style::{Color, Style},
    text::{Line, Span},
    Frame,
};
use tokio::sync::mpsc;

/// Actions that can be requested by the conversation view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversationAction {
    None,
    Exit,
}

/// Connects the terminal widgets to the session manager.
///
/// Key presses become session events; backend completions arrive through
/// `handle_session_event`. Rendering only reads state.
pub struct ConversationView {
    manager: SessionManager,
    history: ConversationHistory,
    composer: ConversationComposer,
    typing: TypingIndicator,
    events_tx: mpsc::UnboundedSender<Event>,
    confirm_reset: bool,
    awaiting_reset_confirmation: bool,
}

impl ConversationView {
    pub fn new(manager: SessionManager, config: &Config, events_tx: mpsc::UnboundedSender<Event>) -> Self {
        let mut composer = ConversationComposer::new(prompts::COMPOSER_PLACEHOLDER);
        composer.set_focus(true);

        Self {
            manager,
            history: ConversationHistory::new(config.ui.show_context),
            composer,
            typing: TypingIndicator::new(),
            events_tx,
            confirm_reset: config.ui.confirm_reset,
            awaiting_reset_confirmation: false,
        }
    }

    /// Kick off the initial health probe
    pub fn start(&mut self) {
        self.manager.probe_health_detached(&self.events_tx);
    }

    pub fn manager(&self) -> &SessionManager {
        &self.manager
    }

    pub fn composer(&self) -> &ConversationComposer {
        &self.composer
    }

    pub fn history(&self) -> &ConversationHistory {
        &self.history
    }

    /// Handle key input
    pub fn handle_key(&mut self, key: KeyEvent) -> ConversationAction {
        if key.kind != KeyEventKind::Press {
            return ConversationAction::None;
        }

        match (key.code, key.modifiers) {
            (KeyCode::Char('c'), KeyModifiers::CONTROL) => return ConversationAction::Exit,
            (KeyCode::PageUp, _) => {
                self.history.scroll_up(5);
                return ConversationAction::None;
            }
            (KeyCode::PageDown, _) => {
                self.history.scroll_down(5);
                return ConversationAction::None;
            }
            _ => {}
        }

        match self.composer.handle_key(key) {
            ComposerResult::Submitted(input) => {
                self.awaiting_reset_confirmation = false;
                self.submit(&input);
                ConversationAction::None
            }
            ComposerResult::Command(command) => self.handle_slash_command(command),
            ComposerResult::None => ConversationAction::None,
        }
    }

    /// Apply a backend completion delivered by a spawned request
    pub fn handle_session_event(&mut self, event: Event) {
        let transition = self.manager.dispatch(event);
        if matches!(transition.outcome, Outcome::Answered | Outcome::Failed(_)) {
            self.history.scroll_to_bottom();
        }
        self.sync_busy_state();
    }

    /// Advance animations by one tick
    pub fn tick(&mut self) {
        self.typing.tick();
    }

    fn submit(&mut self, text: &str) {
        match self.manager.submit_detached(text, &self.events_tx) {
            Outcome::Accepted { .. } => {
                self.composer.clear();
                self.history.clear_notice();
                self.history.scroll_to_bottom();
            }
            Outcome::Rejected(Rejection::Busy) => {
                self.history
                    .set_notice("Please wait for the current reply before sending another message.");
            }
            _ => {}
        }
        self.sync_busy_state();
    }

    fn sync_busy_state(&mut self) {
        let busy = self.manager.session().is_busy();
        if busy && !self.typing.is_active() {
            self.typing.start();
        } else if !busy {
            self.typing.stop();
        }
        self.composer.set_disabled(busy);
    }

    /// Handle slash commands
    fn handle_slash_command(&mut self, command: ParsedCommand) -> ConversationAction {
        let confirming = std::mem::take(&mut self.awaiting_reset_confirmation);

        if self.manager.session().is_busy() && !command.command.available_while_busy() {
            self.history
                .set_notice(format!("/{} is unavailable while waiting for a reply.", command.command.command()));
            return ConversationAction::None;
        }

        match command.command {
            SlashCommand::New => {
                let needs_confirmation =
                    self.confirm_reset && !confirming && !self.manager.session().log().is_empty();
                if needs_confirmation {
                    self.awaiting_reset_confirmation = true;
                    self.history.set_notice(prompts::RESET_CONFIRMATION);
                    return ConversationAction::None;
                }

                match self.manager.reset_conversation() {
                    ResetOutcome::Cleared => self.history.clear_notice(),
                    ResetOutcome::Deferred => self
                        .history
                        .set_notice("The conversation will be cleared once the current reply arrives."),
                }
                self.history.scroll_to_bottom();
            }
            SlashCommand::Example => match command.example_prompt() {
                Some(prompt) => self.submit(prompt),
                None => self.history.set_notice(format!(
                    "Choose an example between 1 and {}, e.g. /example 1",
                    prompts::EXAMPLE_PROMPTS.len()
                )),
            },
            SlashCommand::Health => {
                self.manager.probe_health_detached(&self.events_tx);
                self.history.set_notice("Checking backend status...");
            }
            SlashCommand::Context => {
                let shown = self.history.toggle_context();
                self.history.set_notice(if shown {
                    "Medical context will be shown under replies."
                } else {
                    "Medical context hidden."
                });
            }
            SlashCommand::Help => self.history.set_notice(get_help_text()),
            SlashCommand::Bye => return ConversationAction::Exit,
        }

        ConversationAction::None
    }

    /// Draw the whole conversation screen
    pub fn render(&self, frame: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Header
                Constraint::Min(6),    // History
                Constraint::Length(1), // Typing indicator
                Constraint::Length(4), // Composer
                Constraint::Length(1), // Footer
            ])
            .split(frame.size());

        let session = self.manager.session();
        frame.render_widget(StatusBar::new(session.health(), session.id()), chunks[0]);
        frame.render_widget(self.history.widget(session.log()), chunks[1]);
        frame.render_widget(&self.typing, chunks[2]);
        frame.render_widget(&self.composer, chunks[3]);

        let footer = Line::from(vec![Span::styled(
            "AI-powered diagnosis assistant • Always consult a healthcare professional • PgUp/PgDn scroll • Ctrl+C quit",
            Style::default().fg(Color::DarkGray),
        )]);
        frame.render_widget(footer, chunks[4]);
    }
}
