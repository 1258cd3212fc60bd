//! Terminal front-end for a consultation session

pub mod conversation;
pub mod status;

use crate::backend::ChatBackend;
use crate::config::Config;
use crate::manager::SessionManager;
use anyhow::{Context, Result};
use conversation::{ConversationAction, ConversationView};
use crossterm::event::{Event as TermEvent, EventStream};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use futures::StreamExt;
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use std::io::{self, Stdout};
use std::panic;
use std::sync::Arc;
use tokio::sync::mpsc;

type Tui = Terminal<CrosstermBackend<Stdout>>;

fn setup_terminal() -> Result<Tui> {
    enable_raw_mode().context("Failed to enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).context("Failed to enter alternate screen")?;
    Terminal::new(CrosstermBackend::new(stdout)).context("Failed to create terminal")
}

fn restore_terminal() -> Result<()> {
    execute!(io::stdout(), LeaveAlternateScreen).context("Failed to leave alternate screen")?;
    disable_raw_mode().context("Failed to disable raw mode")?;
    Ok(())
}

/// Restore the terminal before the default hook prints the panic
fn install_panic_hook() {
    let original_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        let _ = restore_terminal();
        original_hook(panic_info);
    }));
}

/// Run the interactive consultation until the user exits
pub async fn run(config: &Config, backend: Arc<dyn ChatBackend>) -> Result<()> {
    install_panic_hook();
    let mut terminal = setup_terminal()?;

    let result = event_loop(&mut terminal, config, backend).await;

    restore_terminal()?;
    terminal.show_cursor().context("Failed to show cursor")?;
    result
}

async fn event_loop(terminal: &mut Tui, config: &Config, backend: Arc<dyn ChatBackend>) -> Result<()> {
    let (events_tx, mut events_rx) = mpsc::unbounded_channel();
    let mut view = ConversationView::new(SessionManager::new(backend), config, events_tx);
    view.start();

    let mut input = EventStream::new();
    let mut ticker = tokio::time::interval(config.tick_rate());

    loop {
        terminal.draw(|frame| view.render(frame))?;

        tokio::select! {
            maybe_input = input.next() => match maybe_input {
                Some(Ok(TermEvent::Key(key))) => {
                    if view.handle_key(key) == ConversationAction::Exit {
                        break;
                    }
                }
                Some(Ok(_)) => {}
                Some(Err(err)) => return Err(err).context("Failed to read terminal input"),
                None => break,
            },
            Some(event) = events_rx.recv() => view.handle_session_event(event),
            _ = ticker.tick() => view.tick(),
        }
    }

    tracing::info!(
        session_id = %view.manager().session().id(),
        messages = view.manager().session().log().len(),
        "Consultation ended"
    );
    Ok(())
}
