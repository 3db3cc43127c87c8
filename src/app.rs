use crate::api::ChatApi;
use crate::config::Config;
use crate::controller::ChatController;
use crate::events::TuiEvent;
use crate::ui::conversation::{ConversationAction, ConversationManager};
use anyhow::{Context, Result};
use crossterm::event::{self, DisableBracketedPaste, EnableBracketedPaste, Event, KeyEventKind};
use crossterm::execute;
use crossterm::terminal::{self, EnterAlternateScreen, LeaveAlternateScreen};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use std::io::{self, Stdout};
use tokio::time::Duration;

type Tui = Terminal<CrosstermBackend<Stdout>>;

/// Run the chat screen until the user quits
pub async fn run(config: Config) -> Result<()> {
    let api = ChatApi::new(&config).context("Failed to create HTTP client")?;
    let mut manager = ConversationManager::new(ChatController::new(api), config.ui.title.clone());
    let tick_rate = Duration::from_millis(config.ui.tick_rate_ms.max(10));

    tracing::info!(base_url = %config.base_url, "starting chat screen");

    install_panic_hook();
    let mut tui = setup_terminal()?;
    let result = event_loop(&mut tui, &mut manager, tick_rate);
    restore_terminal(&mut tui)?;

    tracing::info!(messages = manager.controller().transcript().len(), "chat screen closed");
    result
}

fn event_loop(tui: &mut Tui, manager: &mut ConversationManager, tick_rate: Duration) -> Result<()> {
    loop {
        manager.tick();
        tui.draw(|frame| {
            let area = frame.size();
            manager.render(area, frame.buffer_mut());
        })
        .context("Failed to draw terminal")?;

        // Keep request tasks running on other workers while we block on input
        let event = tokio::task::block_in_place(|| read_event(tick_rate))?;
        match event {
            TuiEvent::Key(key) => {
                if manager.handle_key(key) == ConversationAction::Exit {
                    return Ok(());
                }
            }
            TuiEvent::Paste(text) => manager.handle_paste(&text),
            TuiEvent::Resize(width, height) => {
                tracing::debug!(width, height, "terminal resized");
            }
            TuiEvent::Tick => {}
        }
    }
}

/// Wait up to `timeout` for terminal input
fn read_event(timeout: Duration) -> Result<TuiEvent> {
    if !event::poll(timeout).context("Failed to poll terminal events")? {
        return Ok(TuiEvent::Tick);
    }

    let event = match event::read().context("Failed to read terminal event")? {
        Event::Key(key) if key.kind == KeyEventKind::Press => TuiEvent::Key(key),
        Event::Paste(text) => TuiEvent::Paste(text),
        Event::Resize(width, height) => TuiEvent::Resize(width, height),
        _ => TuiEvent::Tick,
    };
    Ok(event)
}

fn setup_terminal() -> Result<Tui> {
    terminal::enable_raw_mode().context("Failed to enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableBracketedPaste)
        .context("Failed to enter alternate screen")?;
    Terminal::new(CrosstermBackend::new(stdout)).context("Failed to create terminal")
}

fn restore_terminal(tui: &mut Tui) -> Result<()> {
    terminal::disable_raw_mode().context("Failed to disable raw mode")?;
    execute!(tui.backend_mut(), LeaveAlternateScreen, DisableBracketedPaste)
        .context("Failed to leave alternate screen")?;
    tui.show_cursor().context("Failed to show cursor")?;
    Ok(())
}

fn install_panic_hook() {
    let previous = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = terminal::disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen, DisableBracketedPaste);
        previous(info);
    }));
}
