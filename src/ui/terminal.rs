use std::io::{self, Stdout};
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;

use super::app::App;

/// Spin up the terminal backend, enter the draw loop, and keep processing input
/// until the user picks the exit option.
pub fn run_app(app: &mut App) -> Result<()> {
    let mut stdout = io::stdout();
    enable_raw_mode().context("failed to enable raw mode")?;
    execute!(stdout, EnterAlternateScreen).context("failed to enter alternate screen")?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("failed to create terminal backend")?;

    let result = event_loop(&mut terminal, app);

    cleanup_terminal(&mut terminal)?;
    result
}

fn event_loop(terminal: &mut Terminal<CrosstermBackend<Stdout>>, app: &mut App) -> Result<()> {
    loop {
        terminal
            .draw(|frame| app.draw(frame))
            .context("failed to draw frame")?;

        if event::poll(Duration::from_millis(250)).context("event polling failed")? {
            if let Event::Key(key_event) = event::read().context("failed to read event")? {
                if let Some(code) = app_key(key_event) {
                    if app.handle_key(code) {
                        return Ok(());
                    }
                }
            }
        }
    }
}

/// Key presses the app should see. Character chords with Ctrl or Alt are
/// dropped so they never land in an input buffer.
fn app_key(key_event: KeyEvent) -> Option<KeyCode> {
    if key_event.kind != KeyEventKind::Press {
        return None;
    }
    let chord = key_event
        .modifiers
        .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT);
    match key_event.code {
        KeyCode::Char(_) if chord => None,
        code => Some(code),
    }
}

fn cleanup_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    disable_raw_mode().context("failed to disable raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)
        .context("failed to leave alternate screen")?;
    terminal
        .show_cursor()
        .context("failed to restore cursor visibility")
}

#[cfg(test)]
mod tests {
    use super::*;

    use crossterm::event::KeyEventState;

    fn key(code: KeyCode, modifiers: KeyModifiers, kind: KeyEventKind) -> KeyEvent {
        KeyEvent {
            code,
            modifiers,
            kind,
            state: KeyEventState::NONE,
        }
    }

    #[test]
    fn plain_and_shifted_presses_pass_through() {
        let press = KeyEventKind::Press;
        assert_eq!(
            app_key(key(KeyCode::Char('c'), KeyModifiers::NONE, press)),
            Some(KeyCode::Char('c'))
        );
        assert_eq!(
            app_key(key(KeyCode::Char('S'), KeyModifiers::SHIFT, press)),
            Some(KeyCode::Char('S'))
        );
        assert_eq!(
            app_key(key(KeyCode::Enter, KeyModifiers::NONE, press)),
            Some(KeyCode::Enter)
        );
    }

    #[test]
    fn control_and_alt_chords_are_dropped() {
        let press = KeyEventKind::Press;
        assert_eq!(app_key(key(KeyCode::Char('c'), KeyModifiers::CONTROL, press)), None);
        assert_eq!(app_key(key(KeyCode::Char('s'), KeyModifiers::CONTROL, press)), None);
        assert_eq!(app_key(key(KeyCode::Char('x'), KeyModifiers::ALT, press)), None);
        assert_eq!(
            app_key(key(KeyCode::Enter, KeyModifiers::CONTROL, press)),
            Some(KeyCode::Enter)
        );
    }

    #[test]
    fn releases_are_ignored() {
        assert_eq!(
            app_key(key(KeyCode::Char('a'), KeyModifiers::NONE, KeyEventKind::Release)),
            None
        );
    }
}
