use std::io;
use std::time::Duration;

use anyhow::Result;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::error;

use super::app::App;
use super::models::ConfigInputMode;
use super::rendering::ui;

pub async fn run_tui(mut app: App) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    res
}

fn run_app<B: ratatui::backend::Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<()> {
    loop {
        app.clear_status_message_if_expired();
        if let Err(e) = app.poll_setup() {
            error!(error = %e, "setup failed");
            app.set_status_message(format!("Error: {e:#}"));
        }
        app.poll_matcher();
        app.poll_artwork();
        app.request_artwork();

        terminal.draw(|f| ui(f, app))?;

        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                match handle_key(app, key) {
                    Ok(true) => return Ok(()),
                    Ok(false) => {}
                    Err(e) => {
                        error!(error = %e, "action failed");
                        app.set_status_message(format!("Error: {e:#}"));
                    }
                }
            }
        }
    }
}

/// Dispatch one key press. Returns true when the app should exit.
fn handle_key(app: &mut App, key: KeyEvent) -> Result<bool> {
    if app.api_key_input.is_some() {
        match key.code {
            KeyCode::Enter => app.submit_api_key()?,
            KeyCode::Esc => app.cancel_api_key_prompt(),
            KeyCode::Backspace => app.handle_api_key_input('\x08'),
            KeyCode::Char(c) => app.handle_api_key_input(c),
            _ => {}
        }
        return Ok(false);
    }

    if app.transfer_report.is_some() {
        app.transfer_report = None;
        return Ok(false);
    }

    if app.show_settings {
        app.handle_settings_key(key.code)?;
        return Ok(false);
    }

    if app.show_help {
        if matches!(
            key.code,
            KeyCode::Char('h') | KeyCode::Char('q') | KeyCode::Esc | KeyCode::F(1)
        ) {
            app.toggle_help();
        }
        return Ok(false);
    }

    if app.show_config {
        handle_config_key(app, key)?;
        return Ok(key.code == KeyCode::Esc);
    }

    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => return Ok(true),
        KeyCode::Char('h') | KeyCode::F(1) => app.toggle_help(),
        KeyCode::Char('p') => app.toggle_preview(),
        KeyCode::Char('o') => app.toggle_settings(),
        KeyCode::Char('c') => app.back_to_config(),
        KeyCode::Down | KeyCode::Char('j') => app.next(),
        KeyCode::Up | KeyCode::Char('k') => app.previous(),
        KeyCode::Right | KeyCode::Char('l') => app.next_candidate(),
        KeyCode::Left => app.previous_candidate(),
        KeyCode::Char(' ') => app.toggle_mark(),
        KeyCode::Char('a') => app.toggle_mark_all(),
        KeyCode::Char('s') => app.restart_search(),
        KeyCode::Char('r') => app.refresh()?,
        KeyCode::Enter => app.send_marked()?,
        _ => {}
    }
    Ok(false)
}

fn handle_config_key(app: &mut App, key: KeyEvent) -> Result<()> {
    let typing = matches!(
        app.config_input_mode,
        ConfigInputMode::SourceFolder | ConfigInputMode::LibraryFolder | ConfigInputMode::SeriesQuery
    );

    match key.code {
        KeyCode::Enter => app.confirm_config_step()?,
        KeyCode::Backspace if typing => app.handle_config_input('\x08'),
        KeyCode::F(2) => app.toggle_settings(),
        KeyCode::F(1) => app.toggle_help(),
        KeyCode::Char(c) => app.handle_config_input(c),
        KeyCode::Left | KeyCode::Backspace | KeyCode::Up | KeyCode::Down => {
            app.handle_config_navigation(key.code)
        }
        _ => {}
    }
    Ok(())
}
