pub mod app;
pub mod browser;

use crate::config::Config;
use anyhow::Result;
use app::App;
use crossterm::{
    event::{self, Event, KeyCode, KeyModifiers},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use pgn_tree::events::{ChannelSink, LoadControl, UiEvent};
use pgn_tree::reparse::{Reparser, Request};
use ratatui::{Terminal, backend::CrosstermBackend};
use std::io;
use std::sync::{Arc, mpsc};
use std::time::{Duration, Instant, SystemTime};

/// Run the interactive browser.
pub fn run(config: Config) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(config.source.to_string());
    let result = main_loop(&mut terminal, &mut app, &config);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;

    result
}

/// Tracks the source file's modification time between checks.
struct Watcher {
    interval: Duration,
    last_check: Instant,
    last_modified: Option<SystemTime>,
}

impl Watcher {
    fn new(config: &Config) -> Self {
        Self {
            interval: config.watch_interval,
            last_check: Instant::now(),
            last_modified: config.source.modified_time(),
        }
    }

    /// True once per observed change.
    fn changed(&mut self, config: &Config) -> bool {
        if self.last_check.elapsed() < self.interval {
            return false;
        }
        self.last_check = Instant::now();
        let modified = config.source.modified_time();
        if modified.is_some() && modified != self.last_modified {
            self.last_modified = modified;
            return true;
        }
        false
    }
}

fn main_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    config: &Config,
) -> Result<()> {
    let (tx, rx) = mpsc::channel::<UiEvent>();
    let control = Arc::new(LoadControl::new());
    let sink = ChannelSink::new(tx, control.clone());
    let reparser = Reparser::spawn(sink);

    app.event_rx = Some(rx);
    app.control = Some(control);

    let mut watcher = config.watches_file().then(|| Watcher::new(config));
    reparser.submit(Request::Load(config.source.clone()));

    loop {
        terminal.draw(|f| browser::render(f, app))?;

        // Poll for load/parse events
        let events: Vec<_> = app
            .event_rx
            .as_ref()
            .map(|rx| rx.try_iter().collect())
            .unwrap_or_default();
        for event in events {
            app.handle_event(event);
        }

        if let Some(outcome) = reparser.try_recv() {
            app.apply_outcome(outcome);
        }

        if watcher.as_mut().is_some_and(|w| w.changed(config)) {
            app.add_log("Source changed on disk, re-parsing".into());
            reparser.submit(Request::Load(config.source.clone()));
        }

        // Poll for input events (50ms timeout for ~20fps)
        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                // Only handle key press events, not release/repeat (avoids double-input on Windows)
                if key.kind != event::KeyEventKind::Press {
                    continue;
                }

                // Ctrl+C always quits
                if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
                    app.should_quit = true;
                } else if key.code == KeyCode::Char('r') {
                    app.add_log("Reloading".into());
                    reparser.submit(Request::Load(config.source.clone()));
                } else {
                    handle_browser_key(app, key);
                }
            }
        }

        if app.should_quit {
            if let Some(control) = &app.control {
                control.cancel();
            }
            break;
        }
    }
    Ok(())
}

// ── Browser key handling ────────────────────────────────────────────────────

fn handle_browser_key(app: &mut App, key: event::KeyEvent) {
    match key.code {
        KeyCode::Char('q') => app.should_quit = true,
        KeyCode::Right => app.next_move(),
        KeyCode::Left => app.previous_move(),
        KeyCode::Home => app.line_start(),
        KeyCode::End => app.line_end(),
        KeyCode::Down => app.enter_variation(),
        KeyCode::Up => app.leave_variation(),
        KeyCode::Char(']') => app.sibling_variation(true),
        KeyCode::Char('[') => app.sibling_variation(false),
        KeyCode::Tab => app.next_game(),
        KeyCode::BackTab => app.previous_game(),
        KeyCode::PageUp => {
            app.log_scroll = app.log_scroll.saturating_sub(5);
        }
        KeyCode::PageDown => {
            app.log_scroll = (app.log_scroll + 5).min(app.logs.len().saturating_sub(1));
        }
        _ => {}
    }
}
