mod background;
mod logging;
mod models;
mod store;
mod ui;

use std::path::PathBuf;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use ratatui::Frame;
use tracing::{info, warn};

use background::{
    capture_snapshot, ArchiveWorker, Handshake, HandshakeError, SessionFile, ViewRegistry,
};
use store::Database;
use ui::App;

#[derive(Parser)]
#[command(name = "tab-archive", about = "Snapshot open tabs, then archive or forget them.")]
struct Cli {
    /// Session file describing the window's open tabs (JSON).
    session: PathBuf,

    /// Archive database path. Defaults to the platform data directory.
    #[arg(long)]
    db: Option<PathBuf>,

    /// Records fetched per archive page.
    #[arg(long, default_value_t = 20)]
    page_size: usize,

    /// Log file path. Defaults to the platform data directory.
    #[arg(long)]
    log_file: Option<PathBuf>,
}

fn data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("tab-archive")
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_path = cli
        .log_file
        .clone()
        .unwrap_or_else(|| data_dir().join("tab-archive.log"));
    logging::init(&log_path)?;

    let db_path = cli.db.clone().unwrap_or_else(|| data_dir().join("archive.db"));
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating data directory {}", parent.display()))?;
    }
    let db = Database::open(&db_path)
        .with_context(|| format!("opening archive at {}", db_path.display()))?;

    // The trigger: capture the window, open the view, arm the handshake.
    let mut handshake = Handshake::new();
    handshake.begin_capture();
    let captured_at = Utc::now().timestamp_millis();
    let snapshot = capture_snapshot(&SessionFile::new(&cli.session), captured_at)?;
    info!(tabs = snapshot.len(), "captured window snapshot");

    let mut registry = ViewRegistry::new();
    let view_id = registry
        .allocate()
        .ok_or(HandshakeError::MissingViewId)
        .context("aborting capture")?;
    handshake.offer(view_id, snapshot);

    let (command_tx, command_rx) = mpsc::channel();
    let (event_tx, event_rx) = mpsc::channel();
    let worker = ArchiveWorker::new(db, handshake, event_tx, command_rx);
    let worker_thread = thread::spawn(move || worker.run());

    let mut app = App::new(view_id, cli.page_size, command_tx, event_rx);
    if app.signal_ready().is_err() {
        warn!("handshake unreachable; rendering empty archive view");
    }

    let mut terminal = ui::init_terminal()?;
    let result = run_app(&mut terminal, &mut app);
    ui::restore_terminal()?;

    // Dropping the app closes the command channel, which stops the worker
    // even when the loop exited on an error.
    drop(app);
    let _ = worker_thread.join();

    result
}

fn run_app(terminal: &mut ui::Tui, app: &mut App) -> Result<()> {
    while app.running {
        terminal.draw(|f| render(f, app))?;

        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    handle_key(app, key.code);
                }
            }
        }

        app.drain_events();
    }
    Ok(())
}

fn render(f: &mut Frame, app: &App) {
    ui::views::render_archive(f, app);
}

fn handle_key(app: &mut App, code: KeyCode) {
    match code {
        KeyCode::Char('q') | KeyCode::Esc => app.quit(),
        KeyCode::Tab => app.switch_pane(),
        KeyCode::Char('j') | KeyCode::Down => app.cursor_down(),
        KeyCode::Char('k') | KeyCode::Up => app.cursor_up(),
        KeyCode::Char(' ') => app.toggle_selected(),
        KeyCode::Char('a') => app.archive_at_cursor(),
        KeyCode::Char('f') | KeyCode::Char('d') => app.forget_at_cursor(),
        KeyCode::Char('A') => app.archive_selected(),
        KeyCode::Char('F') => app.forget_selected(),
        KeyCode::Char('m') => app.load_more(),
        _ => {}
    }
}
