//! Library entry point for the csvchat TUI.
//!
//! Provides a reusable [`run`] function that launches the Ratatui terminal UI
//! against a pre-built [`ReplyBackend`].

mod app;
mod event;
mod theme;
mod ui;

use app::{App, Focus};
use crossterm::event::{
    DisableMouseCapture, EnableMouseCapture, Event as CrosstermEvent, KeyCode, KeyEvent,
    KeyModifiers, MouseEventKind,
};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use csvchat_config::{CsvChatConfig, FilesConfig};
use csvchat_core::{Clock, PendingReply, ReplyBackend, ReplyRequest, SystemClock};
use event::AppEvent;
use log::{debug, info, warn};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use std::io::{self, Stdout};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

const ENV_USER: &str = "USER";
const ENV_USERNAME: &str = "USERNAME";

/// Supported slash commands in the composer.
#[derive(Debug, Clone, PartialEq, Eq)]
enum SlashCommand {
    New,
    Delete,
    Payers(PathBuf),
    Transactions(PathBuf),
    Files,
}

/// Shared handles used while dispatching events.
struct Context {
    backend: Arc<dyn ReplyBackend>,
    clock: Arc<dyn Clock>,
    sender: mpsc::Sender<AppEvent>,
}

/// Launch the TUI and block until the user quits.
pub async fn run(
    config: CsvChatConfig,
    user_name: String,
    backend: Arc<dyn ReplyBackend>,
) -> anyhow::Result<()> {
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let mut app = App::new(&config, user_name, backend.is_remote(), clock.now());
    info!(
        "starting tui (remote={}, files_complete={}, seeded={})",
        app.remote,
        app.uploads.is_complete(),
        !app.conversations().is_empty()
    );
    if app.remote && !app.uploads.is_complete() {
        app.push_status("select files with /payers and /transactions");
    }

    let mut terminal = setup_terminal()?;
    let size = terminal.size()?;
    app.resize(size.width);

    let (tx, mut rx) = mpsc::channel(256);
    spawn_input_handler(tx.clone());
    spawn_tick(tx.clone());
    let context = Context {
        backend,
        clock,
        sender: tx,
    };

    loop {
        terminal.draw(|frame| ui::draw(frame, &mut app))?;

        let Some(event) = rx.recv().await else { break };
        if handle_app_event(event, &mut app, &context) {
            break;
        }
    }

    restore_terminal(&mut terminal)?;
    Ok(())
}

/// Name for the welcome greeting: configured, then `$USER`, then a default.
pub fn resolve_user_name(configured: Option<&str>) -> String {
    configured
        .map(str::to_string)
        .or_else(|| std::env::var(ENV_USER).ok())
        .or_else(|| std::env::var(ENV_USERNAME).ok())
        .unwrap_or_else(|| "there".to_string())
}

/// Dispatch a UI event and return true when the app should exit.
fn handle_app_event(event: AppEvent, app: &mut App, context: &Context) -> bool {
    match event {
        AppEvent::Input(key) => handle_input(key, app, context),
        AppEvent::Resize(width, height) => {
            debug!("terminal resized (width={width}, height={height})");
            app.resize(width);
            false
        }
        AppEvent::Scroll(delta) => {
            if delta < 0 {
                app.scroll_up((-delta) as u16);
            } else if delta > 0 {
                app.scroll_down(delta as u16);
            }
            false
        }
        AppEvent::Reply { pending, outcome } => {
            debug!(
                "reply received (conversation_id={}, ok={})",
                pending.conversation_id,
                outcome.is_ok()
            );
            app.apply_reply(&pending, outcome, context.clock.now());
            false
        }
        AppEvent::Tick => {
            app.tick();
            false
        }
    }
}

/// Handle keyboard input and dispatch actions.
fn handle_input(key: KeyEvent, app: &mut App, context: &Context) -> bool {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    match key.code {
        KeyCode::Char('c') if ctrl => return true,
        KeyCode::Esc => {
            if app.show_slash_commands {
                app.show_slash_commands = false;
                app.chat.input.clear();
                return false;
            }
            return true;
        }
        KeyCode::Char('n') if ctrl => {
            app.new_conversation();
            return false;
        }
        KeyCode::Char('b') if ctrl => {
            app.toggle_sidebar();
            return false;
        }
        KeyCode::Char('t') if ctrl => {
            app.toggle_theme();
            return false;
        }
        KeyCode::Tab => {
            app.toggle_focus();
            return false;
        }
        KeyCode::PageUp => {
            app.scroll_up(5);
            return false;
        }
        KeyCode::PageDown => {
            app.scroll_down(5);
            return false;
        }
        _ => {}
    }

    if app.focus == Focus::Sidebar {
        match key.code {
            KeyCode::Up => app.select_previous(),
            KeyCode::Down => app.select_next(),
            KeyCode::Enter => app.open_selected(),
            KeyCode::Delete | KeyCode::Char('d') => app.delete_selected(),
            _ => {}
        }
        return false;
    }

    match key.code {
        KeyCode::Up => app.scroll_up(1),
        KeyCode::Down => app.scroll_down(1),
        KeyCode::Home => {
            app.auto_scroll = false;
            app.scroll = 0;
        }
        KeyCode::End => app.enable_auto_scroll(),
        KeyCode::Enter => {
            if app.chat.input.trim_start().starts_with('/') {
                let command = std::mem::take(&mut app.chat.input);
                app.show_slash_commands = false;
                if let Err(err) = handle_slash_command(app, &command) {
                    app.push_status(err);
                }
            } else {
                app.show_slash_commands = false;
                submit_message(app, context);
            }
        }
        KeyCode::Backspace => {
            app.chat.input.pop();
            app.show_slash_commands = app.chat.input.trim_start().starts_with('/');
        }
        KeyCode::Char(ch) if !ctrl => {
            app.chat.input.push(ch);
            app.show_slash_commands = app.chat.input.trim_start().starts_with('/');
        }
        _ => {}
    }
    false
}

/// Record the composer contents and spawn the reply.
fn submit_message(app: &mut App, context: &Context) {
    let Some(pending) = app.submit(context.clock.now()) else {
        return;
    };
    spawn_reply(
        context.backend.clone(),
        pending,
        app.uploads.clone(),
        context.sender.clone(),
    );
}

/// Spawn a task that awaits the backend and reports back on the channel.
fn spawn_reply(
    backend: Arc<dyn ReplyBackend>,
    pending: PendingReply,
    uploads: FilesConfig,
    sender: mpsc::Sender<AppEvent>,
) {
    tokio::spawn(async move {
        debug!(
            "dispatching reply (conversation_id={}, remote={}, query_len={})",
            pending.conversation_id,
            pending.remote,
            pending.query.len()
        );
        let outcome = backend
            .reply(ReplyRequest {
                query: pending.query.clone(),
                conversation_id: pending.conversation_id.clone(),
                uploads,
            })
            .await;
        if sender
            .send(AppEvent::Reply { pending, outcome })
            .await
            .is_err()
        {
            warn!("reply dropped; event loop closed");
        }
    });
}

/// Handle slash commands entered in the composer.
fn handle_slash_command(app: &mut App, input: &str) -> Result<(), String> {
    let Some(command) = parse_slash_command(input)? else {
        return Ok(());
    };
    debug!("handling slash command ({command:?})");
    match command {
        SlashCommand::New => app.new_conversation(),
        SlashCommand::Delete => {
            if !app.delete_active() {
                return Err("no conversation open".to_string());
            }
            app.push_status("conversation deleted");
        }
        SlashCommand::Payers(path) => {
            ensure_file(&path)?;
            app.push_status(format!("payers: {}", path.display()));
            app.uploads.payers = Some(path);
        }
        SlashCommand::Transactions(path) => {
            ensure_file(&path)?;
            app.push_status(format!("transactions: {}", path.display()));
            app.uploads.transactions = Some(path);
        }
        SlashCommand::Files => {
            let show = |path: Option<&Path>| {
                path.map(|path| path.display().to_string())
                    .unwrap_or_else(|| "not set".to_string())
            };
            let status = format!(
                "payers: {}  transactions: {}",
                show(app.uploads.payers.as_deref()),
                show(app.uploads.transactions.as_deref())
            );
            app.push_status(status);
        }
    }
    Ok(())
}

fn ensure_file(path: &Path) -> Result<(), String> {
    if path.is_file() {
        Ok(())
    } else {
        Err(format!("file not found: {}", path.display()))
    }
}

/// Parse a slash command from the input line.
fn parse_slash_command(input: &str) -> Result<Option<SlashCommand>, String> {
    let trimmed = input.trim();
    let Some(rest) = trimmed.strip_prefix('/') else {
        return Ok(None);
    };
    let (command, argument) = match rest.split_once(char::is_whitespace) {
        Some((command, argument)) => (command, argument.trim()),
        None => (rest, ""),
    };
    if command.is_empty() {
        return Ok(None);
    }
    match command.to_lowercase().as_str() {
        "new" => Ok(Some(SlashCommand::New)),
        "delete" => Ok(Some(SlashCommand::Delete)),
        "files" => Ok(Some(SlashCommand::Files)),
        "payers" => {
            if argument.is_empty() {
                return Err("usage: /payers <path>".to_string());
            }
            Ok(Some(SlashCommand::Payers(PathBuf::from(argument))))
        }
        "transactions" => {
            if argument.is_empty() {
                return Err("usage: /transactions <path>".to_string());
            }
            Ok(Some(SlashCommand::Transactions(PathBuf::from(argument))))
        }
        _ => Err(format!("unknown command: {command}")),
    }
}

/// Spawn a task to poll for input events.
fn spawn_input_handler(sender: mpsc::Sender<AppEvent>) {
    tokio::spawn(async move {
        const MOUSE_SCROLL_LINES: i16 = 3;
        loop {
            if let Ok(true) = crossterm::event::poll(Duration::from_millis(30)) {
                while let Ok(true) = crossterm::event::poll(Duration::from_millis(0)) {
                    let event = match crossterm::event::read() {
                        Ok(event) => event,
                        Err(_) => break,
                    };
                    let app_event = match event {
                        CrosstermEvent::Key(key) => AppEvent::Input(key),
                        CrosstermEvent::Resize(width, height) => AppEvent::Resize(width, height),
                        CrosstermEvent::Mouse(mouse) => match mouse.kind {
                            MouseEventKind::ScrollUp => AppEvent::Scroll(-MOUSE_SCROLL_LINES),
                            MouseEventKind::ScrollDown => AppEvent::Scroll(MOUSE_SCROLL_LINES),
                            _ => continue,
                        },
                        _ => continue,
                    };
                    if sender.send(app_event).await.is_err() {
                        return;
                    }
                }
            }
        }
    });
}

/// Spawn a periodic tick event generator.
fn spawn_tick(sender: mpsc::Sender<AppEvent>) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_millis(250));
        loop {
            interval.tick().await;
            if sender.send(AppEvent::Tick).await.is_err() {
                return;
            }
        }
    });
}

/// Configure terminal in raw mode with alternate screen.
fn setup_terminal() -> anyhow::Result<Terminal<CrosstermBackend<Stdout>>> {
    debug!("setting up terminal");
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

/// Restore terminal state on exit.
fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> anyhow::Result<()> {
    debug!("restoring terminal");
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;
    Ok(())
}
