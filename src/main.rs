use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use crossterm::cursor::SetCursorStyle;
use crossterm::event::{
    DisableBracketedPaste, DisableMouseCapture, EnableBracketedPaste, EnableMouseCapture,
};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::prelude::*;
use tracing::{error, info};

mod app;
mod attachment;
mod client;
mod config;
mod controller;
mod events;
mod logging;
mod protocol;
mod text_layout;
mod theme;
mod transcript;
mod ui;

use app::App;
use client::{ChatAdapter, HttpChatBackend};
use config::{ClientConfig, ConfigOverrides};
use controller::ChatController;
use events::AppEvent;
use protocol::Variant;
use theme::Theme;

const MAX_ADAPTER_EVENTS_PER_LOOP: usize = 16;

#[derive(Debug, Parser)]
#[command(
    name = "chat-relay",
    version,
    about = "Terminal chat front end for HTTP chat agents"
)]
struct Cli {
    /// Front end to run: `plain` JSON chat or `file` upload chat.
    #[arg(long, value_enum)]
    variant: Option<Variant>,
    /// Chat endpoint URL (defaults depend on the variant).
    #[arg(long)]
    endpoint: Option<String>,
    /// TOML config file (defaults to ./chat-relay.toml when present).
    #[arg(long)]
    config: Option<PathBuf>,
    /// File to attach at startup (file variant only).
    #[arg(long)]
    file: Option<PathBuf>,
    #[arg(long)]
    user_id: Option<String>,
    #[arg(long)]
    session_id: Option<String>,
    /// Send the contents of this file as the first message.
    #[arg(long, conflicts_with = "once")]
    send_file: Option<PathBuf>,
    /// Send one message without the TUI and print the transcript as JSON.
    #[arg(long, requires = "message")]
    once: bool,
    #[arg(long, requires = "once")]
    message: Option<String>,
    /// Probe the backend's /health route and exit.
    #[arg(long, conflicts_with_all = ["once", "send_file"])]
    check: bool,
    #[arg(long, default_value = "theme.toml")]
    theme: PathBuf,
}

impl Cli {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            variant: self.variant,
            endpoint: self.endpoint.clone(),
            user_id: self.user_id.clone(),
            session_id: self.session_id.clone(),
        }
    }
}

fn main() -> io::Result<()> {
    let cli = Cli::parse();
    let config = ClientConfig::load(cli.config.as_deref())
        .and_then(|config| config.with_overrides(cli.overrides()))
        .map_err(|err| io::Error::new(io::ErrorKind::InvalidInput, err))?;
    logging::init_file_logging(&config.log_file)?;
    info!(
        variant = ?config.variant,
        endpoint = config.endpoint(),
        "starting chat-relay"
    );

    let backend = HttpChatBackend::new(config.endpoint(), config.connect_timeout())
        .map_err(|err| io::Error::new(io::ErrorKind::InvalidInput, err))?;
    if cli.check {
        return run_health_check(&backend);
    }

    let mut app = App::new(
        ChatController::new(config.variant, config.identity()),
        config.title(),
    );
    if let Some(path) = &cli.file {
        app.attach_path(&path.display().to_string());
        if app.controller().attached_file().is_none() {
            let reason = app
                .notice()
                .map(|notice| notice.text.clone())
                .unwrap_or_else(|| format!("could not attach {}", path.display()));
            return Err(io::Error::new(io::ErrorKind::InvalidInput, reason));
        }
    }
    let adapter = ChatAdapter::new(Arc::new(backend));

    if let Some(message) = cli.message.as_deref().filter(|_| cli.once) {
        return run_once(app, &adapter, message);
    }

    let startup_message = match &cli.send_file {
        Some(path) => Some(std::fs::read_to_string(path)?),
        None => None,
    };

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(
        stdout,
        EnterAlternateScreen,
        EnableMouseCapture,
        EnableBracketedPaste,
        SetCursorStyle::SteadyBar
    )?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;
    let theme = Theme::load_or_default(&cli.theme);
    let result = run_app(
        &mut terminal,
        app,
        &theme,
        &adapter,
        startup_message.as_deref(),
    );

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        SetCursorStyle::DefaultUserShape,
        DisableBracketedPaste,
        DisableMouseCapture,
        LeaveAlternateScreen
    )?;
    terminal.show_cursor()?;

    if let Err(err) = &result {
        error!(%err, "chat-relay exited with an error");
    }
    result
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    mut app: App,
    theme: &Theme,
    adapter: &ChatAdapter,
    startup_message: Option<&str>,
) -> io::Result<()> {
    if let Some(message) = startup_message
        && let Some(request) = app.submit_text(message)
    {
        adapter.send(request);
    }

    while app.running {
        terminal.draw(|frame| ui::render(frame, &app, theme))?;
        let size = terminal.size()?;
        let screen = Rect::new(0, 0, size.width, size.height);

        match events::next_event()? {
            AppEvent::Tick => app.on_tick(),
            AppEvent::Quit => app.quit(),
            AppEvent::Submit => {
                if let Some(request) = app.submit() {
                    adapter.send(request);
                }
            }
            AppEvent::InputChar(c) => app.input_char(c),
            AppEvent::Backspace => app.backspace_input(),
            AppEvent::CursorLeft => app.move_cursor_left(),
            AppEvent::CursorRight => app.move_cursor_right(),
            AppEvent::CursorHome => app.move_cursor_home(),
            AppEvent::CursorEnd => app.move_cursor_end(),
            AppEvent::ScrollUp => app.scroll_up(1, ui::transcript_max_scroll(screen, &app)),
            AppEvent::ScrollDown => app.scroll_down(1, ui::transcript_max_scroll(screen, &app)),
            AppEvent::PageUp => app.scroll_up(
                ui::transcript_page_height(screen, &app),
                ui::transcript_max_scroll(screen, &app),
            ),
            AppEvent::PageDown => app.scroll_down(
                ui::transcript_page_height(screen, &app),
                ui::transcript_max_scroll(screen, &app),
            ),
            AppEvent::Paste(text) => app.handle_paste(&text),
        }

        for event in adapter.drain_events_limited(MAX_ADAPTER_EVENTS_PER_LOOP) {
            app.on_adapter_event(event);
        }
    }

    info!(turns = app.controller().transcript().len(), "chat-relay closed");
    Ok(())
}

/// Sends a single message, waits for it to settle and prints the transcript.
fn run_once(mut app: App, adapter: &ChatAdapter, message: &str) -> io::Result<()> {
    let Some(request) = app.submit_text(message) else {
        let reason = app
            .notice()
            .map(|notice| notice.text.clone())
            .unwrap_or_else(|| "message was not sent".to_string());
        return Err(io::Error::new(io::ErrorKind::InvalidInput, reason));
    };
    adapter.send(request);
    if let Some(event) = adapter.wait_event() {
        app.on_adapter_event(event);
    }
    let output = serde_json::to_string_pretty(app.controller().transcript())?;
    println!("{output}");
    Ok(())
}

fn run_health_check(backend: &HttpChatBackend) -> io::Result<()> {
    match backend.check_health() {
        Ok(health) => {
            println!("{}: {}", backend.endpoint(), health.status);
            Ok(())
        }
        Err(err) => {
            error!(%err, "health check failed");
            Err(io::Error::other(err))
        }
    }
}
