//! Chat Drop Daemon
//!
//! Main process for the Chat Drop overlay shell.
//!
//! Responsibilities:
//! - Resolve the startup window bounds from the display and the settings store
//! - Own the overlay window and its visibility state
//! - Process host events and commands from the control protocol on stdin
//! - Debounce window moves into settings writes

mod config;

use anyhow::{Context, Result};
use chatdrop_core::{
    default_bounds, resolve_bounds, store::default_store_dir, Debouncer, DisplayInfo,
    DisplayQuery, HostError, Point, SettingsStore, Visibility, WindowBounds, WindowController,
    WindowHost,
};
use chatdrop_ipc::{
    decode_command, encode_response, BridgeMessage, ProtocolError, ShellCommand, ShellResponse,
    MAX_IPC_MESSAGE_SIZE,
};
use chatdrop_platform::{
    parse_hotkey_string, register_hotkeys, HeadlessDisplay, HeadlessWindow, HotkeyHandle,
    PageKeyAction, WindowOptions, ZoomLevel, FALLBACK_DISPLAY_HEIGHT, FALLBACK_DISPLAY_WIDTH,
    KEY_LISTENER_SCRIPT,
};
use clap::Parser;
use config::Config;
use std::io;
use std::path::PathBuf;
use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

/// Command-line arguments.
#[derive(Parser, Debug)]
#[command(name = "chat-drop")]
#[command(author, version, about = "Hotkey-toggled overlay window hosting a web page")]
struct Args {
    /// Read configuration from this file instead of the standard locations
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory holding settings.json (overrides the config file)
    #[arg(long)]
    settings_dir: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,
}

/// Events that the shell event loop processes.
enum ShellEvent {
    /// A control-protocol command.
    Command {
        cmd: ShellCommand,
        responder: oneshot::Sender<ShellResponse>,
    },
    /// Moves have settled; persist this origin.
    PersistPosition(Point),
    /// Shutdown signal.
    Shutdown,
}

/// Event channel capacity.
const EVENT_CHANNEL_CAPACITY: usize = 100;

/// Shell state, owned by the event loop.
struct AppState {
    /// Overlay window and its visibility.
    controller: WindowController<HeadlessWindow>,
    /// Settings store; `None` when persistence is disabled.
    store: Option<SettingsStore>,
    /// Coalesces moves into a single `PersistPosition` event.
    move_debouncer: Debouncer<Point>,
    /// Hosted page zoom.
    zoom: ZoomLevel,
    /// Registered toggle hotkeys.
    hotkeys: HotkeyHandle,
}

impl AppState {
    /// Handle a control-protocol command.
    fn handle_command(&mut self, cmd: ShellCommand) -> ShellResponse {
        match cmd {
            ShellCommand::Toggle => match self.controller.toggle() {
                Ok(visibility) => {
                    info!("Toggled window -> {:?}", visibility);
                    ShellResponse::Ok
                }
                Err(e) => host_error("toggle", e),
            },
            ShellCommand::Show => match self.controller.show() {
                Ok(()) => ShellResponse::Ok,
                Err(e) => host_error("show", e),
            },
            ShellCommand::Hide => self.hide("hide command"),
            ShellCommand::Moved { x, y } => {
                let origin = Point::new(x, y);
                if let Err(e) = self.controller.set_position(origin) {
                    return host_error("move", e);
                }
                if self.store.is_some() {
                    self.move_debouncer.trigger(origin);
                }
                ShellResponse::Ok
            }
            ShellCommand::Hotkey { accelerator } => match parse_hotkey_string(&accelerator) {
                Ok(pressed) if self.hotkeys.matches(&pressed) => {
                    debug!("Hotkey {} pressed", pressed);
                    self.handle_command(ShellCommand::Toggle)
                }
                Ok(pressed) => ShellResponse::error(format!("Hotkey {} is not bound", pressed)),
                Err(e) => ShellResponse::error(e.to_string()),
            },
            ShellCommand::Bridge { message } => self.handle_bridge(&message),
            ShellCommand::Key { key, modifier } => match PageKeyAction::from_key(&key, modifier) {
                // The injected listener turns Escape into a bridge message.
                Some(PageKeyAction::Hide) => self.handle_bridge(chatdrop_ipc::HIDE_MAIN_WINDOW),
                Some(action) => {
                    if let Some(factor) = self.zoom.apply(action) {
                        info!("Zoom factor set to {:.2}", factor);
                    }
                    ShellResponse::Ok
                }
                None => ShellResponse::Ok,
            },
            ShellCommand::LoadFailed => match self.controller.load_failed() {
                Ok(()) => ShellResponse::Ok,
                Err(e) => host_error("hide after load failure", e),
            },
            ShellCommand::QueryState => self.state_response(),
            ShellCommand::Stop => ShellResponse::Ok,
        }
    }

    fn handle_bridge(&mut self, message: &str) -> ShellResponse {
        match BridgeMessage::from_post_message(message) {
            Some(BridgeMessage::HideMainWindow) => self.hide("hosted page request"),
            None => {
                debug!("Ignoring bridge message {:?}", message);
                ShellResponse::Ok
            }
        }
    }

    fn hide(&mut self, reason: &str) -> ShellResponse {
        match self.controller.hide() {
            Ok(()) => {
                info!("Window hidden ({})", reason);
                ShellResponse::Ok
            }
            Err(e) => host_error("hide", e),
        }
    }

    fn state_response(&self) -> ShellResponse {
        let bounds = self.controller.host().bounds();
        ShellResponse::State {
            visible: self.controller.visibility() == Visibility::Visible,
            x: bounds.x,
            y: bounds.y,
            width: bounds.width,
            height: bounds.height,
            zoom: self.zoom.factor(),
        }
    }

    /// Write a settled origin. Failures are logged; the next settled move
    /// tries again.
    fn persist_position(&self, origin: Point) {
        let Some(store) = &self.store else {
            return;
        };
        match store.write_record(origin.into()) {
            Ok(_) => info!("Window origin ({}, {}) saved", origin.x, origin.y),
            Err(e) => warn!("Failed to save window origin: {}", e),
        }
    }
}

fn host_error(operation: &str, e: HostError) -> ShellResponse {
    warn!("Window {} failed: {}", operation, e);
    ShellResponse::error(e.to_string())
}

/// Parse the configured toggle accelerators, skipping invalid ones.
fn setup_hotkeys(config: &Config) -> HotkeyHandle {
    let mut hotkeys = Vec::new();
    for accelerator in &config.hotkeys.toggle {
        match parse_hotkey_string(accelerator) {
            Ok(hotkey) => hotkeys.push(hotkey),
            Err(e) => warn!("Invalid hotkey string in config: {}", e),
        }
    }
    let handle = register_hotkeys(hotkeys);
    info!("Registered {} toggle hotkeys", handle.registered_count());
    handle
}

/// Query the primary display, falling back to a fixed geometry when the
/// host reports none.
fn query_primary_display(query: &impl DisplayQuery) -> DisplayInfo {
    let primary = query.primary_display().unwrap_or_else(|e| {
        warn!(
            "{}; using fallback {}x{}",
            e, FALLBACK_DISPLAY_WIDTH, FALLBACK_DISPLAY_HEIGHT
        );
        DisplayInfo::at_origin(FALLBACK_DISPLAY_WIDTH, FALLBACK_DISPLAY_HEIGHT)
    });
    info!(
        "Primary display {}x{} (usable {}x{} at {},{})",
        primary.size.width,
        primary.size.height,
        primary.bounds.width,
        primary.bounds.height,
        primary.bounds.x,
        primary.bounds.y
    );
    primary
}

/// Pick the settings directory: CLI flag, then config, then platform default.
fn settings_dir(args: &Args, config: &Config) -> Option<PathBuf> {
    args.settings_dir
        .clone()
        .or_else(|| config.persistence.settings_dir.clone())
        .or_else(default_store_dir)
}

/// Resolve startup bounds. A store that cannot be created is dropped, and
/// the window falls back to the computed default without persistence.
fn startup_bounds(
    display: &DisplayInfo,
    store: Option<SettingsStore>,
) -> (WindowBounds, Option<SettingsStore>) {
    let Some(store) = store else {
        warn!("No settings directory available; window position will not persist");
        return (default_bounds(display), None);
    };

    match resolve_bounds(display, &store) {
        Ok(bounds) => (bounds, Some(store)),
        Err(e) => {
            error!("{}. Window position will not persist this session.", e);
            (default_bounds(display), None)
        }
    }
}

fn parse_log_level(level: &str) -> Level {
    match level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO, // default fallback for invalid values
    }
}

/// One line read from the control input.
#[derive(Debug, PartialEq)]
enum ControlLine {
    Line(String),
    /// The line exceeded the size limit and was skipped; carries its length.
    TooLarge(usize),
    Eof,
}

/// Read one newline-terminated line, buffering at most `limit + 1` bytes.
/// The remainder of an oversized line is consumed and discarded.
async fn read_limited_line<R>(
    reader: &mut R,
    buf: &mut Vec<u8>,
    limit: usize,
) -> io::Result<ControlLine>
where
    R: AsyncBufRead + Unpin,
{
    buf.clear();
    let read = (&mut *reader)
        .take(limit as u64 + 1)
        .read_until(b'\n', buf)
        .await?;
    if read == 0 {
        return Ok(ControlLine::Eof);
    }
    if buf.last() == Some(&b'\n') || buf.len() <= limit {
        return Ok(ControlLine::Line(String::from_utf8_lossy(buf).into_owned()));
    }

    let mut skipped = buf.len();
    loop {
        let available = reader.fill_buf().await?;
        if available.is_empty() {
            break;
        }
        let newline = available.iter().position(|&b| b == b'\n');
        let len = available.len();
        match newline {
            Some(i) => {
                reader.consume(i + 1);
                skipped += i;
                break;
            }
            None => {
                reader.consume(len);
                skipped += len;
            }
        }
    }
    Ok(ControlLine::TooLarge(skipped))
}

/// Read protocol lines from stdin, forward them to the event loop, and
/// write each response back on stdout. EOF shuts the shell down.
async fn run_control_reader(event_tx: mpsc::Sender<ShellEvent>) -> Result<()> {
    let mut reader = BufReader::new(tokio::io::stdin());
    let mut stdout = tokio::io::stdout();
    let mut buf = Vec::new();

    loop {
        let line = match read_limited_line(&mut reader, &mut buf, MAX_IPC_MESSAGE_SIZE)
            .await
            .context("Failed to read stdin")?
        {
            ControlLine::Eof => break,
            ControlLine::TooLarge(size) => {
                warn!("Dropping oversized control line ({} bytes)", size);
                Err(ProtocolError::TooLarge(size))
            }
            ControlLine::Line(line) if line.trim().is_empty() => continue,
            ControlLine::Line(line) => decode_command(&line),
        };

        let response = match line {
            Ok(cmd) => {
                let (responder, response_rx) = oneshot::channel();
                if event_tx.send(ShellEvent::Command { cmd, responder }).await.is_err() {
                    break;
                }
                match response_rx.await {
                    Ok(response) => response,
                    Err(_) => break,
                }
            }
            Err(e) => ShellResponse::error(e.to_string()),
        };

        let encoded = encode_response(&response).context("Failed to encode response")?;
        stdout.write_all(encoded.as_bytes()).await?;
        stdout.flush().await?;
    }

    debug!("Control input closed");
    let _ = event_tx.send(ShellEvent::Shutdown).await;
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Load configuration first (needed for log level)
    let loaded = match &args.config {
        Some(path) => Config::load_from_path(path),
        None => Config::load(),
    };
    let mut config = loaded.unwrap_or_else(|e| {
        // Can't use tracing yet, fall back to eprintln
        eprintln!("Failed to load configuration: {:#}. Using defaults.", e);
        Config::default()
    });
    let config_warnings = config.validate();

    // stdout carries protocol responses, so logs go to stderr
    let log_level = parse_log_level(args.log_level.as_deref().unwrap_or(&config.behavior.log_level));
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    for w in &config_warnings {
        warn!("Config: {} - {}", w.field, w.message);
    }

    info!("Chat Drop starting...");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let primary = query_primary_display(&HeadlessDisplay::default());

    let store = settings_dir(&args, &config).map(SettingsStore::new);
    if let Some(store) = &store {
        info!("Settings file: {}", store.path().display());
    }
    let (bounds, store) = startup_bounds(&primary, store);
    info!(
        "Window bounds {}x{} at ({}, {})",
        bounds.width, bounds.height, bounds.x, bounds.y
    );

    let mut window = HeadlessWindow::create(WindowOptions::overlay(bounds, config.content.url.clone()));
    window
        .set_position(bounds.origin())
        .context("Failed to position window")?;
    debug!("Injecting key listener ({} bytes)", KEY_LISTENER_SCRIPT.len());
    let zoom = ZoomLevel::new(config.content.zoom_factor);
    info!("Zoom factor {:.2}", zoom.factor());

    let controller = WindowController::start_hidden(window).context("Failed to hide window")?;
    let hotkeys = setup_hotkeys(&config);

    // Create event channel
    let (event_tx, mut event_rx) = mpsc::channel::<ShellEvent>(EVENT_CHANNEL_CAPACITY);

    let persist_tx = event_tx.clone();
    let move_debouncer = Debouncer::new(
        Duration::from_millis(config.persistence.debounce_ms),
        move |origin| {
            if let Err(e) = persist_tx.try_send(ShellEvent::PersistPosition(origin)) {
                warn!("Dropped settled window position: {}", e);
            }
        },
    );

    let mut state = AppState {
        controller,
        store,
        move_debouncer,
        zoom,
        hotkeys,
    };

    // Control protocol on stdin
    {
        let reader_tx = event_tx.clone();
        tokio::spawn(async move {
            if let Err(e) = run_control_reader(reader_tx).await {
                warn!("Control reader error: {:#}", e);
            }
        });
    }

    // Ctrl+C handler
    {
        let shutdown_tx = event_tx.clone();
        tokio::spawn(async move {
            if let Ok(()) = tokio::signal::ctrl_c().await {
                info!("Ctrl+C received, initiating shutdown...");
                let _ = shutdown_tx.send(ShellEvent::Shutdown).await;
            }
        });
    }
    drop(event_tx);

    info!("Ready. Window is hidden until toggled.");

    // Main event loop
    while let Some(event) = event_rx.recv().await {
        match event {
            ShellEvent::Command { cmd, responder } => {
                let is_stop = matches!(cmd, ShellCommand::Stop);
                let response = state.handle_command(cmd);

                // Log if client disconnected before receiving response
                if responder.send(response).is_err() {
                    debug!("Control client gone before receiving response");
                }
                if is_stop {
                    info!("Stop requested");
                    break;
                }
            }
            ShellEvent::PersistPosition(origin) => {
                state.persist_position(origin);
            }
            ShellEvent::Shutdown => {
                info!("Shutdown signal received");
                break;
            }
        }
    }

    if state.move_debouncer.is_pending() {
        debug!("Discarding unsettled window move");
    }

    info!("Chat Drop shutting down.");
    Ok(())
}
