use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

use chatpane_core::{ChatClient, ChatState, Config, Dispatcher, FilePreferenceStore, StaticHost};

mod app;
mod handler;
mod tui;
mod ui;
mod wrap;

use app::App;
use tui::EventHandler;

const DEFAULT_LOG_FILTER: &str = "chatpane=info,chatpane_core=info";

/// Terminal chat client
#[derive(Parser)]
#[command(name = "chatpane", version, about)]
struct Cli {
    /// Origin of the chat backend, e.g. http://localhost:3000
    #[arg(long)]
    origin: Option<String>,

    /// Preferences file (defaults to the config directory)
    #[arg(long)]
    prefs: Option<PathBuf>,

    /// Log file (defaults to the data directory)
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Write the effective origin to the config file before starting
    #[arg(long)]
    save_config: bool,
}

fn default_log_file() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("chatpane")
        .join("chatpane.log")
}

/// Log to a file; the terminal belongs to the UI
fn init_logging(path: &PathBuf, config: &Config) -> Result<tracing_appender::non_blocking::WorkerGuard> {
    let dir = path.parent().context("log file has no parent directory")?;
    std::fs::create_dir_all(dir)
        .with_context(|| format!("creating log directory {}", dir.display()))?;
    let file_name = path.file_name().context("log file has no name")?;

    let appender = tracing_appender::rolling::never(dir, file_name);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(config.log_filter.as_deref().unwrap_or(DEFAULT_LOG_FILTER))
        }))
        .with_writer(writer)
        .with_ansi(false)
        .init();

    Ok(guard)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = Config::load()?;
    if let Some(origin) = &cli.origin {
        config.origin = Some(origin.clone());
    }

    let log_file = cli.log_file.unwrap_or_else(default_log_file);
    let _guard = init_logging(&log_file, &config)?;

    let origin = config.origin().to_string();
    let host = StaticHost::parse(&origin)?;

    if cli.save_config {
        config.save()?;
        tracing::info!(origin = %origin, "config saved");
    }

    let prefs_path = match cli.prefs {
        Some(path) => path,
        None => Config::preferences_path()?,
    };
    let prefs = FilePreferenceStore::open(&prefs_path)?;

    tracing::info!(origin = %origin, prefs = %prefs.path().display(), "starting");

    let chat = ChatState::load(Box::new(prefs));
    let dispatcher = Dispatcher::new(ChatClient::new(), Arc::new(host));
    let (reply_tx, mut reply_rx) = mpsc::unbounded_channel();
    let mut app = App::new(chat, dispatcher, reply_tx);

    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let mut events = EventHandler::new();

    let result = async {
        while !app.should_quit {
            terminal.draw(|frame| ui::render(&mut app, frame))?;

            tokio::select! {
                Some(event) = events.next() => handler::handle_event(&mut app, event),
                Some(reply) = reply_rx.recv() => app.receive_reply(reply),
                else => break,
            }
        }
        Ok::<(), anyhow::Error>(())
    }
    .await;

    tui::restore()?;
    tracing::info!("exiting");
    result
}
