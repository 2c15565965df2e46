//! ClipMind - clipboard and voice driven desktop assistant
//!
//! Daemon: polls the clipboard, runs the presence monitor and serves the
//! IPC trigger surface.

use anyhow::{Context, Result};
use clap::Parser;
use clipmind::actions::{system_launcher, ActionHandlers};
use clipmind::audit::AuditLog;
use clipmind::clipboard::{ClipboardAccess, SystemClipboard};
use clipmind::config::Config;
use clipmind::content::ContentSource;
use clipmind::core::completion::CompletionClient;
use clipmind::core::dispatcher::Dispatcher;
use clipmind::input::system_keys;
use clipmind::pipeline::{Pipeline, TrackedClipboard};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Config file (defaults to ~/.config/clipmind/config.json)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// IPC socket path
    #[arg(long)]
    socket: Option<PathBuf>,

    /// Do not start the fullscreen presence monitor
    #[arg(long)]
    no_presence: bool,

    /// Do not summarize clipboard changes automatically
    #[arg(long)]
    no_auto_analyze: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    if args.no_auto_analyze {
        config.auto_analyze = false;
    }

    // Setup logging
    let level = if args.verbose {
        "debug".to_string()
    } else {
        config.log_level.to_lowercase()
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("🧠 ClipMind v{} starting...", env!("CARGO_PKG_VERSION"));
    info!(
        "   Model: {} | Language: {}",
        config.model, config.response_language
    );
    if config.api_key().is_none() {
        warn!("🔑 No API key configured; set api_key in the config or CLIPMIND_API_KEY");
    }

    let clipboard: Arc<dyn ClipboardAccess> =
        Arc::new(SystemClipboard::new().context("ClipMind needs a clipboard")?);
    let content = Arc::new(Mutex::new(ContentSource::new()));
    let tracked: Arc<dyn ClipboardAccess> =
        Arc::new(TrackedClipboard::new(clipboard.clone(), content.clone()));

    let handlers = ActionHandlers::new(
        Arc::from(system_launcher()),
        tracked,
        Arc::from(system_keys()),
        &config,
    )
    .with_audit(AuditLog::default_location());

    let pipeline = Pipeline::new(
        content,
        clipboard,
        CompletionClient::new(&config),
        Dispatcher::new(handlers),
        config.auto_analyze,
    );

    // Clipboard poller
    {
        let pipeline = pipeline.clone();
        let mut ticker = tokio::time::interval(config.clipboard_poll_interval());
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        tokio::spawn(async move {
            loop {
                ticker.tick().await;
                if let Err(e) = pipeline.poll_clipboard() {
                    warn!("Clipboard poll failed: {}", e);
                }
            }
        });
        info!("📋 Clipboard polling every {:?}", config.clipboard_poll_interval());
    }

    #[cfg(unix)]
    serve(&args, &config, pipeline).await?;

    #[cfg(not(unix))]
    run_headless(pipeline).await;

    Ok(())
}

/// Presence monitor plus the IPC trigger surface, until Ctrl+C
#[cfg(unix)]
async fn serve(args: &Args, config: &Config, pipeline: Pipeline) -> Result<()> {
    use clipmind::ipc::{socket_path, IpcOverlay, IpcServer};
    use clipmind::presence::{HyprlandProbe, PresenceMonitor};

    let overlay = IpcOverlay::new();

    if args.no_presence {
        info!("🪟 Presence monitor disabled");
    } else if let Some(probe) = HyprlandProbe::detect() {
        let monitor = PresenceMonitor::new(probe, overlay.clone());
        tokio::spawn(monitor.run(config.presence_poll_interval()));
    } else {
        info!("🪟 No active-window query on this platform, presence monitor not started");
    }

    let server = IpcServer::new(
        args.socket.clone().unwrap_or_else(socket_path),
        pipeline,
        overlay,
    );

    info!("✅ ClipMind ready");
    tokio::select! {
        result = server.run() => result?,
        _ = tokio::signal::ctrl_c() => info!("👋 Shutting down"),
    }
    Ok(())
}

/// No socket transport here: log clipboard summaries until Ctrl+C
#[cfg(not(unix))]
async fn run_headless(pipeline: Pipeline) {
    warn!("🔌 IPC triggers need a Unix socket; only clipboard summaries run on this platform");
    let mut events = pipeline.subscribe();
    info!("✅ ClipMind ready");
    loop {
        tokio::select! {
            received = events.recv() => match received {
                Ok(event) if event.notification.is_terminal() => {
                    info!("📣 {:?}", event.notification)
                }
                Ok(_) => {}
                Err(tokio::sync::broadcast::error::RecvError::Lagged(_)) => {}
                Err(tokio::sync::broadcast::error::RecvError::Closed) => return,
            },
            _ = tokio::signal::ctrl_c() => {
                info!("👋 Shutting down");
                return;
            }
        }
    }
}
