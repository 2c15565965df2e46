//! IPC Server
//!
//! Unix socket server exposing the trigger surface. Triggers are
//! acknowledged immediately with their run id and run as independent
//! tasks; results reach clients that sent a `subscribe` request.

use anyhow::Result;
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use super::{IpcRequest, IpcResponse};
use crate::pipeline::{Pipeline, RunEvent, RunId, Trigger};
use crate::presence::OverlayWindow;

/// Max bytes per request line
const MAX_REQUEST_BYTES: u64 = 64 * 1024;

/// Overlay whose window lives in an IPC client. Visibility changes are
/// broadcast to subscribers.
#[derive(Clone)]
pub struct IpcOverlay {
    visible: Arc<AtomicBool>,
    hidden_by_monitor: Arc<AtomicBool>,
    events: broadcast::Sender<IpcResponse>,
}

impl IpcOverlay {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(16);
        Self {
            visible: Arc::new(AtomicBool::new(true)),
            hidden_by_monitor: Arc::new(AtomicBool::new(false)),
            events,
        }
    }

    /// User-initiated hide/show reported by the presentation layer
    pub fn set_visible_by_user(&self, visible: bool) {
        self.visible.store(visible, Ordering::SeqCst);
        self.hidden_by_monitor.store(false, Ordering::SeqCst);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<IpcResponse> {
        self.events.subscribe()
    }
}

impl Default for IpcOverlay {
    fn default() -> Self {
        Self::new()
    }
}

impl OverlayWindow for IpcOverlay {
    fn is_visible(&self) -> bool {
        self.visible.load(Ordering::SeqCst)
    }

    fn hidden_by_monitor(&self) -> bool {
        self.hidden_by_monitor.load(Ordering::SeqCst)
    }

    fn hide(&self) {
        self.visible.store(false, Ordering::SeqCst);
        self.hidden_by_monitor.store(true, Ordering::SeqCst);
        let _ = self.events.send(IpcResponse::Overlay {
            visible: false,
            focus: false,
        });
    }

    fn show_and_focus(&self) {
        self.visible.store(true, Ordering::SeqCst);
        self.hidden_by_monitor.store(false, Ordering::SeqCst);
        let _ = self.events.send(IpcResponse::Overlay {
            visible: true,
            focus: true,
        });
    }
}

/// IPC Server for the daemon
pub struct IpcServer {
    path: PathBuf,
    pipeline: Pipeline,
    overlay: IpcOverlay,
}

impl IpcServer {
    pub fn new(path: impl Into<PathBuf>, pipeline: Pipeline, overlay: IpcOverlay) -> Self {
        Self {
            path: path.into(),
            pipeline,
            overlay,
        }
    }

    /// Bind the socket with user-only permissions
    pub fn bind(&self) -> Result<UnixListener> {
        // Clean up stale socket
        if self.path.exists() {
            let _ = fs::remove_file(&self.path);
        }

        let listener = UnixListener::bind(&self.path)?;

        // Set strict permissions (user only: RW-------)
        let mut perms = fs::metadata(&self.path)?.permissions();
        perms.set_mode(0o600);
        if let Err(e) = fs::set_permissions(&self.path, perms) {
            warn!("⚠️ Failed to set strict IPC socket permissions: {}", e);
        } else {
            debug!("🔒 IPC socket permissions set to 0600");
        }

        info!("🔌 IPC server listening on {:?}", self.path);
        Ok(listener)
    }

    /// Accept clients until the listener fails
    pub async fn serve(self, listener: UnixListener) -> Result<()> {
        loop {
            let (stream, _) = listener.accept().await?;
            let pipeline = self.pipeline.clone();
            let overlay = self.overlay.clone();
            tokio::spawn(async move {
                if let Err(e) = handle_client(stream, pipeline, overlay).await {
                    warn!("IPC client error: {}", e);
                }
            });
        }
    }

    pub async fn run(self) -> Result<()> {
        let listener = self.bind()?;
        self.serve(listener).await
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for IpcServer {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.path);
    }
}

async fn write_response(
    stream: &mut (impl AsyncWrite + Unpin),
    response: &IpcResponse,
) -> Result<()> {
    let line = serde_json::to_string(response)? + "\n";
    stream.write_all(line.as_bytes()).await?;
    Ok(())
}

fn ack(seq_id: u64, message: &str) -> IpcResponse {
    IpcResponse::Ack {
        seq_id,
        success: true,
        message: Some(message.to_string()),
        run_id: None,
    }
}

fn started(seq_id: u64, message: &str, run_id: RunId) -> IpcResponse {
    debug!("▶️ Run {} started", run_id);
    IpcResponse::Ack {
        seq_id,
        success: true,
        message: Some(message.to_string()),
        run_id: Some(run_id),
    }
}

/// Handle a single client connection
async fn handle_client(stream: UnixStream, pipeline: Pipeline, overlay: IpcOverlay) -> Result<()> {
    let (read_half, mut write_half) = stream.into_split();

    // DoS Protection: Message size limit
    let mut reader = BufReader::new(read_half.take(MAX_REQUEST_BYTES));
    let mut line = String::new();
    reader.read_line(&mut line).await?;

    if line.trim().is_empty() {
        return Ok(());
    }

    let request: IpcRequest = match serde_json::from_str(line.trim()) {
        Ok(request) => request,
        Err(e) => {
            warn!("⚠️ Malformed IPC request: {}", e);
            let response = IpcResponse::Ack {
                seq_id: 0,
                success: false,
                message: Some(format!("Malformed request: {e}")),
                run_id: None,
            };
            return write_response(&mut write_half, &response).await;
        }
    };
    debug!("📨 IPC request: {:?}", request);

    let seq_id = request.seq_id();
    let response = match request {
        IpcRequest::Analyze { .. } => {
            started(seq_id, "Analyzing clipboard", pipeline.spawn(Trigger::ManualAnalyze))
        }
        IpcRequest::VoiceQuery { text, .. } => started(
            seq_id,
            "Voice query accepted",
            pipeline.spawn(Trigger::VoiceQuery(text)),
        ),
        IpcRequest::ActionQuery { text, .. } => started(
            seq_id,
            "Action query accepted",
            pipeline.spawn(Trigger::ActionQuery(text)),
        ),
        IpcRequest::ConfirmReplacement { new_text, .. } => started(
            seq_id,
            "Replacement confirmed",
            pipeline.spawn(Trigger::ConfirmReplacement(new_text)),
        ),
        IpcRequest::SetOverlayVisible { visible, .. } => {
            info!("📡 Overlay {} by user", if visible { "shown" } else { "hidden" });
            overlay.set_visible_by_user(visible);
            ack(seq_id, if visible { "Overlay shown" } else { "Overlay hidden" })
        }
        IpcRequest::StatusRequest { .. } => IpcResponse::StatusResponse {
            seq_id,
            overlay_visible: overlay.is_visible(),
            hidden_for_fullscreen: overlay.hidden_by_monitor(),
            model: pipeline.completion().model().to_string(),
            language: pipeline.completion().language().to_string(),
        },
        IpcRequest::Subscribe { .. } => {
            // Receivers exist before the ack, so nothing after it is missed
            let notifications = pipeline.subscribe();
            let overlay_events = overlay.subscribe();
            write_response(&mut write_half, &ack(seq_id, "Subscribed")).await?;
            return stream_events(&mut write_half, notifications, overlay_events).await;
        }
    };

    write_response(&mut write_half, &response).await
}

/// Forward notifications and overlay events until the client goes away
async fn stream_events(
    stream: &mut (impl AsyncWrite + Unpin),
    mut notifications: broadcast::Receiver<RunEvent>,
    mut overlay_events: broadcast::Receiver<IpcResponse>,
) -> Result<()> {
    loop {
        let response = tokio::select! {
            received = notifications.recv() => match received {
                Ok(event) => IpcResponse::Event {
                    run_id: event.run_id,
                    notification: event.notification,
                },
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    warn!("⚠️ Subscriber lagged, dropped {} notifications", n);
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => return Ok(()),
            },
            received = overlay_events.recv() => match received {
                Ok(event) => event,
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => return Ok(()),
            },
        };

        if write_response(stream, &response).await.is_err() {
            debug!("Subscriber disconnected");
            return Ok(());
        }
    }
}
