//! Action handlers
//!
//! One handler per action kind. Each performs a single side effect and
//! returns the text shown to the user. `run_command` and `open_app` catch
//! their own failures; the rest report errors to the dispatcher.

pub mod launcher;

use crate::audit::AuditLog;
use crate::clipboard::ClipboardAccess;
use crate::config::Config;
use crate::core::protocol::ActionKind;
use crate::error::ActionError;
use crate::input::KeySimulator;
use std::process::Output;
use std::sync::Arc;
use std::time::Duration;
use tokio::process::Command;
use tracing::{info, warn};

pub use launcher::{system_launcher, AppLauncher};

/// Characters of copied text echoed back in result strings
const PREVIEW_CHARS: usize = 50;

/// Delay between cut and paste so the focused app can process the cut
const REPLACE_SETTLE: Duration = Duration::from_millis(120);

/// Result of an executed action
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionOutcome {
    pub action: ActionKind,
    pub result_text: String,
}

impl ActionOutcome {
    pub fn new(action: ActionKind, result_text: impl Into<String>) -> Self {
        Self {
            action,
            result_text: result_text.into(),
        }
    }
}

/// Side-effecting handlers and the capabilities they use
pub struct ActionHandlers {
    launcher: Arc<dyn AppLauncher>,
    clipboard: Arc<dyn ClipboardAccess>,
    keys: Arc<dyn KeySimulator>,
    music_search_url: String,
    web_search_url: String,
    audit: Option<AuditLog>,
}

impl ActionHandlers {
    pub fn new(
        launcher: Arc<dyn AppLauncher>,
        clipboard: Arc<dyn ClipboardAccess>,
        keys: Arc<dyn KeySimulator>,
        config: &Config,
    ) -> Self {
        Self {
            launcher,
            clipboard,
            keys,
            music_search_url: config.music_search_url.clone(),
            web_search_url: config.web_search_url.clone(),
            audit: None,
        }
    }

    /// Record every executed action to `audit`
    pub fn with_audit(mut self, audit: AuditLog) -> Self {
        self.audit = Some(audit);
        self
    }

    fn audit(&self, kind: ActionKind, detail: &str) {
        if let Some(audit) = &self.audit {
            if let Err(e) = audit.record(kind, detail) {
                warn!("Failed to write audit log: {}", e);
            }
        }
    }

    /// Run `command` through the platform shell
    pub async fn run_command(&self, command: &str) -> String {
        info!("🖥️ Running command: {}", command);
        self.audit(ActionKind::RunCommand, command);

        match shell_output(command).await {
            Ok(output) => command_result(command, output).unwrap_or_else(|e| e.to_string()),
            Err(e) => ActionError::Command {
                command: command.to_string(),
                reason: e.to_string(),
            }
            .to_string(),
        }
    }

    pub async fn open_app(&self, app_name: &str) -> String {
        info!("🚀 Opening app: {} (via {})", app_name, self.launcher.name());
        self.audit(ActionKind::OpenApp, app_name);

        match self.launcher.open_app(app_name).await {
            Ok(output) if output.is_empty() => format!("Opened: {app_name}"),
            Ok(output) => format!("Opened: {app_name}\n{output}"),
            Err(e) => {
                warn!("❌ {}", e);
                e.to_string()
            }
        }
    }

    pub async fn play_music(&self, query: &str) -> Result<String, ActionError> {
        let url = format!("{}{}", self.music_search_url, urlencoding::encode(query));
        info!("🎵 Playing: {}", query);
        self.audit(ActionKind::PlayMusic, &url);
        self.launcher.open_url(&url).await?;
        Ok(format!("Playing: {query}"))
    }

    /// Copy the full text; the result only echoes a preview
    pub fn copy_text(&self, text: &str) -> Result<String, ActionError> {
        self.audit(ActionKind::CopyText, &preview(text));
        self.clipboard
            .write_text(text)
            .map_err(|e| ActionError::Clipboard(e.to_string()))?;
        Ok(format!("Copied: {}", preview(text)))
    }

    /// Open http(s) URLs only
    pub async fn open_url(&self, url: &str) -> Result<String, ActionError> {
        if !url.starts_with("http") {
            warn!("🚫 Rejected URL: {}", url);
            return Ok("Invalid URL provided.".to_string());
        }

        info!("🌐 Opening URL: {}", url);
        self.audit(ActionKind::OpenUrl, url);
        self.launcher.open_url(url).await?;
        Ok(format!("Opened: {url}"))
    }

    pub async fn search_web(&self, query: &str) -> Result<String, ActionError> {
        let url = format!("{}{}", self.web_search_url, urlencoding::encode(query));
        info!("🔎 Searching: {}", query);
        self.audit(ActionKind::SearchWeb, &url);
        self.launcher.open_url(&url).await?;
        Ok(format!("Searching: {query}"))
    }

    pub fn analysis(&self, analysis: Option<&str>) -> String {
        match analysis {
            Some(text) if !text.trim().is_empty() => text.to_string(),
            _ => "No analysis provided.".to_string(),
        }
    }

    /// Confirmed replacement: cut the selection, put `new_text` on the
    /// clipboard and paste it over the cut.
    pub async fn apply_replacement(&self, new_text: &str) -> Result<String, ActionError> {
        info!("✏️ Replacing selection ({} chars)", new_text.chars().count());
        self.audit(ActionKind::ReplaceText, &preview(new_text));

        self.clipboard.hold();
        let result = self.cut_and_paste(new_text).await;
        self.clipboard.release();
        result?;

        Ok(format!("Replaced selection with: {}", preview(new_text)))
    }

    async fn cut_and_paste(&self, new_text: &str) -> Result<(), ActionError> {
        self.keys
            .cut()
            .map_err(|e| ActionError::Keystroke(e.to_string()))?;
        tokio::time::sleep(REPLACE_SETTLE).await;

        self.clipboard
            .write_text(new_text)
            .map_err(|e| ActionError::Clipboard(e.to_string()))?;

        self.keys
            .paste()
            .map_err(|e| ActionError::Keystroke(e.to_string()))
    }
}

/// First 50 characters followed by an ellipsis
pub fn preview(text: &str) -> String {
    let head: String = text.chars().take(PREVIEW_CHARS).collect();
    format!("{head}...")
}

async fn shell_output(command: &str) -> std::io::Result<Output> {
    #[cfg(windows)]
    {
        Command::new("cmd").args(["/C", command]).output().await
    }
    #[cfg(not(windows))]
    {
        Command::new("sh").args(["-c", command]).output().await
    }
}

fn command_result(command: &str, output: Output) -> Result<String, ActionError> {
    let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();

    if !output.status.success() {
        let reason = if stderr.is_empty() {
            output.status.to_string()
        } else {
            format!("{} ({})", stderr, output.status)
        };
        return Err(ActionError::Command {
            command: command.to_string(),
            reason,
        });
    }

    let mut result = format!("Executed: {command}");
    if !stdout.is_empty() {
        result.push('\n');
        result.push_str(&stdout);
    }
    if !stderr.is_empty() {
        result.push_str("\nErrors: ");
        result.push_str(&stderr);
    }
    Ok(result)
}
