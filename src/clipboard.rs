//! System clipboard access
//!
//! The rest of the crate only sees [`ClipboardAccess`], so tests can swap in
//! an in-memory clipboard.

use anyhow::{Context, Result};
use std::sync::{Arc, Mutex};
use tracing::debug;

/// Read/write access to the text clipboard
pub trait ClipboardAccess: Send + Sync {
    /// Current clipboard text. Errors when the clipboard is empty or non-text.
    fn read_text(&self) -> Result<String>;

    /// Replace the clipboard contents with `text`
    fn write_text(&self, text: &str) -> Result<()>;

    /// ClipMind is about to change the clipboard through other means
    /// (simulated cut/paste). Watchers should not report it as a copy.
    fn hold(&self) {}

    /// End a [`hold`](Self::hold)
    fn release(&self) {}
}

/// Clipboard backed by `arboard`
pub struct SystemClipboard {
    inner: Arc<Mutex<arboard::Clipboard>>,
}

impl SystemClipboard {
    pub fn new() -> Result<Self> {
        let clipboard = arboard::Clipboard::new().context("Failed to open system clipboard")?;
        Ok(Self {
            inner: Arc::new(Mutex::new(clipboard)),
        })
    }
}

impl ClipboardAccess for SystemClipboard {
    fn read_text(&self) -> Result<String> {
        let mut clipboard = self
            .inner
            .lock()
            .map_err(|e| anyhow::anyhow!("clipboard lock poisoned: {}", e))?;
        Ok(clipboard.get_text()?)
    }

    fn write_text(&self, text: &str) -> Result<()> {
        let mut clipboard = self
            .inner
            .lock()
            .map_err(|e| anyhow::anyhow!("clipboard lock poisoned: {}", e))?;
        clipboard.set_text(text.to_string())?;
        debug!("📋 Clipboard written ({} chars)", text.chars().count());
        Ok(())
    }
}
