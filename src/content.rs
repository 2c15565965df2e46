//! Content Source
//!
//! Produces candidate text for the pipeline: de-duplicated clipboard polls,
//! a manual analyze trigger and spoken queries.

use crate::clipboard::ClipboardAccess;
use crate::error::ContentError;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Where captured text came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentOrigin {
    Clipboard,
    Voice,
    ManualTrigger,
}

/// Text handed to the completion orchestrator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedContent {
    pub text: String,
    pub source: ContentOrigin,
}

impl CapturedContent {
    pub fn new(text: impl Into<String>, source: ContentOrigin) -> Self {
        Self {
            text: text.into(),
            source,
        }
    }
}

/// De-duplication state for the clipboard poller
#[derive(Debug, Default)]
pub struct ContentSource {
    /// Last accepted clipboard value
    last_observed: Option<String>,
    /// Set while ClipMind itself is driving the clipboard
    paused: bool,
}

impl ContentSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one clipboard read through the change filter.
    ///
    /// Returns content only when `current` differs from the last accepted
    /// value and is not blank.
    pub fn observe(&mut self, current: &str) -> Option<CapturedContent> {
        if self.paused || current.trim().is_empty() {
            return None;
        }
        if self.last_observed.as_deref() == Some(current) {
            return None;
        }

        debug!("📋 Clipboard changed ({} chars)", current.chars().count());
        self.last_observed = Some(current.to_string());
        Some(CapturedContent::new(current, ContentOrigin::Clipboard))
    }

    /// One poll tick. Read errors count as "no change".
    pub fn poll_clipboard(&mut self, clipboard: &dyn ClipboardAccess) -> Option<CapturedContent> {
        match clipboard.read_text() {
            Ok(text) => self.observe(&text),
            Err(e) => {
                debug!("Clipboard read skipped: {}", e);
                None
            }
        }
    }

    /// Read the clipboard on demand, ignoring de-duplication
    pub fn trigger_manual_analyze(
        &mut self,
        clipboard: &dyn ClipboardAccess,
    ) -> Result<CapturedContent, ContentError> {
        let text = clipboard
            .read_text()
            .map_err(|_| ContentError::EmptyClipboard)?;
        if text.trim().is_empty() {
            return Err(ContentError::EmptyClipboard);
        }

        info!("🔍 Manual analyze ({} chars)", text.chars().count());
        self.last_observed = Some(text.clone());
        Ok(CapturedContent::new(text, ContentOrigin::ManualTrigger))
    }

    /// Spoken queries are always accepted
    pub fn submit_voice_query(&self, text: &str) -> CapturedContent {
        info!("🎙️ Voice query: '{}'", text);
        CapturedContent::new(text, ContentOrigin::Voice)
    }

    /// Record text written to the clipboard by ClipMind itself so the next
    /// poll does not treat it as a new copy.
    pub fn note_own_write(&mut self, text: &str) {
        self.last_observed = Some(text.to_string());
    }

    /// Ignore clipboard changes until [`resume`](Self::resume)
    pub fn pause(&mut self) {
        self.paused = true;
    }

    /// Accept changes again. `current` is what the clipboard holds now and
    /// counts as already seen.
    pub fn resume(&mut self, current: Option<&str>) {
        self.paused = false;
        if let Some(text) = current.filter(|t| !t.trim().is_empty()) {
            self.last_observed = Some(text.to_string());
        }
    }

    /// Most recent clipboard text, used as the "highlighted text" context
    pub fn current_selection(&self) -> Option<&str> {
        self.last_observed.as_deref()
    }
}
