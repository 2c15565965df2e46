//! Pipeline
//!
//! Runs one trigger from captured content to a terminal notification:
//! content → completion → dispatch → notification. Every run is
//! independent and gets its own [`RunId`]; overlapping runs are not
//! coalesced, so notifications arrive in completion order.

use crate::clipboard::ClipboardAccess;
use crate::content::{CapturedContent, ContentOrigin, ContentSource};
use crate::core::completion::CompletionClient;
use crate::core::dispatcher::{DispatchOutcome, Dispatcher};
use crate::core::prompts::PromptMode;
use crate::core::protocol::ActionKind;
use crate::error::ClipResult;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

/// Messages delivered to the presentation layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Notification {
    /// A completion call started (not terminal)
    Analyzing { source: ContentOrigin },
    AnalysisComplete { text: String, is_error: bool },
    ActionCompleted {
        action: Option<ActionKind>,
        message: String,
        success: bool,
    },
    AskComplete { text: String, is_error: bool },
    /// The model proposed a replacement; confirm with `confirm_replacement`
    TextReplacement { old_text: String, new_text: String },
}

impl Notification {
    /// Whether this message ends a pipeline run
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Notification::Analyzing { .. })
    }
}

/// Identifies one pipeline run
pub type RunId = u64;

/// A notification tagged with the run that produced it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunEvent {
    pub run_id: RunId,
    pub notification: Notification,
}

/// User-initiated work accepted by [`Pipeline::spawn`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Trigger {
    ManualAnalyze,
    VoiceQuery(String),
    ActionQuery(String),
    ConfirmReplacement(String),
}

/// Clipboard wrapper that records ClipMind's own writes as already seen
pub struct TrackedClipboard {
    inner: Arc<dyn ClipboardAccess>,
    source: Arc<Mutex<ContentSource>>,
}

impl TrackedClipboard {
    pub fn new(inner: Arc<dyn ClipboardAccess>, source: Arc<Mutex<ContentSource>>) -> Self {
        Self { inner, source }
    }
}

impl ClipboardAccess for TrackedClipboard {
    fn read_text(&self) -> anyhow::Result<String> {
        self.inner.read_text()
    }

    fn write_text(&self, text: &str) -> anyhow::Result<()> {
        self.inner.write_text(text)?;
        self.source
            .lock()
            .map_err(|e| anyhow::anyhow!("content lock poisoned: {}", e))?
            .note_own_write(text);
        Ok(())
    }

    fn hold(&self) {
        match self.source.lock() {
            Ok(mut source) => source.pause(),
            Err(e) => warn!("content lock poisoned: {}", e),
        }
    }

    fn release(&self) {
        let current = self.inner.read_text().ok();
        match self.source.lock() {
            Ok(mut source) => source.resume(current.as_deref()),
            Err(e) => warn!("content lock poisoned: {}", e),
        }
    }
}

/// Shared handle to the dispatch pipeline
#[derive(Clone)]
pub struct Pipeline {
    content: Arc<Mutex<ContentSource>>,
    clipboard: Arc<dyn ClipboardAccess>,
    completion: Arc<CompletionClient>,
    dispatcher: Arc<Dispatcher>,
    events: broadcast::Sender<RunEvent>,
    next_run: Arc<AtomicU64>,
    auto_analyze: bool,
}

impl Pipeline {
    pub fn new(
        content: Arc<Mutex<ContentSource>>,
        clipboard: Arc<dyn ClipboardAccess>,
        completion: CompletionClient,
        dispatcher: Dispatcher,
        auto_analyze: bool,
    ) -> Self {
        let (events, _) = broadcast::channel(64);
        Self {
            content,
            clipboard,
            completion: Arc::new(completion),
            dispatcher: Arc::new(dispatcher),
            events,
            next_run: Arc::new(AtomicU64::new(1)),
            auto_analyze,
        }
    }

    /// Receive all notifications emitted after this call
    pub fn subscribe(&self) -> broadcast::Receiver<RunEvent> {
        self.events.subscribe()
    }

    fn begin_run(&self) -> RunId {
        self.next_run.fetch_add(1, Ordering::SeqCst)
    }

    pub fn completion(&self) -> &CompletionClient {
        &self.completion
    }

    fn emit(&self, run_id: RunId, notification: Notification) {
        debug!("📣 [run {}] {:?}", run_id, notification);
        // No subscribers is fine: nobody is watching
        let _ = self.events.send(RunEvent {
            run_id,
            notification,
        });
    }

    fn selection(&self) -> ClipResult<Option<String>> {
        let content = self.content.lock()?;
        Ok(content.current_selection().map(str::to_string))
    }

    /// One clipboard poll tick. Returns whether a change was accepted; the
    /// summary for an accepted change runs as its own task so slow
    /// completions never delay the next tick.
    pub fn poll_clipboard(&self) -> ClipResult<bool> {
        let captured = {
            let mut content = self.content.lock()?;
            content.poll_clipboard(self.clipboard.as_ref())
        };

        match captured {
            Some(captured) => {
                if self.auto_analyze {
                    let pipeline = self.clone();
                    let run_id = self.begin_run();
                    tokio::spawn(async move { pipeline.analyze(run_id, captured).await });
                }
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Start `trigger` as its own task and return its run id right away
    pub fn spawn(&self, trigger: Trigger) -> RunId {
        let run_id = self.begin_run();
        let pipeline = self.clone();
        tokio::spawn(async move {
            if let Err(e) = pipeline.run(run_id, trigger).await {
                warn!("❌ Run {} failed: {}", run_id, e);
            }
        });
        run_id
    }

    async fn run(&self, run_id: RunId, trigger: Trigger) -> ClipResult<()> {
        match trigger {
            Trigger::ManualAnalyze => self.manual_analyze(run_id).await,
            Trigger::VoiceQuery(text) => {
                let captured = {
                    let content = self.content.lock()?;
                    content.submit_voice_query(&text)
                };
                self.request_action(run_id, captured).await
            }
            Trigger::ActionQuery(text) => {
                info!("💬 Action query: '{}'", text);
                let captured = CapturedContent::new(text, ContentOrigin::ManualTrigger);
                self.request_action(run_id, captured).await
            }
            Trigger::ConfirmReplacement(new_text) => {
                let outcome = self.dispatcher.confirm_replacement(&new_text).await;
                self.emit(run_id, terminal_for(outcome, true));
                Ok(())
            }
        }
    }

    /// Summarize the current clipboard on demand
    pub async fn trigger_manual_analyze(&self) -> ClipResult<()> {
        self.run(self.begin_run(), Trigger::ManualAnalyze).await
    }

    pub async fn submit_voice_query(&self, text: &str) -> ClipResult<()> {
        self.run(self.begin_run(), Trigger::VoiceQuery(text.to_string()))
            .await
    }

    pub async fn submit_action_query(&self, text: &str) -> ClipResult<()> {
        self.run(self.begin_run(), Trigger::ActionQuery(text.to_string()))
            .await
    }

    /// Apply a replacement the user accepted
    pub async fn confirm_replacement(&self, new_text: &str) -> ClipResult<()> {
        self.run(self.begin_run(), Trigger::ConfirmReplacement(new_text.to_string()))
            .await
    }

    async fn manual_analyze(&self, run_id: RunId) -> ClipResult<()> {
        let captured = {
            let mut content = self.content.lock()?;
            content.trigger_manual_analyze(self.clipboard.as_ref())
        };

        match captured {
            Ok(captured) => self.analyze(run_id, captured).await,
            Err(e) => {
                info!("📋 {}", e);
                self.emit(
                    run_id,
                    Notification::AnalysisComplete {
                        text: e.to_string(),
                        is_error: true,
                    },
                );
            }
        }
        Ok(())
    }

    async fn analyze(&self, run_id: RunId, captured: CapturedContent) {
        self.emit(run_id, Notification::Analyzing {
            source: captured.source,
        });

        let notification = match self
            .completion
            .complete(&captured.text, PromptMode::Summarize, None)
            .await
        {
            Ok(reply) => {
                let outcome = self.dispatcher.dispatch(&reply, false, None).await;
                terminal_for(outcome, false)
            }
            Err(failure) => Notification::AnalysisComplete {
                text: failure.to_string(),
                is_error: true,
            },
        };
        self.emit(run_id, notification);
    }

    async fn request_action(&self, run_id: RunId, captured: CapturedContent) -> ClipResult<()> {
        let selection = self.selection()?;
        self.emit(run_id, Notification::Analyzing {
            source: captured.source,
        });

        let notification = match self
            .completion
            .complete(&captured.text, PromptMode::ActionRequest, selection.as_deref())
            .await
        {
            Ok(reply) => {
                let outcome = self
                    .dispatcher
                    .dispatch(&reply, true, selection.as_deref())
                    .await;
                terminal_for(outcome, true)
            }
            Err(failure) => {
                warn!("❌ Completion failed: {:?}", failure);
                Notification::AskComplete {
                    text: failure.to_string(),
                    is_error: true,
                }
            }
        };
        self.emit(run_id, notification);
        Ok(())
    }
}

/// Terminal notification for a dispatch outcome
fn terminal_for(outcome: DispatchOutcome, input_was_action: bool) -> Notification {
    match outcome {
        DispatchOutcome::PlainText(text) if input_was_action => Notification::AskComplete {
            text,
            is_error: false,
        },
        DispatchOutcome::PlainText(text) => Notification::AnalysisComplete {
            text,
            is_error: false,
        },
        DispatchOutcome::Analysis(outcome) => Notification::AnalysisComplete {
            text: outcome.result_text,
            is_error: false,
        },
        DispatchOutcome::ActionCompleted(outcome) => Notification::ActionCompleted {
            action: Some(outcome.action),
            message: outcome.result_text,
            success: true,
        },
        DispatchOutcome::ReplacementRequested { old_text, new_text } => {
            Notification::TextReplacement { old_text, new_text }
        }
        DispatchOutcome::Failure(reason) => Notification::ActionCompleted {
            action: None,
            message: reason,
            success: false,
        },
    }
}
