//! Shared test doubles
//!
//! Capability mocks record what the pipeline asked of the desktop into one
//! shared event log so tests can check ordering across capabilities.

#![allow(dead_code)]

use anyhow::Result;
use async_trait::async_trait;
use clipmind::actions::{ActionHandlers, AppLauncher};
use clipmind::clipboard::ClipboardAccess;
use clipmind::config::Config;
use clipmind::content::ContentSource;
use clipmind::core::completion::CompletionClient;
use clipmind::core::dispatcher::Dispatcher;
use clipmind::error::{ActionError, PresenceError};
use clipmind::input::KeySimulator;
use clipmind::pipeline::{Pipeline, TrackedClipboard};
use clipmind::presence::{Geometry, OverlayWindow, WindowProbe};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Ordered record of side effects
pub type EventLog = Arc<Mutex<Vec<String>>>;

pub fn event_log() -> EventLog {
    Arc::new(Mutex::new(Vec::new()))
}

/// In-memory clipboard
pub struct MockClipboard {
    pub contents: Mutex<Option<String>>,
    pub log: EventLog,
}

impl MockClipboard {
    pub fn new(log: EventLog) -> Self {
        Self {
            contents: Mutex::new(None),
            log,
        }
    }

    pub fn with_text(log: EventLog, text: &str) -> Self {
        let clipboard = Self::new(log);
        clipboard.set(text);
        clipboard
    }

    /// Simulate the user copying `text`
    pub fn set(&self, text: &str) {
        *self.contents.lock().unwrap() = Some(text.to_string());
    }

    pub fn current(&self) -> Option<String> {
        self.contents.lock().unwrap().clone()
    }
}

impl ClipboardAccess for MockClipboard {
    fn read_text(&self) -> Result<String> {
        self.contents
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| anyhow::anyhow!("clipboard is empty"))
    }

    fn write_text(&self, text: &str) -> Result<()> {
        self.log.lock().unwrap().push(format!("write:{text}"));
        self.set(text);
        Ok(())
    }
}

/// Launcher that records instead of spawning
#[derive(Default)]
pub struct MockLauncher {
    pub apps: Mutex<Vec<String>>,
    pub urls: Mutex<Vec<String>>,
    pub fail: AtomicBool,
}

impl MockLauncher {
    pub fn opened_urls(&self) -> Vec<String> {
        self.urls.lock().unwrap().clone()
    }

    pub fn opened_apps(&self) -> Vec<String> {
        self.apps.lock().unwrap().clone()
    }
}

#[async_trait]
impl AppLauncher for MockLauncher {
    async fn open_app(&self, app_name: &str) -> Result<String, ActionError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(ActionError::Launch {
                app: app_name.to_string(),
                reason: "not installed".to_string(),
            });
        }
        self.apps.lock().unwrap().push(app_name.to_string());
        Ok(String::new())
    }

    async fn open_url(&self, url: &str) -> Result<(), ActionError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(ActionError::Launch {
                app: url.to_string(),
                reason: "no browser".to_string(),
            });
        }
        self.urls.lock().unwrap().push(url.to_string());
        Ok(())
    }

    fn name(&self) -> &str {
        "mock"
    }
}

/// Key simulator that records chords
pub struct MockKeys {
    pub log: EventLog,
}

impl KeySimulator for MockKeys {
    fn cut(&self) -> Result<()> {
        self.log.lock().unwrap().push("cut".to_string());
        Ok(())
    }

    fn paste(&self) -> Result<()> {
        self.log.lock().unwrap().push("paste".to_string());
        Ok(())
    }
}

/// Probe with a settable active window. `None` means the query fails.
#[derive(Clone)]
pub struct MockProbe {
    pub window: Arc<Mutex<Option<Geometry>>>,
    pub screen: Geometry,
}

impl MockProbe {
    pub fn new(screen: Geometry) -> Self {
        Self {
            window: Arc::new(Mutex::new(None)),
            screen,
        }
    }

    pub fn set_window(&self, window: Option<Geometry>) {
        *self.window.lock().unwrap() = window;
    }
}

#[async_trait]
impl WindowProbe for MockProbe {
    async fn active_window(&self) -> Result<Geometry, PresenceError> {
        (*self.window.lock().unwrap()).ok_or(PresenceError::NoActiveWindow)
    }

    async fn work_area(&self) -> Result<Geometry, PresenceError> {
        Ok(self.screen)
    }
}

/// Overlay that counts monitor-driven hides and shows
#[derive(Clone)]
pub struct MockOverlay {
    pub visible: Arc<AtomicBool>,
    pub monitor_hidden: Arc<AtomicBool>,
    pub hides: Arc<AtomicUsize>,
    pub shows: Arc<AtomicUsize>,
}

impl MockOverlay {
    pub fn new() -> Self {
        Self {
            visible: Arc::new(AtomicBool::new(true)),
            monitor_hidden: Arc::new(AtomicBool::new(false)),
            hides: Arc::new(AtomicUsize::new(0)),
            shows: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Simulate the user hiding the overlay
    pub fn user_hide(&self) {
        self.visible.store(false, Ordering::SeqCst);
        self.monitor_hidden.store(false, Ordering::SeqCst);
    }

    /// Simulate the user bringing the overlay back
    pub fn user_show(&self) {
        self.visible.store(true, Ordering::SeqCst);
        self.monitor_hidden.store(false, Ordering::SeqCst);
    }

    pub fn hide_count(&self) -> usize {
        self.hides.load(Ordering::SeqCst)
    }

    pub fn show_count(&self) -> usize {
        self.shows.load(Ordering::SeqCst)
    }
}

impl OverlayWindow for MockOverlay {
    fn is_visible(&self) -> bool {
        self.visible.load(Ordering::SeqCst)
    }

    fn hidden_by_monitor(&self) -> bool {
        self.monitor_hidden.load(Ordering::SeqCst)
    }

    fn hide(&self) {
        self.visible.store(false, Ordering::SeqCst);
        self.monitor_hidden.store(true, Ordering::SeqCst);
        self.hides.fetch_add(1, Ordering::SeqCst);
    }

    fn show_and_focus(&self) {
        self.visible.store(true, Ordering::SeqCst);
        self.monitor_hidden.store(false, Ordering::SeqCst);
        self.shows.fetch_add(1, Ordering::SeqCst);
    }
}

/// Everything a pipeline test needs to inspect afterwards
pub struct TestRig {
    pub log: EventLog,
    pub clipboard: Arc<MockClipboard>,
    pub launcher: Arc<MockLauncher>,
    pub content: Arc<Mutex<ContentSource>>,
    pub pipeline: Pipeline,
}

/// Config pointing the completion client at `api_url`
pub fn test_config(api_url: &str, api_key: &str) -> Config {
    Config {
        api_url: api_url.to_string(),
        api_key: api_key.to_string(),
        request_timeout_ms: 2_000,
        ..Config::default()
    }
}

pub fn handlers(
    launcher: Arc<MockLauncher>,
    clipboard: Arc<dyn ClipboardAccess>,
    log: EventLog,
) -> ActionHandlers {
    ActionHandlers::new(
        launcher,
        clipboard,
        Arc::new(MockKeys { log }),
        &Config::default(),
    )
}

impl TestRig {
    pub fn new(config: &Config) -> Self {
        let log = event_log();
        let clipboard = Arc::new(MockClipboard::new(log.clone()));
        let launcher = Arc::new(MockLauncher::default());
        let content = Arc::new(Mutex::new(ContentSource::new()));
        let tracked: Arc<dyn ClipboardAccess> =
            Arc::new(TrackedClipboard::new(clipboard.clone(), content.clone()));

        let pipeline = Pipeline::new(
            content.clone(),
            clipboard.clone(),
            CompletionClient::new(config),
            Dispatcher::new(handlers(launcher.clone(), tracked, log.clone())),
            config.auto_analyze,
        );

        Self {
            log,
            clipboard,
            launcher,
            content,
            pipeline,
        }
    }

    pub fn events(&self) -> Vec<String> {
        self.log.lock().unwrap().clone()
    }
}

/// Chat-completions body whose reply is `content`
pub fn completion_body(content: &str) -> String {
    serde_json::json!({
        "choices": [{"message": {"role": "assistant", "content": content}}]
    })
    .to_string()
}
