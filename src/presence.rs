//! Presence Monitor
//!
//! Hides the overlay while a fullscreen application is in front and brings
//! it back afterwards. Only hides made by the monitor itself are reversed.

use crate::error::PresenceError;
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, info, warn};

/// Consecutive failed ticks before a diagnostic is logged
const FAILURE_WARN_THRESHOLD: u32 = 20;

/// Width and height in logical pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Geometry {
    pub width: u32,
    pub height: u32,
}

impl Geometry {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// Source of window geometry
#[async_trait]
pub trait WindowProbe: Send + Sync {
    /// Size of the currently focused window
    async fn active_window(&self) -> Result<Geometry, PresenceError>;

    /// Usable area of the primary screen
    async fn work_area(&self) -> Result<Geometry, PresenceError>;
}

/// The overlay window, owned by the presentation layer
pub trait OverlayWindow: Send + Sync {
    fn is_visible(&self) -> bool;

    /// True only while the last visibility change was a monitor `hide`.
    /// Any user hide or show clears it.
    fn hidden_by_monitor(&self) -> bool;

    fn hide(&self);
    fn show_and_focus(&self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PresenceState {
    pub visible: bool,
    pub hidden_for_fullscreen: bool,
}

impl Default for PresenceState {
    fn default() -> Self {
        Self {
            visible: true,
            hidden_for_fullscreen: false,
        }
    }
}

/// What one tick did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresenceTransition {
    Hidden,
    Shown,
    Unchanged,
    /// Geometry unavailable, tick skipped
    Skipped,
}

pub struct PresenceMonitor<P: WindowProbe, O: OverlayWindow> {
    probe: P,
    overlay: O,
    state: PresenceState,
    consecutive_failures: u32,
}

impl<P: WindowProbe, O: OverlayWindow> PresenceMonitor<P, O> {
    pub fn new(probe: P, overlay: O) -> Self {
        Self {
            probe,
            overlay,
            state: PresenceState::default(),
            consecutive_failures: 0,
        }
    }

    pub fn state(&self) -> PresenceState {
        self.state
    }

    /// One polling step
    pub async fn tick(&mut self) -> PresenceTransition {
        self.state.visible = self.overlay.is_visible();
        // The user took over visibility since our hide
        if self.state.hidden_for_fullscreen
            && (self.state.visible || !self.overlay.hidden_by_monitor())
        {
            debug!("Overlay visibility changed by user, dropping fullscreen hide");
            self.state.hidden_for_fullscreen = false;
        }

        let (window, screen) = match self.geometry().await {
            Ok(pair) => {
                if self.consecutive_failures >= FAILURE_WARN_THRESHOLD {
                    info!("🪟 Window geometry available again");
                }
                self.consecutive_failures = 0;
                pair
            }
            Err(e) => {
                self.consecutive_failures += 1;
                if self.consecutive_failures == FAILURE_WARN_THRESHOLD {
                    warn!(
                        "⚠️ Window geometry unavailable for {} consecutive polls: {}",
                        self.consecutive_failures, e
                    );
                } else {
                    debug!("Presence tick skipped: {}", e);
                }
                return PresenceTransition::Skipped;
            }
        };

        let fullscreen = window == screen;

        if fullscreen {
            if self.state.visible {
                info!("🙈 Fullscreen app detected, hiding overlay");
                self.overlay.hide();
                self.state.visible = false;
                self.state.hidden_for_fullscreen = true;
                return PresenceTransition::Hidden;
            }
        } else if !self.state.visible && self.state.hidden_for_fullscreen {
            info!("👀 Fullscreen app gone, showing overlay");
            self.overlay.show_and_focus();
            self.state.visible = true;
            self.state.hidden_for_fullscreen = false;
            return PresenceTransition::Shown;
        }

        PresenceTransition::Unchanged
    }

    async fn geometry(&self) -> Result<(Geometry, Geometry), PresenceError> {
        let window = self.probe.active_window().await?;
        let screen = self.probe.work_area().await?;
        Ok((window, screen))
    }

    /// Tick forever at `interval`
    pub async fn run(mut self, interval: Duration) {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        info!("🪟 Presence monitor running");
        loop {
            ticker.tick().await;
            self.tick().await;
        }
    }
}

#[derive(Debug, Deserialize)]
struct HyprWindow {
    size: [i64; 2],
}

#[derive(Debug, Deserialize)]
struct HyprMonitor {
    id: i64,
    width: i64,
    height: i64,
    #[serde(default = "default_scale")]
    scale: f64,
    /// left, top, right, bottom
    #[serde(default)]
    reserved: [i64; 4],
}

fn default_scale() -> f64 {
    1.0
}

/// Geometry via `hyprctl` on Hyprland
pub struct HyprlandProbe;

impl HyprlandProbe {
    /// Available only inside a Hyprland session
    pub fn detect() -> Option<Self> {
        if cfg!(target_os = "linux") && std::env::var_os("HYPRLAND_INSTANCE_SIGNATURE").is_some()
        {
            Some(Self)
        } else {
            None
        }
    }

    async fn query(args: &[&str]) -> Result<String, PresenceError> {
        let output = Command::new("hyprctl").args(args).output().await?;
        if !output.status.success() {
            return Err(PresenceError::Query(
                String::from_utf8_lossy(&output.stderr).to_string(),
            ));
        }
        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }
}

#[async_trait]
impl WindowProbe for HyprlandProbe {
    async fn active_window(&self) -> Result<Geometry, PresenceError> {
        let raw = Self::query(&["activewindow", "-j"]).await?;
        parse_active_window(&raw)
    }

    async fn work_area(&self) -> Result<Geometry, PresenceError> {
        let raw = Self::query(&["monitors", "-j"]).await?;
        parse_work_area(&raw)
    }
}

fn parse_active_window(raw: &str) -> Result<Geometry, PresenceError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "{}" || trimmed == "Invalid" {
        return Err(PresenceError::NoActiveWindow);
    }
    let window: HyprWindow = serde_json::from_str(trimmed)?;
    Ok(Geometry::new(
        window.size[0].max(0) as u32,
        window.size[1].max(0) as u32,
    ))
}

/// Work area of monitor 0 (or the first listed): logical size minus reserved edges
fn parse_work_area(raw: &str) -> Result<Geometry, PresenceError> {
    let monitors: Vec<HyprMonitor> = serde_json::from_str(raw.trim())?;
    let primary = monitors
        .iter()
        .find(|m| m.id == 0)
        .or_else(|| monitors.first())
        .ok_or_else(|| PresenceError::Query("no monitors reported".to_string()))?;

    let scale = if primary.scale > 0.0 { primary.scale } else { 1.0 };
    let logical_w = (primary.width as f64 / scale).round() as i64;
    let logical_h = (primary.height as f64 / scale).round() as i64;
    let [left, top, right, bottom] = primary.reserved;

    Ok(Geometry::new(
        (logical_w - left - right).max(0) as u32,
        (logical_h - top - bottom).max(0) as u32,
    ))
}
