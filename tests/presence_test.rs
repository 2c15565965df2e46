//! Fullscreen hysteresis of the presence monitor

use clipmind::presence::{Geometry, PresenceMonitor, PresenceTransition};

mod common;
use common::{MockOverlay, MockProbe};

const SCREEN: Geometry = Geometry {
    width: 1920,
    height: 1080,
};
const WINDOW: Geometry = Geometry {
    width: 800,
    height: 600,
};

fn monitor() -> (PresenceMonitor<MockProbe, MockOverlay>, MockProbe, MockOverlay) {
    let probe = MockProbe::new(SCREEN);
    let overlay = MockOverlay::new();
    let monitor = PresenceMonitor::new(probe.clone(), overlay.clone());
    (monitor, probe, overlay)
}

#[tokio::test]
async fn test_fullscreen_hides_once_and_restores_once() {
    let (mut monitor, probe, overlay) = monitor();

    probe.set_window(Some(SCREEN));
    assert_eq!(monitor.tick().await, PresenceTransition::Hidden);
    for _ in 0..5 {
        assert_eq!(monitor.tick().await, PresenceTransition::Unchanged);
    }
    assert_eq!(overlay.hide_count(), 1);
    assert!(monitor.state().hidden_for_fullscreen);

    probe.set_window(Some(WINDOW));
    assert_eq!(monitor.tick().await, PresenceTransition::Shown);
    for _ in 0..5 {
        assert_eq!(monitor.tick().await, PresenceTransition::Unchanged);
    }
    assert_eq!(overlay.show_count(), 1);
    assert!(monitor.state().visible);
    assert!(!monitor.state().hidden_for_fullscreen);
}

#[tokio::test]
async fn test_user_hide_is_never_reversed() {
    let (mut monitor, probe, overlay) = monitor();

    overlay.user_hide();
    probe.set_window(Some(WINDOW));
    for _ in 0..3 {
        assert_eq!(monitor.tick().await, PresenceTransition::Unchanged);
    }

    // Fullscreen then windowed again: the monitor never hid it, so it stays hidden
    probe.set_window(Some(SCREEN));
    assert_eq!(monitor.tick().await, PresenceTransition::Unchanged);
    probe.set_window(Some(WINDOW));
    assert_eq!(monitor.tick().await, PresenceTransition::Unchanged);

    assert_eq!(overlay.hide_count(), 0);
    assert_eq!(overlay.show_count(), 0);
    assert!(!monitor.state().visible);
}

#[tokio::test]
async fn test_geometry_failure_skips_tick() {
    let (mut monitor, probe, overlay) = monitor();

    probe.set_window(Some(SCREEN));
    assert_eq!(monitor.tick().await, PresenceTransition::Hidden);

    probe.set_window(None);
    for _ in 0..25 {
        assert_eq!(monitor.tick().await, PresenceTransition::Skipped);
    }
    assert!(monitor.state().hidden_for_fullscreen);

    probe.set_window(Some(WINDOW));
    assert_eq!(monitor.tick().await, PresenceTransition::Shown);
    assert_eq!(overlay.hide_count(), 1);
    assert_eq!(overlay.show_count(), 1);
}

#[tokio::test]
async fn test_near_fullscreen_is_not_fullscreen() {
    let (mut monitor, probe, overlay) = monitor();

    probe.set_window(Some(Geometry::new(1920, 1079)));
    assert_eq!(monitor.tick().await, PresenceTransition::Unchanged);
    assert_eq!(overlay.hide_count(), 0);
}

#[tokio::test]
async fn test_user_hide_after_fullscreen_hide_is_kept() {
    let (mut monitor, probe, overlay) = monitor();

    probe.set_window(Some(SCREEN));
    assert_eq!(monitor.tick().await, PresenceTransition::Hidden);

    // The user explicitly hides the already hidden overlay
    overlay.user_hide();
    probe.set_window(Some(WINDOW));
    assert_eq!(monitor.tick().await, PresenceTransition::Unchanged);

    assert_eq!(overlay.show_count(), 0);
    assert!(!monitor.state().hidden_for_fullscreen);
    assert!(!monitor.state().visible);
}

#[tokio::test]
async fn test_user_show_clears_fullscreen_hide() {
    let (mut monitor, probe, overlay) = monitor();

    probe.set_window(Some(SCREEN));
    assert_eq!(monitor.tick().await, PresenceTransition::Hidden);

    // User shows it and hides it again before the next windowed tick
    overlay.user_show();
    overlay.user_hide();
    probe.set_window(Some(WINDOW));
    assert_eq!(monitor.tick().await, PresenceTransition::Unchanged);
    assert_eq!(overlay.show_count(), 0);
}

#[tokio::test]
async fn test_user_show_during_fullscreen_resets_hysteresis() {
    let (mut monitor, probe, overlay) = monitor();

    probe.set_window(Some(SCREEN));
    assert_eq!(monitor.tick().await, PresenceTransition::Hidden);
    overlay.user_show();
    assert_eq!(monitor.tick().await, PresenceTransition::Hidden);
    assert_eq!(overlay.hide_count(), 2);

    overlay.user_show();
    probe.set_window(Some(WINDOW));
    assert_eq!(monitor.tick().await, PresenceTransition::Unchanged);
    overlay.user_hide();
    assert_eq!(monitor.tick().await, PresenceTransition::Unchanged);
    assert_eq!(overlay.show_count(), 0);
}

#[cfg(unix)]
#[tokio::test]
async fn test_ipc_overlay_agrees_with_monitor() {
    use clipmind::ipc::IpcOverlay;
    use clipmind::presence::OverlayWindow;

    let probe = MockProbe::new(SCREEN);
    let overlay = IpcOverlay::new();
    let mut monitor = PresenceMonitor::new(probe.clone(), overlay.clone());

    probe.set_window(Some(SCREEN));
    assert_eq!(monitor.tick().await, PresenceTransition::Hidden);
    assert!(overlay.hidden_by_monitor());

    overlay.set_visible_by_user(false);
    assert!(!overlay.hidden_by_monitor());

    probe.set_window(Some(WINDOW));
    assert_eq!(monitor.tick().await, PresenceTransition::Unchanged);
    assert!(!overlay.is_visible());
    assert_eq!(
        monitor.state().hidden_for_fullscreen,
        overlay.hidden_by_monitor()
    );
}
