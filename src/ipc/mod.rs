//! IPC (Inter-Process Communication) Module
//!
//! Unix socket communication between the ClipMind daemon and the
//! presentation layer. Protocol: JSON over newline-delimited messages.

pub mod client;
pub mod messages;
pub mod server;

pub use client::IpcClient;
pub use messages::*;
pub use server::{IpcOverlay, IpcServer};

use std::path::PathBuf;

/// Get the Unix socket path for IPC
pub fn socket_path() -> PathBuf {
    let user = std::env::var("USER").unwrap_or_else(|_| "clipmind".to_string());
    PathBuf::from(format!("/tmp/clipmind-{}.sock", user))
}
