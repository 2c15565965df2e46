//! ClipMind Library
//!
//! Core modules for the ClipMind desktop assistant: content capture, the
//! completion call, the action protocol, action handlers and the presence
//! monitor.

pub mod actions;
pub mod audit;
pub mod clipboard;
pub mod config;
pub mod content;
pub mod core;
pub mod error;
pub mod i18n;
pub mod input;
#[cfg(unix)]
pub mod ipc;
pub mod pipeline;
pub mod presence;
