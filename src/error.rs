//! ClipMind Error Types
//!
//! One error enum per pipeline stage, plus a crate-wide wrapper.

use thiserror::Error;

/// Why a remote completion produced no text
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    #[error("No API key configured. Add one to the ClipMind settings.")]
    NoApiKey,

    #[error("Invalid API key. Check the key in the ClipMind settings.")]
    Unauthorized,

    #[error("The model is unavailable or rejected the request. Check the model name.")]
    ModelUnavailable,

    #[error("Network error or the request timed out.")]
    NetworkOrTimeout,

    #[error("The model returned an empty or unreadable response.")]
    MalformedResponse,
}

/// Content acquisition errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ContentError {
    #[error("Clipboard is empty. Copy some text first.")]
    EmptyClipboard,
}

/// Failure of a single action side effect
#[derive(Error, Debug)]
pub enum ActionError {
    #[error("Failed to execute '{command}': {reason}")]
    Command { command: String, reason: String },

    #[error("Failed to open '{app}': {reason}")]
    Launch { app: String, reason: String },

    #[error("Clipboard error: {0}")]
    Clipboard(String),

    #[error("Keystroke simulation error: {0}")]
    Keystroke(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Active-window geometry could not be read
#[derive(Error, Debug)]
pub enum PresenceError {
    #[error("Window query failed: {0}")]
    Query(String),

    #[error("No active window")]
    NoActiveWindow,

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Central error type for ClipMind
#[derive(Error, Debug)]
pub enum ClipError {
    #[error("Lock poisoned: {0}")]
    Lock(String),

    #[error(transparent)]
    Completion(#[from] FailureKind),

    #[error(transparent)]
    Content(#[from] ContentError),

    #[error(transparent)]
    Action(#[from] ActionError),

    #[error(transparent)]
    Presence(#[from] PresenceError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias for ClipMind operations
pub type ClipResult<T> = Result<T, ClipError>;

/// Helper to convert Mutex poison errors
impl<T> From<std::sync::PoisonError<T>> for ClipError {
    fn from(err: std::sync::PoisonError<T>) -> Self {
        ClipError::Lock(err.to_string())
    }
}
