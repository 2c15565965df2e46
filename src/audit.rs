use crate::core::protocol::ActionKind;
use anyhow::Result;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Append-only log of actions executed on behalf of the model
#[derive(Debug, Clone)]
pub struct AuditLog {
    path: PathBuf,
}

impl AuditLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `~/.config/clipmind/actions.log`
    pub fn default_location() -> Self {
        Self::new(crate::config::config_dir().join("actions.log"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write an entry for an executed action
    pub fn record(&self, kind: ActionKind, detail: &str) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        writeln!(
            file,
            "[{}] ACTION: {} | {}",
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
            kind,
            detail.replace('\n', "\\n")
        )?;
        Ok(())
    }
}
