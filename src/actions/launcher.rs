//! Platform launchers
//!
//! Opening applications and URLs differs per OS family. One implementation
//! per family is compiled in and chosen by [`system_launcher`].

use crate::error::ActionError;
use async_trait::async_trait;
use std::process::Output;
use tokio::process::Command;
use tracing::debug;

/// Opens applications and URLs outside ClipMind
#[async_trait]
pub trait AppLauncher: Send + Sync {
    /// Launch an application by name. Returns any output the launcher printed.
    async fn open_app(&self, app_name: &str) -> Result<String, ActionError>;

    /// Open a URL in the default browser
    async fn open_url(&self, url: &str) -> Result<(), ActionError>;

    /// Get the launcher name
    fn name(&self) -> &str;
}

/// Launcher for the platform this binary was built for
pub fn system_launcher() -> Box<dyn AppLauncher> {
    #[cfg(target_os = "windows")]
    {
        Box::new(WindowsLauncher)
    }
    #[cfg(target_os = "macos")]
    {
        Box::new(MacLauncher)
    }
    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    {
        Box::new(LinuxLauncher)
    }
}

fn launch_error(app: &str, reason: impl ToString) -> ActionError {
    ActionError::Launch {
        app: app.to_string(),
        reason: reason.to_string(),
    }
}

/// Combined stdout/stderr of a finished launcher, or its failure
fn launcher_output(app: &str, output: Output) -> Result<String, ActionError> {
    let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();

    if !output.status.success() {
        let reason = if stderr.is_empty() {
            output.status.to_string()
        } else {
            stderr
        };
        return Err(launch_error(app, reason));
    }

    Ok(match (stdout.is_empty(), stderr.is_empty()) {
        (true, true) => String::new(),
        (false, true) => stdout,
        (true, false) => stderr,
        (false, false) => format!("{stdout}\n{stderr}"),
    })
}

/// `cmd /C start`
#[cfg(target_os = "windows")]
pub struct WindowsLauncher;

#[cfg(target_os = "windows")]
#[async_trait]
impl AppLauncher for WindowsLauncher {
    async fn open_app(&self, app_name: &str) -> Result<String, ActionError> {
        let output = Command::new("cmd")
            .args(["/C", "start", "", app_name])
            .output()
            .await
            .map_err(|e| launch_error(app_name, e))?;
        launcher_output(app_name, output)
    }

    async fn open_url(&self, url: &str) -> Result<(), ActionError> {
        Command::new("cmd").args(["/C", "start", "", url]).spawn()?;
        Ok(())
    }

    fn name(&self) -> &str {
        "windows"
    }
}

/// `open -a`
#[cfg(target_os = "macos")]
pub struct MacLauncher;

#[cfg(target_os = "macos")]
#[async_trait]
impl AppLauncher for MacLauncher {
    async fn open_app(&self, app_name: &str) -> Result<String, ActionError> {
        let output = Command::new("open")
            .args(["-a", app_name])
            .output()
            .await
            .map_err(|e| launch_error(app_name, e))?;
        launcher_output(app_name, output)
    }

    async fn open_url(&self, url: &str) -> Result<(), ActionError> {
        Command::new("open").arg(url).spawn()?;
        Ok(())
    }

    fn name(&self) -> &str {
        "macos"
    }
}

/// `gtk-launch` with a direct exec fallback, `xdg-open` for URLs
#[cfg(not(any(target_os = "windows", target_os = "macos")))]
pub struct LinuxLauncher;

#[cfg(not(any(target_os = "windows", target_os = "macos")))]
#[async_trait]
impl AppLauncher for LinuxLauncher {
    async fn open_app(&self, app_name: &str) -> Result<String, ActionError> {
        let desktop_id = app_name.trim().to_lowercase();
        match Command::new("gtk-launch").arg(&desktop_id).output().await {
            Ok(output) if output.status.success() => return launcher_output(app_name, output),
            Ok(output) => debug!(
                "gtk-launch {} failed ({}), trying direct exec",
                desktop_id, output.status
            ),
            Err(e) => debug!("gtk-launch unavailable ({}), trying direct exec", e),
        }

        let mut parts = app_name.split_whitespace();
        let program = parts
            .next()
            .ok_or_else(|| launch_error(app_name, "empty application name"))?;
        let child = Command::new(program)
            .args(parts)
            .spawn()
            .map_err(|e| launch_error(app_name, e))?;
        debug!("Spawned {} (pid {:?})", program, child.id());
        Ok(String::new())
    }

    async fn open_url(&self, url: &str) -> Result<(), ActionError> {
        Command::new("xdg-open").arg(url).spawn()?;
        Ok(())
    }

    fn name(&self) -> &str {
        "linux"
    }
}
