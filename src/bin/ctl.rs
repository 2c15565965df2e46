//! clipmind-ctl - command line front end for the ClipMind daemon
//!
//! Sends triggers over the IPC socket and prints the resulting
//! notifications. Bind it to hotkeys to drive the assistant.

#[cfg(unix)]
fn main() -> anyhow::Result<()> {
    ctl::main()
}

#[cfg(not(unix))]
fn main() -> anyhow::Result<()> {
    anyhow::bail!("clipmind-ctl talks to the daemon over a Unix socket, which this platform lacks")
}

#[cfg(unix)]
mod ctl {
    use anyhow::{bail, Result};
    use clap::{Parser, Subcommand};
    use clipmind::ipc::client::{next_seq_id, Subscription};
    use clipmind::ipc::{IpcClient, IpcRequest, IpcResponse};
    use clipmind::pipeline::{Notification, RunId};
    use std::path::PathBuf;
    use std::time::Duration;

    #[derive(Parser, Debug)]
    #[command(name = "clipmind-ctl", author, version, about, long_about = None)]
    struct Cli {
        /// IPC socket path
        #[arg(long, global = true)]
        socket: Option<PathBuf>,

        /// Wait for the run to finish and print its result
        #[arg(short, long, global = true)]
        wait: bool,

        #[command(subcommand)]
        command: Cmd,
    }

    #[derive(Subcommand, Debug)]
    enum Cmd {
        /// Summarize the current clipboard
        Analyze,
        /// Send a transcribed voice query
        Voice { text: String },
        /// Send a typed action request
        Ask { text: String },
        /// Accept a proposed replacement
        Confirm { new_text: String },
        /// Hide the overlay
        Hide,
        /// Show the overlay
        Show,
        /// Print daemon status
        Status,
        /// Print every notification until interrupted
        Listen,
    }

    /// Upper bound for `--wait`
    const WAIT_TIMEOUT: Duration = Duration::from_secs(60);

    pub fn main() -> Result<()> {
        let cli = Cli::parse();
        let client = match cli.socket {
            Some(path) => IpcClient::new(path),
            None => IpcClient::default(),
        };

        if !client.is_daemon_running() {
            bail!("ClipMind daemon is not running (socket {:?})", client.path());
        }

        let seq_id = next_seq_id();
        let request = match cli.command {
            Cmd::Analyze => IpcRequest::Analyze { seq_id },
            Cmd::Voice { text } => IpcRequest::VoiceQuery { seq_id, text },
            Cmd::Ask { text } => IpcRequest::ActionQuery { seq_id, text },
            Cmd::Confirm { new_text } => IpcRequest::ConfirmReplacement { seq_id, new_text },
            Cmd::Hide => IpcRequest::SetOverlayVisible {
                seq_id,
                visible: false,
            },
            Cmd::Show => IpcRequest::SetOverlayVisible {
                seq_id,
                visible: true,
            },
            Cmd::Status => IpcRequest::StatusRequest { seq_id },
            Cmd::Listen => {
                let mut subscription = client.subscribe()?;
                loop {
                    print_response(&subscription.next_event()?);
                }
            }
        };

        let triggers_run = matches!(
            request,
            IpcRequest::Analyze { .. }
                | IpcRequest::VoiceQuery { .. }
                | IpcRequest::ActionQuery { .. }
                | IpcRequest::ConfirmReplacement { .. }
        );

        // Subscribe before triggering so the terminal notification is not missed
        let subscription = if cli.wait && triggers_run {
            Some(client.subscribe()?)
        } else {
            None
        };

        let response = client.send(&request)?;
        let run_id = match &response {
            IpcResponse::Ack { success: false, message, .. } => {
                bail!("{}", message.as_deref().unwrap_or("request rejected"))
            }
            IpcResponse::Ack { run_id, .. } => *run_id,
            _ => None,
        };

        match (subscription, run_id) {
            (Some(subscription), Some(run_id)) => wait_for_result(subscription, run_id)?,
            _ => print_response(&response),
        }

        Ok(())
    }

    /// What `--wait` does with one streamed response
    #[derive(Debug, PartialEq, Eq)]
    enum WaitStep {
        /// Another run or an overlay event
        Skip,
        Show,
        /// Terminal notification of our run
        Finish,
    }

    fn wait_step(response: &IpcResponse, run_id: RunId) -> WaitStep {
        match response {
            IpcResponse::Event {
                run_id: id,
                notification,
            } if *id == run_id => {
                if notification.is_terminal() {
                    WaitStep::Finish
                } else {
                    WaitStep::Show
                }
            }
            _ => WaitStep::Skip,
        }
    }

    fn wait_for_result(mut subscription: Subscription, run_id: RunId) -> Result<()> {
        subscription.set_timeout(Some(WAIT_TIMEOUT))?;
        loop {
            let event = subscription.next_event()?;
            match wait_step(&event, run_id) {
                WaitStep::Skip => {}
                WaitStep::Show => print_response(&event),
                WaitStep::Finish => {
                    print_response(&event);
                    return Ok(());
                }
            }
        }
    }

    fn print_response(response: &IpcResponse) {
        match response {
            IpcResponse::Ack { message, .. } => {
                println!("{}", message.as_deref().unwrap_or("ok"));
            }
            IpcResponse::StatusResponse {
                overlay_visible,
                hidden_for_fullscreen,
                model,
                language,
                ..
            } => {
                println!("Model:    {model}");
                println!("Language: {language}");
                println!(
                    "Overlay:  {}{}",
                    if *overlay_visible { "visible" } else { "hidden" },
                    if *hidden_for_fullscreen {
                        " (fullscreen app)"
                    } else {
                        ""
                    }
                );
            }
            IpcResponse::Overlay { visible, .. } => {
                println!("[overlay] {}", if *visible { "shown" } else { "hidden" });
            }
            IpcResponse::Event { notification, .. } => print_notification(notification),
        }
    }

    fn print_notification(notification: &Notification) {
        match notification {
            Notification::Analyzing { source } => println!("[analyzing] {source:?}"),
            Notification::AnalysisComplete { text, is_error } | Notification::AskComplete { text, is_error } => {
                if *is_error {
                    eprintln!("Error: {text}");
                } else {
                    println!("{text}");
                }
            }
            Notification::ActionCompleted {
                action,
                message,
                success,
            } => {
                let label = action
                    .as_ref()
                    .map(ToString::to_string)
                    .unwrap_or_else(|| "action".to_string());
                if *success {
                    println!("[{label}] {message}");
                } else {
                    eprintln!("[{label}] {message}");
                }
            }
            Notification::TextReplacement { old_text, new_text } => {
                println!("Replace:\n  {old_text}\nwith:\n  {new_text}");
                println!("Run `clipmind-ctl confirm <text>` to apply.");
            }
        }
    }

}
