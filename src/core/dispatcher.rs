//! Dispatcher
//!
//! Routes a model reply to the matching action handler, the replacement
//! confirmation flow or a plain-text passthrough. A reply is never rejected:
//! anything that does not decode as an action is shown as text.

use crate::actions::{ActionHandlers, ActionOutcome};
use crate::core::protocol::{decode, Action, ActionKind, Decoded};
use crate::error::ActionError;
use tracing::{debug, info, warn};

/// Notice shown for structured replies with nothing more specific to say
const GENERIC_NOTICE: &str = "Action completed.";

/// What a reply turned into
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Prose answer, shown as-is
    PlainText(String),
    /// Final prose result (analysis replies and command output)
    Analysis(ActionOutcome),
    /// A silent action ran
    ActionCompleted(ActionOutcome),
    /// The model proposed replacing the selection; needs user confirmation
    ReplacementRequested { old_text: String, new_text: String },
    /// An action's side effect failed
    Failure(String),
}

pub struct Dispatcher {
    handlers: ActionHandlers,
}

impl Dispatcher {
    pub fn new(handlers: ActionHandlers) -> Self {
        Self { handlers }
    }

    /// Interpret `reply`. Structured replies are honoured only when the
    /// request was an action request; `selection` is the text the model
    /// would replace.
    pub async fn dispatch(
        &self,
        reply: &str,
        input_was_action: bool,
        selection: Option<&str>,
    ) -> DispatchOutcome {
        if !input_was_action {
            return DispatchOutcome::PlainText(reply.to_string());
        }

        match decode(reply) {
            Decoded::NotAnAction => {
                debug!("Reply is not an action, showing as text");
                DispatchOutcome::PlainText(reply.to_string())
            }
            Decoded::Incomplete { kind, params } => {
                warn!("⚠️ '{}' reply is missing required params", kind);
                let text = params
                    .get("response")
                    .cloned()
                    .unwrap_or_else(|| GENERIC_NOTICE.to_string());
                DispatchOutcome::ActionCompleted(ActionOutcome::new(kind, text))
            }
            Decoded::Action(action) => self.route(action, selection).await,
        }
    }

    async fn route(&self, action: Action, selection: Option<&str>) -> DispatchOutcome {
        let kind = action.kind();
        info!("🎯 Dispatching action: {}", kind);

        let result: Result<String, ActionError> = match action {
            Action::ReplaceText { new_text } => {
                return DispatchOutcome::ReplacementRequested {
                    old_text: selection.unwrap_or_default().to_string(),
                    new_text,
                };
            }
            Action::Analysis { analysis } => {
                let text = self.handlers.analysis(analysis.as_deref());
                return DispatchOutcome::Analysis(ActionOutcome::new(kind, text));
            }
            Action::RunCommand { command } => {
                let text = self.handlers.run_command(&command).await;
                return DispatchOutcome::Analysis(ActionOutcome::new(kind, text));
            }
            Action::OpenApp { app_name } => Ok(self.handlers.open_app(&app_name).await),
            Action::PlayMusic { query } => self.handlers.play_music(&query).await,
            Action::CopyText { text } => self.handlers.copy_text(&text),
            Action::SearchWeb { query } => self.handlers.search_web(&query).await,
            Action::OpenUrl { url } => self.handlers.open_url(&url).await,
        };

        match result {
            Ok(text) => DispatchOutcome::ActionCompleted(ActionOutcome::new(kind, text)),
            Err(e) => {
                warn!("❌ Action {} failed: {}", kind, e);
                DispatchOutcome::Failure(format!("Error executing action: {e}"))
            }
        }
    }

    /// Second step of `replace_text`
    pub async fn confirm_replacement(&self, new_text: &str) -> DispatchOutcome {
        match self.handlers.apply_replacement(new_text).await {
            Ok(text) => DispatchOutcome::ActionCompleted(ActionOutcome::new(
                ActionKind::ReplaceText,
                text,
            )),
            Err(e) => {
                warn!("❌ Replacement failed: {}", e);
                DispatchOutcome::Failure(format!("Error executing action: {e}"))
            }
        }
    }
}
