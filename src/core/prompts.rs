//! Prompt construction
//!
//! Builds the system/user pair sent to the completion endpoint.

use crate::i18n::ResponseLanguage;
use serde::{Deserialize, Serialize};

/// What the model is asked to do with the content
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PromptMode {
    /// Markdown study summary of copied text
    Summarize,
    /// Structured action (or answer) for a request
    ActionRequest,
}

/// One completion call, built per invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionRequest {
    pub system_prompt: String,
    pub user_prompt: String,
    pub model: String,
    pub mode: PromptMode,
}

impl CompletionRequest {
    pub fn build(
        content: &str,
        mode: PromptMode,
        model: &str,
        language: ResponseLanguage,
        selection: Option<&str>,
    ) -> Self {
        let system_prompt = match mode {
            PromptMode::Summarize => summarize_prompt(language),
            PromptMode::ActionRequest => action_prompt(language, selection),
        };

        Self {
            system_prompt,
            user_prompt: content.to_string(),
            model: model.to_string(),
            mode,
        }
    }
}

fn summarize_prompt(language: ResponseLanguage) -> String {
    format!(
        r#"{instruction}
You are a study assistant. Summarize the text the user copied as Markdown:
- start with a one-line `##` heading naming the topic
- list the key points as bullets
- explain difficult terms briefly
- end with a short "Remember" section of the two or three most important facts
Do not invent facts that are not in the text."#,
        instruction = language.instruction()
    )
}

fn action_prompt(language: ResponseLanguage, selection: Option<&str>) -> String {
    let selection = selection
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or("(nothing)");

    format!(
        r#"{instruction}
You are a desktop assistant that controls the user's computer.
ALWAYS reply with exactly one JSON object with two top-level keys, "action" and "params".
When the request is actionable, output ONLY the JSON object, no prose before or after it.

Currently copied/highlighted text:
"""
{selection}
"""

Valid actions:
- run_command: run a shell command. params: {{"command": "..."}}
- open_app: open an application. params: {{"appName": "..."}}
- play_music: play music. params: {{"query": "..."}}
- copy_text: copy text to the clipboard. params: {{"text": "..."}}
- search_web: search the web. params: {{"query": "..."}}
- open_url: open a web page. params: {{"url": "https://..."}}
- replace_text: replace the highlighted text. params: {{"newText": "..."}}
- analysis: answer a question or explain something. params: {{"analysis": "..."}}

Example:
{{"action": "open_app", "params": {{"appName": "firefox"}}}}"#,
        instruction = language.instruction(),
    )
}
