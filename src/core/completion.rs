//! Remote completion
//!
//! One POST to an OpenAI-style chat-completions endpoint per call. No
//! retries; every failure is classified into a [`FailureKind`].

use crate::config::Config;
use crate::core::prompts::{CompletionRequest, PromptMode};
use crate::error::FailureKind;
use crate::i18n::ResponseLanguage;
use reqwest::StatusCode;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Raw model reply, or why there is none
pub type CompletionResult = Result<String, FailureKind>;

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: Option<ChatMessage>,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

/// Client for the completion endpoint
#[derive(Clone)]
pub struct CompletionClient {
    http: reqwest::Client,
    url: String,
    api_key: Option<String>,
    model: String,
    language: ResponseLanguage,
    timeout: Duration,
}

impl CompletionClient {
    /// Create new completion client from config
    pub fn new(config: &Config) -> Self {
        Self {
            http: reqwest::Client::new(),
            url: config.api_url.clone(),
            api_key: config.api_key().map(str::to_string),
            model: config.model.clone(),
            language: config.response_language,
            timeout: config.request_timeout(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn language(&self) -> ResponseLanguage {
        self.language
    }

    /// Build the request for `content` in `mode`
    pub fn request_for(
        &self,
        content: &str,
        mode: PromptMode,
        selection: Option<&str>,
    ) -> CompletionRequest {
        CompletionRequest::build(content, mode, &self.model, self.language, selection)
    }

    /// Run one completion. The reply is returned unvalidated.
    pub async fn complete(
        &self,
        content: &str,
        mode: PromptMode,
        selection: Option<&str>,
    ) -> CompletionResult {
        let Some(api_key) = self.api_key.as_deref() else {
            warn!("🔑 No API key configured, skipping completion");
            return Err(FailureKind::NoApiKey);
        };

        let request = self.request_for(content, mode, selection);
        info!("🧠 Completion ({:?}) with {}", mode, request.model);

        let response = self
            .http
            .post(&self.url)
            .bearer_auth(api_key)
            .json(&serde_json::json!({
                "model": request.model,
                "messages": [
                    {"role": "system", "content": request.system_prompt},
                    {"role": "user", "content": request.user_prompt},
                ]
            }))
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| {
                warn!("❌ Completion transport error: {}", e);
                FailureKind::NetworkOrTimeout
            })?;

        let status = response.status();
        let body_text = response.text().await.map_err(|e| {
            warn!("❌ Completion body read failed: {}", e);
            FailureKind::NetworkOrTimeout
        })?;

        if !status.is_success() {
            warn!("❌ Completion API Error ({}): {}", status, body_text);
            return Err(classify_status(status));
        }

        debug!("🧠 Completion raw body: {}", body_text);
        parse_reply(&body_text)
    }
}

/// Map a non-success HTTP status to a failure kind
pub fn classify_status(status: StatusCode) -> FailureKind {
    match status {
        StatusCode::UNAUTHORIZED => FailureKind::Unauthorized,
        StatusCode::BAD_REQUEST | StatusCode::NOT_FOUND => FailureKind::ModelUnavailable,
        _ => FailureKind::NetworkOrTimeout,
    }
}

/// Extract `choices[0].message.content`
fn parse_reply(body: &str) -> CompletionResult {
    let parsed: ChatResponse = serde_json::from_str(body).map_err(|e| {
        warn!("❌ Failed to deserialize completion response: {}", e);
        FailureKind::MalformedResponse
    })?;

    parsed
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message)
        .and_then(|message| message.content)
        .ok_or(FailureKind::MalformedResponse)
}
