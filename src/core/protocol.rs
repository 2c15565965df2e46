//! Action protocol
//!
//! Decodes an action-mode model reply into a typed [`Action`]. The reply is
//! untrusted: anything that is not a well-formed envelope with a known
//! `action` decodes to [`Decoded::NotAnAction`] and is shown as prose.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// The closed set of action names
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    RunCommand,
    OpenApp,
    PlayMusic,
    CopyText,
    SearchWeb,
    OpenUrl,
    Analysis,
    ReplaceText,
}

impl ActionKind {
    pub const ALL: [ActionKind; 8] = [
        ActionKind::RunCommand,
        ActionKind::OpenApp,
        ActionKind::PlayMusic,
        ActionKind::CopyText,
        ActionKind::SearchWeb,
        ActionKind::OpenUrl,
        ActionKind::Analysis,
        ActionKind::ReplaceText,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RunCommand => "run_command",
            Self::OpenApp => "open_app",
            Self::PlayMusic => "play_music",
            Self::CopyText => "copy_text",
            Self::SearchWeb => "search_web",
            Self::OpenUrl => "open_url",
            Self::Analysis => "analysis",
            Self::ReplaceText => "replace_text",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActionKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or(())
    }
}

/// A validated action with its required parameters
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "action", content = "params", rename_all = "snake_case")]
pub enum Action {
    RunCommand {
        command: String,
    },
    OpenApp {
        #[serde(rename = "appName", alias = "app_name")]
        app_name: String,
    },
    PlayMusic {
        query: String,
    },
    CopyText {
        text: String,
    },
    SearchWeb {
        query: String,
    },
    OpenUrl {
        url: String,
    },
    Analysis {
        #[serde(default)]
        analysis: Option<String>,
    },
    ReplaceText {
        #[serde(rename = "newText", alias = "new_text")]
        new_text: String,
    },
}

impl Action {
    pub fn kind(&self) -> ActionKind {
        match self {
            Self::RunCommand { .. } => ActionKind::RunCommand,
            Self::OpenApp { .. } => ActionKind::OpenApp,
            Self::PlayMusic { .. } => ActionKind::PlayMusic,
            Self::CopyText { .. } => ActionKind::CopyText,
            Self::SearchWeb { .. } => ActionKind::SearchWeb,
            Self::OpenUrl { .. } => ActionKind::OpenUrl,
            Self::Analysis { .. } => ActionKind::Analysis,
            Self::ReplaceText { .. } => ActionKind::ReplaceText,
        }
    }
}

/// Result of decoding a reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decoded {
    /// Valid envelope
    Action(Action),
    /// Known action but its required params are missing or unusable
    Incomplete {
        kind: ActionKind,
        params: HashMap<String, String>,
    },
    /// Not JSON, not an object, or not a known action
    NotAnAction,
}

/// Decode a model reply against the action protocol
pub fn decode(reply: &str) -> Decoded {
    let value: Value = match serde_json::from_str(reply.trim()) {
        Ok(v) => v,
        Err(_) => return Decoded::NotAnAction,
    };

    let Value::Object(mut envelope) = value else {
        return Decoded::NotAnAction;
    };

    let kind = match envelope.get("action").and_then(Value::as_str) {
        Some(name) => match name.parse::<ActionKind>() {
            Ok(kind) => kind,
            Err(()) => {
                debug!("Unknown action '{}', treating reply as text", name);
                return Decoded::NotAnAction;
            }
        },
        None => return Decoded::NotAnAction,
    };

    let params = match envelope.remove("params") {
        Some(Value::Object(map)) => stringify_params(map),
        _ => HashMap::new(),
    };

    let normalized = serde_json::json!({
        "action": kind.as_str(),
        "params": params,
    });

    match serde_json::from_value::<Action>(normalized) {
        Ok(action) => Decoded::Action(action),
        Err(e) => {
            debug!("Incomplete '{}' envelope: {}", kind, e);
            Decoded::Incomplete { kind, params }
        }
    }
}

/// Keep string params, stringify scalars, drop nested values
fn stringify_params(map: Map<String, Value>) -> HashMap<String, String> {
    map.into_iter()
        .filter_map(|(key, value)| {
            let value = match value {
                Value::String(s) => s,
                Value::Number(n) => n.to_string(),
                Value::Bool(b) => b.to_string(),
                _ => return None,
            };
            Some((key, value))
        })
        .collect()
}
