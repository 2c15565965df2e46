//! Response language support
//!
//! The configured language is prepended to every prompt as an instruction,
//! so the model answers in it regardless of the input language.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Language the model is asked to answer in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseLanguage {
    #[default]
    #[serde(alias = "en")]
    English,
    #[serde(alias = "sv")]
    Swedish,
}

impl ResponseLanguage {
    /// Instruction line placed at the top of the system prompt
    pub fn instruction(&self) -> &'static str {
        match self {
            Self::English => "Always respond in English.",
            Self::Swedish => "Svara alltid på svenska. (Always respond in Swedish.)",
        }
    }
}

impl fmt::Display for ResponseLanguage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::English => write!(f, "English"),
            Self::Swedish => write!(f, "Swedish"),
        }
    }
}
