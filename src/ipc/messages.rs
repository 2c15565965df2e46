//! IPC Message Types
//!
//! JSON-serializable messages between the daemon and the presentation layer.

use crate::pipeline::{Notification, RunId};
use serde::{Deserialize, Serialize};

/// Request types sent from client to server
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum IpcRequest {
    /// Summarize the current clipboard
    Analyze { seq_id: u64 },

    /// Transcribed voice query
    VoiceQuery { seq_id: u64, text: String },

    /// Typed action request
    ActionQuery { seq_id: u64, text: String },

    /// Accept a proposed text replacement
    ConfirmReplacement { seq_id: u64, new_text: String },

    /// The user hid or showed the overlay
    SetOverlayVisible { seq_id: u64, visible: bool },

    /// Request status of the daemon
    StatusRequest { seq_id: u64 },

    /// Stream notifications on this connection until it closes
    Subscribe { seq_id: u64 },
}

impl IpcRequest {
    pub fn seq_id(&self) -> u64 {
        match self {
            Self::Analyze { seq_id }
            | Self::VoiceQuery { seq_id, .. }
            | Self::ActionQuery { seq_id, .. }
            | Self::ConfirmReplacement { seq_id, .. }
            | Self::SetOverlayVisible { seq_id, .. }
            | Self::StatusRequest { seq_id }
            | Self::Subscribe { seq_id } => *seq_id,
        }
    }
}

/// Response types sent from server to client
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum IpcResponse {
    /// Acknowledgment. Triggers report the id of the run they started.
    Ack {
        seq_id: u64,
        success: bool,
        message: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        run_id: Option<RunId>,
    },

    /// Status response
    StatusResponse {
        seq_id: u64,
        overlay_visible: bool,
        hidden_for_fullscreen: bool,
        model: String,
        language: String,
    },

    /// Pipeline notification (subscribers only)
    Event {
        run_id: RunId,
        notification: Notification,
    },

    /// Overlay visibility change requested by the daemon (subscribers only)
    Overlay { visible: bool, focus: bool },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_voice_query_deserialize() {
        let req: IpcRequest =
            serde_json::from_str(r#"{"type":"voice_query","seq_id":3,"text":"open firefox"}"#)
                .unwrap();
        assert_eq!(req.seq_id(), 3);
        assert!(matches!(req, IpcRequest::VoiceQuery { ref text, .. } if text == "open firefox"));
    }

    #[test]
    fn test_event_serialize() {
        let resp = IpcResponse::Event {
            run_id: 7,
            notification: Notification::AskComplete {
                text: "42".to_string(),
                is_error: false,
            },
        };
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("\"type\":\"event\""));
        assert!(json.contains("\"kind\":\"ask-complete\""));
        assert!(json.contains("\"run_id\":7"));
    }

    #[test]
    fn test_ack_without_run_id() {
        let resp: IpcResponse =
            serde_json::from_str(r#"{"type":"ack","seq_id":1,"success":true,"message":null}"#)
                .unwrap();
        assert!(matches!(resp, IpcResponse::Ack { run_id: None, .. }));
        let json = serde_json::to_string(&resp).unwrap();
        assert!(!json.contains("run_id"));
    }
}
