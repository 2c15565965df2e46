//! Core processing modules
//!
//! Prompt construction, the remote completion call, the action protocol
//! decoder and the dispatcher that routes decoded replies.

pub mod completion;
pub mod dispatcher;
pub mod prompts;
pub mod protocol;
