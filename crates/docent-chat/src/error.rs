//! Error types for the session engine.
//!
//! None of these reach the user as a failure: the controller turns every
//! backend error into a fixed assistant message in the log.

use docent_core::error::DocentError;

use crate::state::ExchangePhase;

/// Errors from the backend seam and the stream decoder.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("backend returned status {0}")]
    Status(u16),
    #[error("malformed fragment: {0}")]
    MalformedFragment(String),
    #[error("decode error: {0}")]
    Decode(String),
    #[error("backend error: {0}")]
    Backend(String),
    #[error("invalid phase transition: {from} -> {to}")]
    InvalidTransition {
        from: ExchangePhase,
        to: ExchangePhase,
    },
}

impl From<reqwest::Error> for ChatError {
    fn from(err: reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            ChatError::Status(status.as_u16())
        } else if err.is_decode() {
            ChatError::Decode(err.to_string())
        } else {
            ChatError::Transport(err.to_string())
        }
    }
}

impl From<ChatError> for DocentError {
    fn from(err: ChatError) -> Self {
        match err {
            ChatError::MalformedFragment(_) => DocentError::Stream(err.to_string()),
            ChatError::Decode(_) => DocentError::Serialization(err.to_string()),
            other => DocentError::Backend(other.to_string()),
        }
    }
}
