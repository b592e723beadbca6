//! Backend seam for the session engine.
//!
//! Two request shapes reach the backend: a single-shot document question
//! (`/query`) and a streamed conversation turn (`/chat`). [`HttpBackend`]
//! speaks the real wire protocol; [`MockBackend`] replays scripted replies
//! for tests.

pub mod http;
pub mod mock;
pub mod summary;

use std::future::Future;

use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};

use docent_core::types::{MessageEntry, SessionId};

use crate::error::ChatError;

pub use http::HttpBackend;
pub use mock::{MockBackend, MockReply};

/// Raw response fragments of a streamed conversation turn.
pub type FragmentStream = BoxStream<'static, Result<Vec<u8>, ChatError>>;

/// Document-mode question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AskRequest {
    pub query: String,
    pub chunks: Vec<String>,
}

/// Document-mode answer. A missing field is not an error.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct AskResponse {
    #[serde(default)]
    pub answer: Option<String>,
}

/// Conversation-mode turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConversationRequest {
    /// Prior messages in order, placeholder excluded, ending with the new user turn.
    pub messages: Vec<MessageEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chunks: Option<Vec<String>>,
    pub mode: String,
    #[serde(rename = "generalKey")]
    pub session: SessionId,
}

/// A Q&A backend.
///
/// Implementations must be cheap to share: the controller holds one behind
/// an `Arc` and every in-flight exchange keeps a clone of it.
pub trait ChatBackend: Send + Sync {
    /// Ask a question about the loaded document.
    fn ask(
        &self,
        request: &AskRequest,
    ) -> impl Future<Output = Result<AskResponse, ChatError>> + Send;

    /// Start a conversation turn and return its fragment stream.
    fn chat(
        &self,
        request: &ConversationRequest,
    ) -> impl Future<Output = Result<FragmentStream, ChatError>> + Send;
}
