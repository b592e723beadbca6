use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

use futures::stream::{self, StreamExt};
use tokio::sync::mpsc;

use super::{AskRequest, AskResponse, ChatBackend, ConversationRequest, FragmentStream};
use crate::error::ChatError;

/// One scripted backend reply, consumed in order by either request shape.
#[derive(Debug)]
pub enum MockReply {
    /// Document answer (`None` simulates a response without the field).
    Answer(Option<String>),
    /// Request fails before any response arrives.
    Fail,
    /// Stream that yields these text fragments, then closes.
    Fragments(Vec<String>),
    /// Stream that yields these raw byte fragments, then closes.
    Bytes(Vec<Vec<u8>>),
    /// Stream that yields these fragments, then breaks.
    FragmentsThenFail(Vec<String>),
    /// Stream fed by the test through a channel, for controlled interleaving.
    Channel(mpsc::UnboundedReceiver<Result<Vec<u8>, ChatError>>),
}

impl MockReply {
    pub fn answer(text: &str) -> Self {
        MockReply::Answer(Some(text.to_string()))
    }

    pub fn fragments<'a>(parts: impl IntoIterator<Item = &'a str>) -> Self {
        MockReply::Fragments(parts.into_iter().map(str::to_string).collect())
    }

    /// A channel-backed stream reply plus the sender that feeds it.
    pub fn channel() -> (mpsc::UnboundedSender<Result<Vec<u8>, ChatError>>, Self) {
        let (tx, rx) = mpsc::unbounded_channel();
        (tx, MockReply::Channel(rx))
    }

    fn into_stream(self) -> Result<FragmentStream, ChatError> {
        let ok = |parts: Vec<String>| -> Vec<Result<Vec<u8>, ChatError>> {
            parts.into_iter().map(|p| Ok(p.into_bytes())).collect()
        };
        match self {
            MockReply::Fragments(parts) => Ok(stream::iter(ok(parts)).boxed()),
            MockReply::Bytes(parts) => Ok(stream::iter(parts.into_iter().map(Ok)).boxed()),
            MockReply::FragmentsThenFail(parts) => {
                let mut items = ok(parts);
                items.push(Err(ChatError::Transport("connection reset".to_string())));
                Ok(stream::iter(items).boxed())
            }
            MockReply::Channel(rx) => Ok(stream::unfold(rx, |mut rx| async move {
                rx.recv().await.map(|item| (item, rx))
            })
            .boxed()),
            MockReply::Fail => Err(ChatError::Transport("connection refused".to_string())),
            MockReply::Answer(_) => Err(ChatError::Backend(
                "scripted a document answer for a conversation request".to_string(),
            )),
        }
    }
}

/// Backend that replays scripted replies and records the requests it saw.
///
/// Returns deterministic output without any network I/O.
#[derive(Debug, Default)]
pub struct MockBackend {
    replies: Mutex<VecDeque<MockReply>>,
    asks: Mutex<Vec<AskRequest>>,
    chats: Mutex<Vec<ConversationRequest>>,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_replies(replies: impl IntoIterator<Item = MockReply>) -> Self {
        Self {
            replies: Mutex::new(replies.into_iter().collect()),
            ..Self::default()
        }
    }

    pub fn push(&self, reply: MockReply) {
        lock(&self.replies).push_back(reply);
    }

    /// Document questions received so far.
    pub fn ask_requests(&self) -> Vec<AskRequest> {
        lock(&self.asks).clone()
    }

    /// Conversation turns received so far.
    pub fn chat_requests(&self) -> Vec<ConversationRequest> {
        lock(&self.chats).clone()
    }

    pub fn request_count(&self) -> usize {
        lock(&self.asks).len() + lock(&self.chats).len()
    }

    fn next_reply(&self) -> Result<MockReply, ChatError> {
        lock(&self.replies)
            .pop_front()
            .ok_or_else(|| ChatError::Backend("no scripted reply".to_string()))
    }
}

impl ChatBackend for MockBackend {
    async fn ask(&self, request: &AskRequest) -> Result<AskResponse, ChatError> {
        lock(&self.asks).push(request.clone());
        match self.next_reply()? {
            MockReply::Answer(answer) => Ok(AskResponse { answer }),
            MockReply::Fail => Err(ChatError::Transport("connection refused".to_string())),
            other => Err(ChatError::Backend(format!(
                "scripted a stream for a document request: {other:?}"
            ))),
        }
    }

    async fn chat(&self, request: &ConversationRequest) -> Result<FragmentStream, ChatError> {
        lock(&self.chats).push(request.clone());
        self.next_reply()?.into_stream()
    }
}
