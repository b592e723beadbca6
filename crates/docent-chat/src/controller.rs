//! Mode controller: the top-level state machine of the session engine.
//!
//! Selects which mode is active, owns the input buffer and document chunks,
//! and drives each exchange through submit -> placeholder -> response ->
//! finalize. Submission is split in two: [`ModeController::submit`] does the
//! synchronous bookkeeping and returns a [`PendingExchange`] that performs the
//! request. The pending exchange captures its target slot and session at
//! submit time, so switching modes mid-flight is allowed and does not
//! redirect the reply.

use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use docent_core::config::ChatConfig;
use docent_core::events::LogUpdate;
use docent_core::types::{ChatMode, ExchangeId, MessageEntry, SessionId};

use crate::assembler::{Assembly, StreamAssembler};
use crate::backend::{AskRequest, ChatBackend, ConversationRequest};
use crate::session::SessionIdentity;
use crate::slot::SlotHandle;
use crate::state::ExchangePhase;

/// How one exchange ended, as seen by whoever awaited it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExchangeOutcome {
    /// The answer is final in the log.
    Completed { content: String },
    /// The request failed; the error text follows any partial answer in the log.
    Failed { reason: String },
    /// A newer exchange or a reset took over the log before this one finished.
    Superseded,
}

#[derive(Debug, Clone)]
enum ExchangeRequest {
    Ask(AskRequest),
    Chat(ConversationRequest),
}

/// A submitted exchange whose request has not been performed yet.
///
/// `run` may be awaited inline or spawned onto a runtime.
#[derive(Debug)]
pub struct PendingExchange<B> {
    id: ExchangeId,
    backend: Arc<B>,
    slot: SlotHandle,
    request: ExchangeRequest,
    error_text: String,
    no_answer_text: String,
}

impl<B: ChatBackend> PendingExchange<B> {
    pub fn id(&self) -> ExchangeId {
        self.id
    }

    pub fn mode(&self) -> ChatMode {
        self.slot.mode()
    }

    /// Perform the request and write the result into the captured slot.
    pub async fn run(self) -> ExchangeOutcome {
        let outcome = match &self.request {
            ExchangeRequest::Ask(request) => self.run_ask(request).await,
            ExchangeRequest::Chat(request) => self.run_chat(request).await,
        };
        debug!(exchange = %self.id, mode = %self.mode(), outcome = ?outcome, "Exchange finished");
        outcome
    }

    async fn run_ask(&self, request: &AskRequest) -> ExchangeOutcome {
        let id = self.id;
        match self.backend.ask(request).await {
            Ok(response) => {
                let content = match response.answer.filter(|a| !a.is_empty()) {
                    Some(answer) => answer,
                    None => {
                        warn!(exchange = %id, "Backend returned no answer");
                        self.no_answer_text.clone()
                    }
                };
                if !self.slot.apply(id, |log| log.append_assistant(&content, id)) {
                    return ExchangeOutcome::Superseded;
                }
                self.slot.complete(id, None);
                ExchangeOutcome::Completed { content }
            }
            Err(e) => {
                warn!(exchange = %id, error = %e, "Document question failed");
                self.fail(e.to_string())
            }
        }
    }

    async fn run_chat(&self, request: &ConversationRequest) -> ExchangeOutcome {
        let id = self.id;
        let stream = match self.backend.chat(request).await {
            Ok(stream) => stream,
            Err(e) => {
                warn!(exchange = %id, error = %e, "Conversation request failed");
                return self.fail(e.to_string());
            }
        };
        match StreamAssembler::new(id).consume(stream, &self.slot).await {
            Assembly::Completed { content } => {
                if !self.slot.complete(id, None) {
                    return ExchangeOutcome::Superseded;
                }
                ExchangeOutcome::Completed { content }
            }
            Assembly::Failed { error, .. } => self.fail(error.to_string()),
            Assembly::Superseded => ExchangeOutcome::Superseded,
        }
    }

    /// Append the error text as its own assistant turn, after any partial
    /// answer, then leave the phase through `Error`.
    fn fail(&self, reason: String) -> ExchangeOutcome {
        let id = self.id;
        if !self
            .slot
            .apply(id, |log| log.append_assistant(&self.error_text, id))
        {
            return ExchangeOutcome::Superseded;
        }
        if !self.slot.complete(id, Some(reason.clone())) {
            return ExchangeOutcome::Superseded;
        }
        ExchangeOutcome::Failed { reason }
    }
}

/// Owns both mode slots and decides where each exchange goes.
#[derive(Debug)]
pub struct ModeController<B> {
    backend: Arc<B>,
    config: ChatConfig,
    mode: ChatMode,
    document: SlotHandle,
    conversation: SlotHandle,
    session: SessionIdentity,
    input: String,
    chunks: Vec<String>,
    events: broadcast::Sender<LogUpdate>,
}

impl<B: ChatBackend> ModeController<B> {
    /// Create a controller in document mode with empty logs.
    pub fn new(backend: B, config: &ChatConfig) -> Self {
        Self::with_shared_backend(Arc::new(backend), config)
    }

    pub fn with_shared_backend(backend: Arc<B>, config: &ChatConfig) -> Self {
        let (events, _) = broadcast::channel(config.event_capacity.max(1));
        Self {
            backend,
            config: config.clone(),
            mode: ChatMode::default(),
            document: SlotHandle::new(ChatMode::Document, events.clone()),
            conversation: SlotHandle::new(ChatMode::Conversation, events.clone()),
            session: SessionIdentity::new(),
            input: String::new(),
            chunks: Vec::new(),
            events,
        }
    }

    pub fn backend(&self) -> &Arc<B> {
        &self.backend
    }

    fn slot(&self, mode: ChatMode) -> &SlotHandle {
        match mode {
            ChatMode::Document => &self.document,
            ChatMode::Conversation => &self.conversation,
        }
    }

    // ---- Mode and session ----

    pub fn mode(&self) -> ChatMode {
        self.mode
    }

    /// Select a mode. Entering document mode clears the document log;
    /// entering conversation mode clears its log and rotates the session.
    /// Both apply even when re-selecting the current mode. The input buffer
    /// is cleared. In-flight exchanges are not cancelled.
    pub fn set_mode(&mut self, mode: ChatMode) {
        self.clear_input();
        let previous = std::mem::replace(&mut self.mode, mode);
        self.slot(mode).reset();
        if mode == ChatMode::Conversation {
            self.session.rotate();
        }
        info!(from = %previous, to = %mode, "Chat mode selected");
    }

    /// Start a fresh conversation without changing mode.
    pub fn new_chat(&mut self) {
        self.clear_input();
        self.conversation.reset();
        self.session.rotate();
        info!(mode = %self.mode, "New chat started");
    }

    /// Clear the active mode's log.
    pub fn reset(&mut self) {
        self.slot(self.mode).reset();
    }

    pub fn session_id(&self) -> SessionId {
        self.session.current()
    }

    // ---- Input and document chunks ----

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn set_input(&mut self, text: impl Into<String>) {
        self.input = text.into();
        self.slot(self.mode).sync_input(!self.input.is_empty());
    }

    fn clear_input(&mut self) {
        self.input.clear();
        self.slot(self.mode).sync_input(false);
    }

    pub fn chunks(&self) -> &[String] {
        &self.chunks
    }

    pub fn set_chunks(&mut self, chunks: Vec<String>) {
        info!(chunks = chunks.len(), "Document chunks loaded");
        self.chunks = chunks;
    }

    pub fn clear_chunks(&mut self) {
        self.chunks.clear();
    }

    // ---- Observation ----

    /// Phase of the active mode. Idle with text in the buffer reads as
    /// `AwaitingUserInput`.
    pub fn phase(&self) -> ExchangePhase {
        match self.slot(self.mode).phase() {
            ExchangePhase::Idle if !self.input.is_empty() => ExchangePhase::AwaitingUserInput,
            phase => phase,
        }
    }

    pub fn loading(&self) -> bool {
        self.phase().is_loading()
    }

    /// Error of the active mode's last failed exchange, until the next submit.
    pub fn last_error(&self) -> Option<String> {
        self.slot(self.mode).last_error()
    }

    /// The exchange currently allowed to write to the active log.
    pub fn active_exchange(&self) -> Option<ExchangeId> {
        self.slot(self.mode).active()
    }

    /// Ordered log of the active mode.
    pub fn snapshot(&self) -> Vec<MessageEntry> {
        self.slot(self.mode).snapshot()
    }

    pub fn snapshot_of(&self, mode: ChatMode) -> Vec<MessageEntry> {
        self.slot(mode).snapshot()
    }

    /// Receive a [`LogUpdate`] after every log mutation in either mode.
    pub fn subscribe(&self) -> broadcast::Receiver<LogUpdate> {
        self.events.subscribe()
    }

    // ---- Submission ----

    /// Submit the input buffer.
    ///
    /// Silently returns `None` when the input is empty, or when in document
    /// mode no chunks are loaded. Otherwise appends the user turn and the
    /// placeholder, clears the input, and returns the exchange to run.
    pub fn submit(&mut self) -> Option<PendingExchange<B>> {
        if self.input.is_empty() {
            debug!("Submit ignored: empty input");
            return None;
        }
        if self.mode == ChatMode::Document && self.chunks.is_empty() {
            debug!("Submit ignored: no document loaded");
            return None;
        }

        let text = std::mem::take(&mut self.input);
        let id = ExchangeId::next();
        let slot = self.slot(self.mode).clone();

        let request = match self.mode {
            ChatMode::Document => ExchangeRequest::Ask(AskRequest {
                query: text.clone(),
                chunks: self.chunks.clone(),
            }),
            ChatMode::Conversation => {
                let mut messages = slot.history();
                messages.push(MessageEntry::user(text.as_str()));
                ExchangeRequest::Chat(ConversationRequest {
                    messages,
                    chunks: (!self.chunks.is_empty()).then(|| self.chunks.clone()),
                    mode: self.config.conversation_mode_flag.clone(),
                    session: self.session.current(),
                })
            }
        };

        slot.begin(id, &text, &self.config.pending_text);
        info!(exchange = %id, mode = %self.mode, "Exchange submitted");

        Some(PendingExchange {
            id,
            backend: Arc::clone(&self.backend),
            slot,
            request,
            error_text: self.config.error_text.clone(),
            no_answer_text: self.config.no_answer_text.clone(),
        })
    }

    /// Submit and await the exchange inline. `None` if the submit was ignored.
    pub async fn send(&mut self) -> Option<ExchangeOutcome> {
        let pending = self.submit()?;
        Some(pending.run().await)
    }
}

// =============================================================================
// Tests
// =============================================================================
