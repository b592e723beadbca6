//! Conversation session engine for Docent.
//!
//! Keeps one message log per chat mode, sends questions to the Q&A backend
//! with a placeholder shown while waiting, and folds streamed replies into a
//! single growing answer.

pub mod assembler;
pub mod backend;
pub mod controller;
pub mod error;
pub mod fingerprint;
pub mod session;
pub mod state;
pub mod store;

mod slot;

pub use assembler::{Assembly, StreamAssembler, Utf8Decoder};
pub use backend::{
    AskRequest, AskResponse, ChatBackend, ConversationRequest, FragmentStream, HttpBackend,
    MockBackend, MockReply,
};
pub use controller::{ExchangeOutcome, ModeController, PendingExchange};
pub use error::ChatError;
pub use fingerprint::{fingerprint_bytes, fingerprint_file, fingerprint_metadata, DocumentMeta};
pub use session::SessionIdentity;
pub use state::ExchangePhase;
pub use store::MessageLog;
