use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// =============================================================================
// Enums
// =============================================================================

/// Author of a message log entry.
///
/// `Pending` is the transient placeholder shown while a response is being
/// computed. It lives in the same sum type as the real roles so that the log
/// ordering rules are enforced in one place. Wire names follow the backend
/// contract (`user`, `ai`, `thinking`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "user")]
    User,
    #[serde(rename = "ai")]
    Assistant,
    #[serde(rename = "thinking")]
    Pending,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
            Role::Pending => write!(f, "pending"),
        }
    }
}

/// The two mutually exclusive conversational contexts.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatMode {
    /// Questions scoped to the loaded document; single-shot answers.
    #[default]
    Document,
    /// Open-ended multi-turn chat; streamed answers.
    Conversation,
}

impl fmt::Display for ChatMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChatMode::Document => write!(f, "document"),
            ChatMode::Conversation => write!(f, "conversation"),
        }
    }
}

// =============================================================================
// Message entries
// =============================================================================

/// One role-tagged entry of a message log.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageEntry {
    pub role: Role,
    pub content: String,
}

impl MessageEntry {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }

    pub fn pending(sentinel: impl Into<String>) -> Self {
        Self {
            role: Role::Pending,
            content: sentinel.into(),
        }
    }

    pub fn is_pending(&self) -> bool {
        self.role == Role::Pending
    }
}

impl fmt::Display for MessageEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{:?}", self.role, self.content)
    }
}

// =============================================================================
// Newtype Wrappers - Identity
// =============================================================================

/// Opaque correlation token for conversation-mode exchanges.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

static NEXT_EXCHANGE: AtomicU64 = AtomicU64::new(1);

/// Monotonic identifier of one request/response exchange.
///
/// Later exchanges always compare greater than earlier ones within a process.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ExchangeId(pub u64);

impl ExchangeId {
    pub fn next() -> Self {
        Self(NEXT_EXCHANGE.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for ExchangeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Short deterministic identifier for a document.
///
/// Produced from a content hash, or from file metadata when the content
/// cannot be read. Other services use it as an opaque correlation key.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(pub String);

impl Fingerprint {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_wire_names() {
        assert_eq!(serde_json::to_string(&Role::User).unwrap(), "\"user\"");
        assert_eq!(serde_json::to_string(&Role::Assistant).unwrap(), "\"ai\"");
        assert_eq!(serde_json::to_string(&Role::Pending).unwrap(), "\"thinking\"");
        let role: Role = serde_json::from_str("\"ai\"").unwrap();
        assert_eq!(role, Role::Assistant);
    }

    #[test]
    fn test_role_display() {
        assert_eq!(Role::User.to_string(), "user");
        assert_eq!(Role::Assistant.to_string(), "assistant");
        assert_eq!(Role::Pending.to_string(), "pending");
    }

    #[test]
    fn test_chat_mode_default_is_document() {
        assert_eq!(ChatMode::default(), ChatMode::Document);
        assert_eq!(ChatMode::Conversation.to_string(), "conversation");
    }

    #[test]
    fn test_message_entry_constructors() {
        let entry = MessageEntry::user("hi");
        assert_eq!(entry.role, Role::User);
        assert_eq!(entry.content, "hi");
        assert!(!entry.is_pending());
        assert!(MessageEntry::pending("Thinking...").is_pending());
        assert_eq!(MessageEntry::assistant("").content, "");
    }

    #[test]
    fn test_message_entry_serializes_with_wire_role() {
        let json = serde_json::to_value(MessageEntry::assistant("ok")).unwrap();
        assert_eq!(json["role"], "ai");
        assert_eq!(json["content"], "ok");
    }

    #[test]
    fn test_exchange_ids_are_monotonic() {
        let a = ExchangeId::next();
        let b = ExchangeId::next();
        let c = ExchangeId::next();
        assert!(a < b);
        assert!(b < c);
    }

    #[test]
    fn test_session_ids_are_unique() {
        assert_ne!(SessionId::new(), SessionId::new());
    }

    #[test]
    fn test_fingerprint_is_transparent_string() {
        let fp = Fingerprint("0123456789abcdef".to_string());
        assert_eq!(serde_json::to_string(&fp).unwrap(), "\"0123456789abcdef\"");
        assert_eq!(fp.to_string(), fp.as_str());
    }
}
