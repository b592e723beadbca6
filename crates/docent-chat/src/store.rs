//! Ordered message log for one mode.
//!
//! Invariant: at most one `Pending` entry exists and, when present, it is
//! the last entry. Every mutation below preserves it. Entries remember the
//! exchange that produced them so a streamed answer can be grown in place.

use docent_core::types::{ExchangeId, MessageEntry, Role};

#[derive(Debug, Clone)]
struct Tagged {
    entry: MessageEntry,
    exchange: Option<ExchangeId>,
}

/// The canonical transcript of one mode. Insertion order is never changed.
#[derive(Debug, Clone, Default)]
pub struct MessageLog {
    entries: Vec<Tagged>,
}

impl MessageLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn last(&self) -> Option<&MessageEntry> {
        self.entries.last().map(|t| &t.entry)
    }

    pub fn has_pending(&self) -> bool {
        self.last().is_some_and(MessageEntry::is_pending)
    }

    /// Append a user turn. A stale placeholder from an earlier exchange is
    /// dropped first so the pending entry stays last.
    pub fn append_user(&mut self, text: &str, exchange: ExchangeId) {
        self.drop_pending();
        self.entries.push(Tagged {
            entry: MessageEntry::user(text),
            exchange: Some(exchange),
        });
    }

    /// Append the placeholder, replacing any existing one.
    pub fn append_pending(&mut self, sentinel: &str, exchange: ExchangeId) {
        self.drop_pending();
        self.entries.push(Tagged {
            entry: MessageEntry::pending(sentinel),
            exchange: Some(exchange),
        });
    }

    /// User turn plus placeholder as one mutation.
    pub fn begin_exchange(&mut self, text: &str, sentinel: &str, exchange: ExchangeId) {
        self.append_user(text, exchange);
        self.append_pending(sentinel, exchange);
    }

    /// Streaming merge: drop the trailing placeholder, then either overwrite
    /// the trailing assistant entry of `exchange` with `accumulated` or
    /// append a new assistant entry holding it.
    pub fn finalize(&mut self, accumulated: &str, exchange: ExchangeId) {
        self.drop_pending();
        match self.entries.last_mut() {
            Some(last) if last.entry.role == Role::Assistant && last.exchange == Some(exchange) => {
                last.entry.content.clear();
                last.entry.content.push_str(accumulated);
            }
            _ => self.entries.push(Tagged {
                entry: MessageEntry::assistant(accumulated),
                exchange: Some(exchange),
            }),
        }
    }

    /// Single-shot answer: drop the trailing placeholder and append one
    /// assistant entry.
    pub fn append_assistant(&mut self, text: &str, exchange: ExchangeId) {
        self.drop_pending();
        self.entries.push(Tagged {
            entry: MessageEntry::assistant(text),
            exchange: Some(exchange),
        });
    }

    /// Clear to empty. Idempotent.
    pub fn reset(&mut self) {
        self.entries.clear();
    }

    /// The ordered transcript, placeholder included.
    pub fn snapshot(&self) -> Vec<MessageEntry> {
        self.entries.iter().map(|t| t.entry.clone()).collect()
    }

    /// The ordered transcript without the placeholder, as sent to the backend.
    pub fn history(&self) -> Vec<MessageEntry> {
        self.entries
            .iter()
            .filter(|t| !t.entry.is_pending())
            .map(|t| t.entry.clone())
            .collect()
    }

    fn drop_pending(&mut self) {
        if self.has_pending() {
            self.entries.pop();
        }
    }
}
