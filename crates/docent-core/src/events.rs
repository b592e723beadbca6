use serde::{Deserialize, Serialize};

use crate::types::{ChatMode, ExchangeId, MessageEntry};

/// Snapshot of one mode's message log, published after every mutation.
///
/// Consumers must tolerate repeated overwrites of the trailing entry while
/// an answer streams in: each update carries the whole ordered log, not a
/// delta.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogUpdate {
    /// The mode whose log changed.
    pub mode: ChatMode,
    /// The exchange that caused the change, if any (`None` for resets).
    pub exchange: Option<ExchangeId>,
    /// The full ordered log after the change.
    pub entries: Vec<MessageEntry>,
}

impl LogUpdate {
    /// The trailing entry, if the log is non-empty.
    pub fn last(&self) -> Option<&MessageEntry> {
        self.entries.last()
    }
}
