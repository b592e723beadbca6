//! Session identity for conversation mode.
//!
//! The backend correlates multi-turn state by this token. It is in-memory
//! only and is rotated whenever a fresh conversation begins.

use tracing::info;

use docent_core::types::SessionId;

/// Owns the current conversation session token.
#[derive(Debug, Clone)]
pub struct SessionIdentity {
    current: SessionId,
}

impl Default for SessionIdentity {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionIdentity {
    pub fn new() -> Self {
        Self {
            current: SessionId::new(),
        }
    }

    /// The active token. No side effects.
    pub fn current(&self) -> SessionId {
        self.current
    }

    /// Replace the active token with a fresh random one and return it.
    pub fn rotate(&mut self) -> SessionId {
        let previous = self.current;
        let mut next = SessionId::new();
        while next == previous {
            next = SessionId::new();
        }
        self.current = next;
        info!(session = %next, "Session identifier rotated");
        next
    }
}
