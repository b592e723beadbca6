//! Per-mode state shared between the controller and in-flight exchanges.
//!
//! A slot bundles a mode's log, its phase and the exchange currently allowed
//! to write to it. In-flight exchanges hold a clone of the handle taken at
//! submit time, so they keep writing to the slot they were issued against
//! after the UI switches modes. Only the active exchange may mutate the log.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::broadcast;
use tracing::{debug, warn};

use docent_core::events::LogUpdate;
use docent_core::types::{ChatMode, ExchangeId, MessageEntry};

use crate::state::ExchangePhase;
use crate::store::MessageLog;

#[derive(Debug, Default)]
struct ModeSlot {
    log: MessageLog,
    phase: ExchangePhase,
    active: Option<ExchangeId>,
    last_error: Option<String>,
}

impl ModeSlot {
    fn transition(&mut self, target: ExchangePhase) {
        if let Err(e) = self.phase.transition(target) {
            warn!(error = %e, "Ignoring phase transition");
        }
    }
}

/// Cloneable handle to one mode's slot.
#[derive(Debug, Clone)]
pub(crate) struct SlotHandle {
    mode: ChatMode,
    inner: Arc<Mutex<ModeSlot>>,
    events: broadcast::Sender<LogUpdate>,
}

impl SlotHandle {
    pub(crate) fn new(mode: ChatMode, events: broadcast::Sender<LogUpdate>) -> Self {
        Self {
            mode,
            inner: Arc::new(Mutex::new(ModeSlot::default())),
            events,
        }
    }

    pub(crate) fn mode(&self) -> ChatMode {
        self.mode
    }

    // Every mutation completes under one lock, so the log is never observed
    // half-updated and a poisoned lock still holds a consistent value.
    fn lock(&self) -> MutexGuard<'_, ModeSlot> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, slot: &ModeSlot, exchange: Option<ExchangeId>) {
        // No receivers is fine.
        let _ = self.events.send(LogUpdate {
            mode: self.mode,
            exchange,
            entries: slot.log.snapshot(),
        });
    }

    /// Make `exchange` the active one and append its user turn and placeholder.
    pub(crate) fn begin(&self, exchange: ExchangeId, text: &str, sentinel: &str) {
        let mut slot = self.lock();
        if let Some(previous) = slot.active.replace(exchange) {
            warn!(
                mode = %self.mode,
                superseded = %previous,
                exchange = %exchange,
                "New exchange supersedes one still in flight"
            );
        }
        slot.last_error = None;
        slot.transition(ExchangePhase::RequestInFlight);
        slot.log.begin_exchange(text, sentinel, exchange);
        self.publish(&slot, Some(exchange));
    }

    /// Apply `f` to the log if `exchange` is still active, then publish.
    ///
    /// Returns `false` (and leaves the log untouched) for stale exchanges.
    pub(crate) fn apply(&self, exchange: ExchangeId, f: impl FnOnce(&mut MessageLog)) -> bool {
        let mut slot = self.lock();
        if slot.active != Some(exchange) {
            warn!(mode = %self.mode, exchange = %exchange, "Dropping update from stale exchange");
            return false;
        }
        f(&mut slot.log);
        self.publish(&slot, Some(exchange));
        true
    }

    /// Close out `exchange`. A failure passes through `Error` on its way to `Idle`.
    pub(crate) fn complete(&self, exchange: ExchangeId, failure: Option<String>) -> bool {
        let mut slot = self.lock();
        if slot.active != Some(exchange) {
            debug!(mode = %self.mode, exchange = %exchange, "Stale exchange finished");
            return false;
        }
        slot.active = None;
        if let Some(reason) = failure {
            slot.transition(ExchangePhase::Error);
            slot.last_error = Some(reason);
        }
        slot.transition(ExchangePhase::Idle);
        true
    }

    /// Clear the log and retire any in-flight exchange.
    pub(crate) fn reset(&self) {
        let mut slot = self.lock();
        if let Some(retired) = slot.active.take() {
            debug!(mode = %self.mode, exchange = %retired, "Reset retires in-flight exchange");
        }
        slot.log.reset();
        slot.phase = ExchangePhase::Idle;
        slot.last_error = None;
        self.publish(&slot, None);
    }

    /// Follow the input buffer between `Idle` and `AwaitingUserInput`.
    pub(crate) fn sync_input(&self, has_input: bool) {
        let mut slot = self.lock();
        match (slot.phase, has_input) {
            (ExchangePhase::Idle, true) => slot.transition(ExchangePhase::AwaitingUserInput),
            (ExchangePhase::AwaitingUserInput, false) => slot.transition(ExchangePhase::Idle),
            _ => {}
        }
    }

    pub(crate) fn phase(&self) -> ExchangePhase {
        self.lock().phase
    }

    pub(crate) fn active(&self) -> Option<ExchangeId> {
        self.lock().active
    }

    pub(crate) fn last_error(&self) -> Option<String> {
        self.lock().last_error.clone()
    }

    pub(crate) fn snapshot(&self) -> Vec<MessageEntry> {
        self.lock().log.snapshot()
    }

    pub(crate) fn history(&self) -> Vec<MessageEntry> {
        self.lock().log.history()
    }
}
