//! Stream assembly: folds a live fragment stream into one growing message.
//!
//! Fragments are partial pieces of a single answer, so they are concatenated
//! into an accumulator. After each fragment the trailing placeholder is
//! removed and the exchange's assistant entry is set to the accumulator,
//! and the new log is published immediately.

use futures::{Stream, StreamExt};
use tracing::{debug, warn};

use docent_core::types::ExchangeId;

use crate::error::ChatError;
use crate::slot::SlotHandle;

// =============================================================================
// Utf8Decoder
// =============================================================================

/// Incremental UTF-8 decoder.
///
/// A multi-byte character split across two network chunks is carried over
/// to the next call instead of being corrupted.
#[derive(Debug, Default)]
pub struct Utf8Decoder {
    carry: Vec<u8>,
}

impl Utf8Decoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode `chunk`, returning the text that is complete so far.
    pub fn decode(&mut self, chunk: &[u8]) -> Result<String, ChatError> {
        self.carry.extend_from_slice(chunk);
        match std::str::from_utf8(&self.carry) {
            Ok(text) => {
                let text = text.to_owned();
                self.carry.clear();
                Ok(text)
            }
            // Truncated sequence at the end: keep the tail for the next chunk.
            Err(e) if e.error_len().is_none() => {
                let valid = e.valid_up_to();
                let tail = self.carry.split_off(valid);
                let text = String::from_utf8(std::mem::replace(&mut self.carry, tail))
                    .map_err(|e| ChatError::MalformedFragment(e.to_string()))?;
                Ok(text)
            }
            Err(e) => {
                self.carry.clear();
                Err(ChatError::MalformedFragment(e.to_string()))
            }
        }
    }

    /// Flush at end of stream. Leftover bytes mean the stream was cut mid-character.
    pub fn finish(&mut self) -> Result<(), ChatError> {
        if self.carry.is_empty() {
            Ok(())
        } else {
            let n = self.carry.len();
            self.carry.clear();
            Err(ChatError::MalformedFragment(format!(
                "stream ended inside a {n}-byte partial character"
            )))
        }
    }
}

// =============================================================================
// StreamAssembler
// =============================================================================

/// How a streamed exchange ended.
#[derive(Debug)]
pub enum Assembly {
    /// The stream closed normally; `content` is the permanent answer.
    Completed { content: String },
    /// The stream broke. Content already published stays in the log.
    Failed {
        error: ChatError,
        received_any: bool,
    },
    /// A newer exchange took over the log; nothing more was written.
    Superseded,
}

/// Accumulates fragments for one exchange.
#[derive(Debug)]
pub struct StreamAssembler {
    exchange: ExchangeId,
    accumulated: String,
    decoder: Utf8Decoder,
    fragments: usize,
}

impl StreamAssembler {
    pub fn new(exchange: ExchangeId) -> Self {
        Self {
            exchange,
            accumulated: String::new(),
            decoder: Utf8Decoder::new(),
            fragments: 0,
        }
    }

    pub fn exchange(&self) -> ExchangeId {
        self.exchange
    }

    pub fn accumulated(&self) -> &str {
        &self.accumulated
    }

    pub fn received_any(&self) -> bool {
        self.fragments > 0
    }

    /// Append a text fragment and return the running answer.
    pub fn push_text(&mut self, fragment: &str) -> &str {
        self.fragments += 1;
        self.accumulated.push_str(fragment);
        &self.accumulated
    }

    /// Decode a raw fragment and append it.
    pub fn push_bytes(&mut self, fragment: &[u8]) -> Result<&str, ChatError> {
        let text = self.decoder.decode(fragment)?;
        Ok(self.push_text(&text))
    }

    /// Drain `stream` into `slot`, publishing after every fragment.
    pub(crate) async fn consume<S>(mut self, mut stream: S, slot: &SlotHandle) -> Assembly
    where
        S: Stream<Item = Result<Vec<u8>, ChatError>> + Unpin,
    {
        let exchange = self.exchange;
        while let Some(item) = stream.next().await {
            let pushed = item.and_then(|bytes| self.push_bytes(&bytes).map(str::to_owned));
            let running = match pushed {
                Ok(running) => running,
                Err(error) => return self.fail(error),
            };
            debug!(
                exchange = %exchange,
                fragments = self.fragments,
                chars = running.len(),
                "Fragment received"
            );
            if !slot.apply(exchange, |log| log.finalize(&running, exchange)) {
                return Assembly::Superseded;
            }
        }

        if let Err(error) = self.decoder.finish() {
            return self.fail(error);
        }
        // A clean close with no fragments still retires the placeholder.
        if !self.received_any() && !slot.apply(exchange, |log| log.finalize("", exchange)) {
            return Assembly::Superseded;
        }
        Assembly::Completed {
            content: self.accumulated,
        }
    }

    fn fail(&self, error: ChatError) -> Assembly {
        warn!(
            exchange = %self.exchange,
            error = %error,
            fragments = self.fragments,
            "Stream terminated abnormally"
        );
        Assembly::Failed {
            error,
            received_any: self.received_any(),
        }
    }
}
