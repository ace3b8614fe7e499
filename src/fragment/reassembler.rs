//! Inbound helper that stitches fragments back into complete messages.
//!
//! [`Reassembler`] mirrors the outbound [`Fragmenter`](crate::fragment::Fragmenter).
//! Fragments are keyed by sequence number, so arrival order does not matter
//! and a re-delivered fragment simply replaces the earlier copy. The helper
//! never expires anything on its own; the owning session enforces the
//! reassembly deadline.

use std::collections::BTreeMap;

use super::{Fragment, ReassemblyError, SequenceNumber};

/// Collects the fragments of one logical message.
#[derive(Debug, Default)]
pub struct Reassembler {
    payloads: BTreeMap<SequenceNumber, Vec<u8>>,
    highest: Option<SequenceNumber>,
    terminal: Option<SequenceNumber>,
}

impl Reassembler {
    /// Create an empty reassembler.
    #[must_use]
    pub fn new() -> Self { Self::default() }

    /// Record `fragment` under its sequence number.
    ///
    /// Re-delivering a sequence number overwrites the stored payload.
    pub fn add_fragment(&mut self, fragment: Fragment) {
        let sequence = fragment.sequence();
        if fragment.kind().is_terminal() {
            self.terminal = Some(sequence);
        }
        self.highest = self.highest.max(Some(sequence));
        self.payloads.insert(sequence, fragment.into_payload());
    }

    /// Report whether the terminal fragment and every fragment before it
    /// have been recorded.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        let Some(terminal) = self.terminal else {
            return false;
        };
        let present = self.payloads.range(..=terminal).count();
        usize::try_from(terminal.get()).is_ok_and(|expected| present == expected)
    }

    /// Concatenate the recorded payloads in ascending sequence order.
    ///
    /// Fragments numbered above the terminal fragment are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`ReassemblyError::IncompleteMessage`] when called before
    /// [`is_complete`](Self::is_complete) reports `true`.
    pub fn merge(&self) -> Result<Vec<u8>, ReassemblyError> {
        let terminal = match self.terminal {
            Some(terminal) if self.is_complete() => terminal,
            terminal => {
                return Err(ReassemblyError::IncompleteMessage {
                    received: self.payloads.len(),
                    terminal,
                });
            }
        };

        let parts = self.payloads.range(..=terminal);
        let total = parts.clone().map(|(_, payload)| payload.len()).sum();
        let mut merged = Vec::with_capacity(total);
        for (_, payload) in parts {
            merged.extend_from_slice(payload);
        }
        Ok(merged)
    }

    /// Number of distinct sequence numbers recorded so far.
    #[must_use]
    pub fn buffered_len(&self) -> usize { self.payloads.len() }

    /// Highest sequence number seen so far.
    #[must_use]
    pub const fn highest(&self) -> Option<SequenceNumber> { self.highest }

    /// Sequence number of the terminal fragment, once seen.
    #[must_use]
    pub const fn terminal(&self) -> Option<SequenceNumber> { self.terminal }
}
