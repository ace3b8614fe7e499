#![cfg(any(test, feature = "test-helpers"))]
//! Test-only helpers for shared test utilities.

use std::{io, sync::Mutex};

use async_trait::async_trait;

use crate::{
    fragment::{Fragment, Reassembler, decode},
    transport::Transmit,
};

/// [`Transmit`] implementation that records every datagram it is given.
///
/// Optionally fails the send attempt with the given zero-based index, which
/// lets tests observe how sessions react to a router that goes away.
#[derive(Debug, Default)]
pub struct RecordingTransmitter {
    sent: Mutex<Vec<Vec<u8>>>,
    fail_at: Option<usize>,
}

impl RecordingTransmitter {
    /// Create a transmitter whose `attempt`-th send fails.
    #[must_use]
    pub fn failing_at(attempt: usize) -> Self {
        Self {
            fail_at: Some(attempt),
            ..Self::default()
        }
    }

    /// Decode every recorded datagram.
    ///
    /// # Panics
    ///
    /// Panics if a recorded datagram is not a valid fragment.
    #[must_use]
    pub fn fragments(&self) -> Vec<Fragment> {
        self.sent
            .lock()
            .expect("sent lock")
            .iter()
            .map(|datagram| decode(datagram).expect("valid datagram"))
            .collect()
    }

    /// Reassemble the recorded fragments into the reply text.
    ///
    /// # Panics
    ///
    /// Panics if the recorded fragments do not form a complete UTF-8 message.
    #[must_use]
    pub fn reply_text(&self) -> String {
        let mut reassembler = Reassembler::new();
        for fragment in self.fragments() {
            reassembler.add_fragment(fragment);
        }
        String::from_utf8(reassembler.merge().expect("complete reply")).expect("utf-8 reply")
    }
}

#[async_trait]
impl Transmit for RecordingTransmitter {
    async fn send(&self, datagram: &[u8]) -> io::Result<()> {
        let mut sent = self
            .sent
            .lock()
            .map_err(|_| io::Error::other("recording lock poisoned"))?;
        if self.fail_at == Some(sent.len()) {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "router gone"));
        }
        sent.push(datagram.to_vec());
        Ok(())
    }
}
