//! Tunables applied to every client session.

use std::{num::NonZeroUsize, time::Duration};

use crate::fragment::{FragmentError, MAX_PAYLOAD_SIZE};

/// Settings that bound reply fragment sizes and session lifetimes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SessionConfig {
    /// Largest payload carried by one outbound fragment.
    pub max_payload_size: NonZeroUsize,
    /// Time allowed from the first fragment until the request is complete.
    pub reassembly_timeout: Duration,
    /// Time allowed for the worker to reply once the request is queued.
    pub reply_timeout: Duration,
    /// Send a synthesized error reply when a deadline passes.
    pub notify_peer_on_timeout: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_payload_size: NonZeroUsize::new(MAX_PAYLOAD_SIZE).unwrap_or(NonZeroUsize::MIN),
            reassembly_timeout: Duration::from_secs(30),
            reply_timeout: Duration::from_secs(30),
            notify_peer_on_timeout: true,
        }
    }
}

impl SessionConfig {
    /// Return a copy of the configuration with a different payload cap.
    ///
    /// # Errors
    ///
    /// Returns [`FragmentError::PayloadTooLarge`] if `max_payload_size`
    /// cannot fit in a single datagram.
    pub fn with_max_payload_size(
        self,
        max_payload_size: NonZeroUsize,
    ) -> Result<Self, FragmentError> {
        if max_payload_size.get() > MAX_PAYLOAD_SIZE {
            return Err(FragmentError::PayloadTooLarge {
                len: max_payload_size.get(),
                max: MAX_PAYLOAD_SIZE,
            });
        }
        Ok(Self {
            max_payload_size,
            ..self
        })
    }

    #[must_use]
    pub fn with_reassembly_timeout(self, reassembly_timeout: Duration) -> Self {
        Self {
            reassembly_timeout,
            ..self
        }
    }

    #[must_use]
    pub fn with_reply_timeout(self, reply_timeout: Duration) -> Self {
        Self {
            reply_timeout,
            ..self
        }
    }

    #[must_use]
    pub fn with_timeout_notification(self, notify_peer_on_timeout: bool) -> Self {
        Self {
            notify_peer_on_timeout,
            ..self
        }
    }
}
