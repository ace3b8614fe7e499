//! Outbound helper that splits replies into router-bound fragments.
//!
//! [`Fragmenter`] cuts text into chunks of at most `max_payload_size` bytes,
//! numbers them from one, and marks the last chunk terminal. Every fragment is
//! addressed to the same peer, which the router uses to forward it.

use std::{net::SocketAddrV4, num::NonZeroUsize};

use super::{Fragment, FragmentError, FragmentKind, FragmentationError, MAX_PAYLOAD_SIZE, SequenceNumber};

/// Splits outbound messages into fragment-sized pieces.
#[derive(Clone, Copy, Debug)]
pub struct Fragmenter {
    max_payload_size: NonZeroUsize,
}

impl Fragmenter {
    /// Create a fragmenter that caps fragment payloads at `max_payload_size` bytes.
    ///
    /// # Errors
    ///
    /// Returns [`FragmentError::PayloadTooLarge`] if `max_payload_size` does
    /// not fit into a single datagram.
    pub const fn new(max_payload_size: NonZeroUsize) -> Result<Self, FragmentError> {
        if max_payload_size.get() > MAX_PAYLOAD_SIZE {
            return Err(FragmentError::PayloadTooLarge {
                len: max_payload_size.get(),
                max: MAX_PAYLOAD_SIZE,
            });
        }
        Ok(Self { max_payload_size })
    }

    /// Return the maximum fragment payload size in bytes.
    #[must_use]
    pub const fn max_payload_size(&self) -> NonZeroUsize { self.max_payload_size }

    /// Split `text` into fragments addressed to `peer`.
    ///
    /// An empty `text` still yields one terminal fragment.
    ///
    /// # Errors
    ///
    /// Returns [`FragmentationError::SequenceOverflow`] if the message needs
    /// more than `u32::MAX` fragments.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::{net::{Ipv4Addr, SocketAddrV4}, num::NonZeroUsize};
    ///
    /// use relayhttp::fragment::{FragmentKind, Fragmenter};
    ///
    /// let fragmenter = Fragmenter::new(NonZeroUsize::new(8).expect("non-zero")).expect("fits");
    /// let peer = SocketAddrV4::new(Ipv4Addr::LOCALHOST, 41830);
    /// let fragments = fragmenter.split("GET /file HTTP/1.1", peer).expect("split");
    /// let kinds: Vec<_> = fragments.iter().map(|f| f.kind()).collect();
    /// assert_eq!(
    ///     kinds,
    ///     [FragmentKind::Data, FragmentKind::Data, FragmentKind::Terminal]
    /// );
    /// ```
    pub fn split(
        &self,
        text: &str,
        peer: SocketAddrV4,
    ) -> Result<Vec<Fragment>, FragmentationError> {
        self.split_bytes(text.as_bytes(), peer)
    }

    /// Split raw bytes into fragments addressed to `peer`.
    ///
    /// # Errors
    ///
    /// Returns [`FragmentationError::SequenceOverflow`] if the message needs
    /// more than `u32::MAX` fragments.
    pub fn split_bytes(
        &self,
        payload: &[u8],
        peer: SocketAddrV4,
    ) -> Result<Vec<Fragment>, FragmentationError> {
        let max = self.max_payload_size.get();
        if payload.is_empty() {
            let fragment = Self::build(FragmentKind::Terminal, SequenceNumber::first(), peer, &[])?;
            return Ok(vec![fragment]);
        }

        let count = payload.len().div_ceil(max);
        let mut fragments = Vec::with_capacity(count);
        let mut sequence = SequenceNumber::first();
        let mut chunks = payload.chunks(max).peekable();

        while let Some(chunk) = chunks.next() {
            let is_last = chunks.peek().is_none();
            fragments.push(Self::build(
                FragmentKind::for_position(is_last),
                sequence,
                peer,
                chunk,
            )?);
            if is_last {
                break;
            }
            sequence = sequence
                .checked_increment()
                .ok_or(FragmentationError::SequenceOverflow { last: sequence })?;
        }

        Ok(fragments)
    }

    fn build(
        kind: FragmentKind,
        sequence: SequenceNumber,
        peer: SocketAddrV4,
        chunk: &[u8],
    ) -> Result<Fragment, FragmentError> {
        Fragment::new(kind, sequence, *peer.ip(), peer.port(), chunk.to_vec())
    }
}

impl Default for Fragmenter {
    fn default() -> Self {
        Self {
            max_payload_size: NonZeroUsize::new(MAX_PAYLOAD_SIZE).unwrap_or(NonZeroUsize::MIN),
        }
    }
}
