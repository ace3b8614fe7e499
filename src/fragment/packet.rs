//! The [`Fragment`] value exchanged with the router.

use std::net::{Ipv4Addr, SocketAddrV4};

use super::{FragmentError, MAX_PAYLOAD_SIZE, SequenceNumber};

/// Whether a fragment is followed by more fragments of the same message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FragmentKind {
    /// More fragments follow.
    Data,
    /// Last fragment of the message.
    Terminal,
}

impl FragmentKind {
    /// Return `Terminal` for the last chunk and `Data` otherwise.
    #[must_use]
    pub const fn for_position(is_last: bool) -> Self {
        if is_last { Self::Terminal } else { Self::Data }
    }

    /// Report whether this kind ends a message.
    #[must_use]
    pub const fn is_terminal(self) -> bool { matches!(self, Self::Terminal) }
}

/// One datagram-sized piece of a logical message.
///
/// Fragments are immutable once built; [`Fragment::new`] validates the
/// payload length so every value can be encoded into a single datagram.
///
/// # Examples
///
/// ```
/// use std::net::Ipv4Addr;
///
/// use relayhttp::fragment::{Fragment, FragmentKind, SequenceNumber};
///
/// let fragment = Fragment::new(
///     FragmentKind::Terminal,
///     SequenceNumber::first(),
///     Ipv4Addr::LOCALHOST,
///     41830,
///     b"GET / HTTP/1.1".to_vec(),
/// )
/// .expect("payload fits");
/// assert!(fragment.kind().is_terminal());
/// assert_eq!(fragment.peer().port(), 41830);
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Fragment {
    kind: FragmentKind,
    sequence: SequenceNumber,
    peer_address: Ipv4Addr,
    port: u16,
    payload: Vec<u8>,
}

impl Fragment {
    /// Build a fragment.
    ///
    /// # Errors
    ///
    /// Returns [`FragmentError::PayloadTooLarge`] when `payload` exceeds
    /// [`MAX_PAYLOAD_SIZE`].
    pub fn new(
        kind: FragmentKind,
        sequence: SequenceNumber,
        peer_address: Ipv4Addr,
        port: u16,
        payload: Vec<u8>,
    ) -> Result<Self, FragmentError> {
        if payload.len() > MAX_PAYLOAD_SIZE {
            return Err(FragmentError::PayloadTooLarge {
                len: payload.len(),
                max: MAX_PAYLOAD_SIZE,
            });
        }
        Ok(Self {
            kind,
            sequence,
            peer_address,
            port,
            payload,
        })
    }

    /// Build a fragment from a raw sequence value.
    ///
    /// # Errors
    ///
    /// Returns [`FragmentError::ZeroSequence`] for a zero sequence number and
    /// [`FragmentError::PayloadTooLarge`] for an oversized payload.
    pub fn with_raw_sequence(
        kind: FragmentKind,
        sequence: u32,
        peer_address: Ipv4Addr,
        port: u16,
        payload: Vec<u8>,
    ) -> Result<Self, FragmentError> {
        let sequence = SequenceNumber::new(sequence).ok_or(FragmentError::ZeroSequence)?;
        Self::new(kind, sequence, peer_address, port, payload)
    }

    #[must_use]
    pub const fn kind(&self) -> FragmentKind { self.kind }

    #[must_use]
    pub const fn sequence(&self) -> SequenceNumber { self.sequence }

    /// Address of the client this fragment belongs to.
    #[must_use]
    pub const fn peer_address(&self) -> Ipv4Addr { self.peer_address }

    /// Port of the client this fragment belongs to.
    #[must_use]
    pub const fn port(&self) -> u16 { self.port }

    /// Socket address identifying the client session.
    #[must_use]
    pub const fn peer(&self) -> SocketAddrV4 { SocketAddrV4::new(self.peer_address, self.port) }

    #[must_use]
    pub fn payload(&self) -> &[u8] { self.payload.as_slice() }

    /// Consume the fragment, returning its payload.
    #[must_use]
    pub fn into_payload(self) -> Vec<u8> { self.payload }
}
