//! Error types emitted by the fragmentation layer.
//!
//! Decoding, construction and reassembly failures are kept apart so callers
//! can tell a corrupt datagram (drop it and carry on) from a programming error
//! (merging a message that is not complete yet).

use thiserror::Error;

use super::SequenceNumber;

/// Errors raised while building a [`Fragment`](crate::fragment::Fragment).
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum FragmentError {
    /// Sequence numbers start at one.
    #[error("fragment sequence numbers start at 1, got 0")]
    ZeroSequence,
    /// The payload does not fit into a single datagram.
    #[error("fragment payload of {len} bytes exceeds the {max} byte limit")]
    PayloadTooLarge { len: usize, max: usize },
}

/// A datagram could not be decoded into a fragment.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum CodecError {
    /// The buffer is shorter than the fixed fragment header.
    #[error("malformed fragment: {len} bytes is shorter than the {header} byte header")]
    Truncated { len: usize, header: usize },
    /// The buffer is longer than any fragment the protocol allows.
    #[error("malformed fragment: {len} bytes exceeds the {max} byte datagram limit")]
    Oversized { len: usize, max: usize },
    /// The kind tag is not one of the known values.
    #[error("malformed fragment: unknown kind tag {tag}")]
    UnknownKind { tag: u8 },
    /// The sequence number field holds zero.
    #[error("malformed fragment: sequence number must not be zero")]
    ZeroSequence,
}

/// Errors produced while reassembling inbound fragments.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum ReassemblyError {
    /// `merge` was called before the message was complete.
    #[error("message incomplete: {received} fragments buffered, terminal {terminal:?}")]
    IncompleteMessage {
        received: usize,
        terminal: Option<SequenceNumber>,
    },
}

/// Errors produced while splitting outbound text into fragments.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum FragmentationError {
    /// The sequence number cannot advance because it would overflow `u32`.
    #[error("fragment sequence overflow after {last}")]
    SequenceOverflow { last: SequenceNumber },
    /// A chunk could not be turned into a fragment.
    #[error(transparent)]
    Fragment(#[from] FragmentError),
}
