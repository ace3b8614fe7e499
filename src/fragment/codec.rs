//! Byte layout of a fragment on the wire.
//!
//! All multi-byte integers are big-endian.
//!
//! ```text
//! +--------+-----------------+-----------------+-----------+-------------+
//! |  kind  | sequence number |  peer address   | peer port |   payload   |
//! |   u8   |       u32       |   IPv4 octets   |    u16    | 0..=1013 B  |
//! +--------+-----------------+-----------------+-----------+-------------+
//! ```
//!
//! The kind tag is `0` for [`FragmentKind::Data`] and `2` for
//! [`FragmentKind::Terminal`]. The router relaying datagrams between client
//! and server reads and rewrites the peer address and port fields, so the
//! layout is fixed rather than versioned.

use std::net::Ipv4Addr;

use bytes::{Buf, BufMut, Bytes, BytesMut};

use super::{CodecError, Fragment, FragmentKind, SequenceNumber};

/// Length of the fixed fragment header in bytes.
pub const HEADER_LEN: usize = 11;
/// Largest datagram the protocol exchanges.
pub const MAX_DATAGRAM_LEN: usize = 1024;
/// Largest payload a single fragment carries.
pub const MAX_PAYLOAD_SIZE: usize = MAX_DATAGRAM_LEN - HEADER_LEN;

const DATA_TAG: u8 = 0;
const TERMINAL_TAG: u8 = 2;

impl FragmentKind {
    const fn tag(self) -> u8 {
        match self {
            Self::Data => DATA_TAG,
            Self::Terminal => TERMINAL_TAG,
        }
    }

    fn from_tag(tag: u8) -> Result<Self, CodecError> {
        match tag {
            DATA_TAG => Ok(Self::Data),
            TERMINAL_TAG => Ok(Self::Terminal),
            tag => Err(CodecError::UnknownKind { tag }),
        }
    }
}

/// Serialize `fragment` into a datagram.
///
/// # Examples
///
/// ```
/// use std::net::Ipv4Addr;
///
/// use relayhttp::fragment::{Fragment, FragmentKind, SequenceNumber, decode, encode};
///
/// let fragment = Fragment::new(
///     FragmentKind::Data,
///     SequenceNumber::first(),
///     Ipv4Addr::new(10, 0, 0, 7),
///     5000,
///     b"hello".to_vec(),
/// )
/// .expect("payload fits");
/// let datagram = encode(&fragment);
/// assert_eq!(datagram.len(), 11 + 5);
/// assert_eq!(decode(&datagram).expect("decodes"), fragment);
/// ```
#[must_use]
pub fn encode(fragment: &Fragment) -> Bytes {
    let mut buf = BytesMut::with_capacity(HEADER_LEN + fragment.payload().len());
    buf.put_u8(fragment.kind().tag());
    buf.put_u32(fragment.sequence().get());
    buf.put_slice(&fragment.peer_address().octets());
    buf.put_u16(fragment.port());
    buf.put_slice(fragment.payload());
    buf.freeze()
}

/// Parse a datagram into a [`Fragment`].
///
/// # Errors
///
/// Returns a [`CodecError`] when the datagram is shorter than the header,
/// longer than [`MAX_DATAGRAM_LEN`], carries an unknown kind tag, or has a
/// zero sequence number.
pub fn decode(datagram: &[u8]) -> Result<Fragment, CodecError> {
    let len = datagram.len();
    if len < HEADER_LEN {
        return Err(CodecError::Truncated {
            len,
            header: HEADER_LEN,
        });
    }
    if len > MAX_DATAGRAM_LEN {
        return Err(CodecError::Oversized {
            len,
            max: MAX_DATAGRAM_LEN,
        });
    }

    let mut buf = datagram;
    let kind = FragmentKind::from_tag(buf.get_u8())?;
    let sequence = SequenceNumber::new(buf.get_u32()).ok_or(CodecError::ZeroSequence)?;
    let peer_address = Ipv4Addr::from(buf.get_u32());
    let port = buf.get_u16();
    let payload = buf.to_vec();

    // The length checks above keep the payload within MAX_PAYLOAD_SIZE.
    Fragment::new(kind, sequence, peer_address, port, payload).map_err(|_| {
        CodecError::Oversized {
            len,
            max: MAX_DATAGRAM_LEN,
        }
    })
}
