//! Fragmentation and reassembly of messages larger than one datagram.
//!
//! This module collects the domain types used by the fragmentation layer:
//! the [`Fragment`] value, its wire [`codec`], the inbound [`Reassembler`]
//! and the outbound [`Fragmenter`]. Each sub-module focuses on a single
//! concept while the most common items are re-exported here.

pub mod codec;
pub mod error;
pub mod fragmenter;
pub mod packet;
pub mod reassembler;
pub mod sequence;

pub use codec::{HEADER_LEN, MAX_DATAGRAM_LEN, MAX_PAYLOAD_SIZE, decode, encode};
pub use error::{CodecError, FragmentError, FragmentationError, ReassemblyError};
pub use fragmenter::Fragmenter;
pub use packet::{Fragment, FragmentKind};
pub use reassembler::Reassembler;
pub use sequence::SequenceNumber;
