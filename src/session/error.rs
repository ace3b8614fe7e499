//! Errors that terminate a [`ClientSession`](crate::session::ClientSession).

use std::{io, time::Duration};

use thiserror::Error;

use super::SessionState;
use crate::fragment::{FragmentationError, ReassemblyError};

/// Reasons a session ended without delivering a reply.
///
/// Every variant is local to one session; nothing here is propagated to
/// other sessions.
#[derive(Debug, Error)]
pub enum SessionError {
    /// A fragment was routed to a session that is no longer collecting.
    #[error("fragment received while session is {state}")]
    UnexpectedFragment { state: SessionState },
    /// A step was attempted out of order.
    #[error("cannot {operation} while session is {state}")]
    InvalidState {
        operation: &'static str,
        state: SessionState,
    },
    /// The request did not complete before the reassembly deadline.
    #[error("request not reassembled within {0:?}")]
    ReassemblyTimeout(Duration),
    /// The worker did not reply before the reply deadline.
    #[error("no reply within {0:?}")]
    ReplyTimeout(Duration),
    /// The worker dropped the request without replying.
    #[error("worker dropped the request without replying")]
    ReplyDropped,
    /// The worker side of the request queue is gone.
    #[error("request queue closed")]
    QueueClosed,
    /// The dispatcher stopped feeding fragments before the request completed.
    #[error("inbound fragment channel closed before the request completed")]
    InboundClosed,
    /// The reassembled request was not valid UTF-8.
    #[error("request body is not valid UTF-8")]
    InvalidBody,
    /// Merging was attempted before the request was complete.
    #[error(transparent)]
    Reassembly(#[from] ReassemblyError),
    /// The reply could not be split into fragments.
    #[error(transparent)]
    Fragmentation(#[from] FragmentationError),
    /// Sending a reply fragment to the router failed.
    #[error("failed to transmit reply fragment {sequence}: {source}")]
    Transmit {
        sequence: u32,
        #[source]
        source: io::Error,
    },
}
