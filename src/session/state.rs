//! Session lifecycle states.

use derive_more::Display;

/// Lifecycle of a [`ClientSession`](crate::session::ClientSession).
///
/// Sessions move strictly forward:
/// `Collecting -> Dispatched -> AwaitingReply -> Responding -> Done`.
/// Failures jump straight to `Done` after an optional error reply.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Display)]
pub enum SessionState {
    /// Receiving request fragments.
    #[display("collecting")]
    Collecting,
    /// The request is complete and about to be queued.
    #[display("dispatched")]
    Dispatched,
    /// Waiting for the worker's reply.
    #[display("awaiting reply")]
    AwaitingReply,
    /// Formatting and transmitting the reply.
    #[display("responding")]
    Responding,
    /// Finished; no further input is accepted.
    #[display("done")]
    Done,
}
