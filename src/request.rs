//! Requests handed from sessions to the application worker.
//!
//! Every session pushes exactly one [`Request`] onto the shared
//! [`RequestQueue`]. The request carries a single-use reply channel owned by
//! the session, so the worker answers the right client without any lookup.

use tokio::sync::{mpsc, oneshot};

use crate::reply::Reply;

/// A reassembled request body and the channel its reply must be sent on.
#[derive(Debug)]
pub struct Request {
    body: String,
    reply_tx: oneshot::Sender<Reply>,
}

impl Request {
    /// Create a request together with the receiver that observes its reply.
    #[must_use]
    pub fn new(body: impl Into<String>) -> (Self, oneshot::Receiver<Reply>) {
        let (reply_tx, reply_rx) = oneshot::channel();
        (
            Self {
                body: body.into(),
                reply_tx,
            },
            reply_rx,
        )
    }

    /// The request text as received from the client.
    #[must_use]
    pub fn body(&self) -> &str { &self.body }

    /// Report whether the originating session stopped waiting for a reply.
    #[must_use]
    pub fn is_abandoned(&self) -> bool { self.reply_tx.is_closed() }

    /// Deliver the reply to the originating session.
    ///
    /// # Errors
    ///
    /// Returns the reply back if the session has already gone away, for
    /// example after its reply deadline passed.
    pub fn respond(self, reply: Reply) -> Result<(), Reply> { self.reply_tx.send(reply) }
}

/// Producer side of the queue shared by all sessions.
#[derive(Clone, Debug)]
pub struct RequestQueue {
    tx: mpsc::UnboundedSender<Request>,
}

impl RequestQueue {
    /// Push a request for the worker.
    ///
    /// # Errors
    ///
    /// Returns the request back if the worker side of the queue was dropped.
    pub fn push(&self, request: Request) -> Result<(), Request> {
        self.tx.send(request).map_err(|err| err.0)
    }

    /// Report whether the worker side of the queue was dropped.
    #[must_use]
    pub fn is_closed(&self) -> bool { self.tx.is_closed() }
}

/// Consumer side of the request queue, owned by the application worker.
#[derive(Debug)]
pub struct RequestReceiver {
    rx: mpsc::UnboundedReceiver<Request>,
}

impl RequestReceiver {
    /// Wait for the next request, returning `None` once every session and
    /// the server have dropped their queue handles.
    pub async fn recv(&mut self) -> Option<Request> { self.rx.recv().await }

    /// Take the next request if one is already queued.
    pub fn try_recv(&mut self) -> Option<Request> { self.rx.try_recv().ok() }
}

/// Create an unbounded FIFO request queue.
#[must_use]
pub fn request_queue() -> (RequestQueue, RequestReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    (RequestQueue { tx }, RequestReceiver { rx })
}
