//! Per-client request/reply state machine.
//!
//! A [`ClientSession`] handles exactly one request/reply cycle for one peer.
//! It collects request fragments until the [`Reassembler`] reports the
//! message complete, queues the request for the application worker, waits for
//! the reply on a private channel, then formats, fragments and transmits the
//! reply through the router. Both waits are bounded by the deadlines in
//! [`SessionConfig`]; when one passes the session optionally answers with an
//! error reply and finishes.

mod config;
mod counter;
mod error;
mod state;

use std::net::SocketAddrV4;

pub use config::SessionConfig;
pub use counter::{ActiveSessions, SessionGuard};
pub use error::SessionError;
use log::{debug, info, warn};
pub use state::SessionState;
use tokio::{
    sync::{mpsc, oneshot},
    time::{Instant, timeout, timeout_at},
};

use crate::{
    fragment::{self, Fragment, FragmentationError, Fragmenter, Reassembler},
    metrics::{self, Direction},
    reply::{self, Reply},
    request::{Request, RequestQueue},
    transport::Transmit,
};

/// Summary of a session that delivered its reply.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SessionReport {
    /// Status code of the reply that was sent.
    pub status: u16,
    /// Number of fragments transmitted to the router.
    pub fragments_sent: usize,
}

/// State for one client's request/reply cycle.
#[derive(Debug)]
pub struct ClientSession {
    peer: SocketAddrV4,
    state: SessionState,
    reassembler: Reassembler,
    fragmenter: Fragmenter,
    config: SessionConfig,
    started_at: Instant,
    _guard: SessionGuard,
}

impl ClientSession {
    /// Start a session for `peer`, registering it with `sessions`.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Fragmentation`] if the configured payload cap
    /// does not fit in a datagram.
    pub fn new(
        peer: SocketAddrV4,
        config: SessionConfig,
        sessions: &ActiveSessions,
    ) -> Result<Self, SessionError> {
        let fragmenter =
            Fragmenter::new(config.max_payload_size).map_err(FragmentationError::from)?;
        let guard = sessions.enter();
        info!(
            "session started: peer={peer}, active_sessions={}",
            sessions.get()
        );
        Ok(Self {
            peer,
            state: SessionState::Collecting,
            reassembler: Reassembler::new(),
            fragmenter,
            config,
            started_at: Instant::now(),
            _guard: guard,
        })
    }

    /// Peer this session answers.
    #[must_use]
    pub const fn peer(&self) -> SocketAddrV4 { self.peer }

    /// Current lifecycle state.
    #[must_use]
    pub const fn state(&self) -> SessionState { self.state }

    /// Feed one request fragment.
    ///
    /// Returns the merged request body once the fragment completes the
    /// request, moving the session to [`SessionState::Dispatched`].
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::UnexpectedFragment`] if the session is no
    /// longer collecting.
    pub fn add_fragment(&mut self, fragment: Fragment) -> Result<Option<Vec<u8>>, SessionError> {
        if self.state != SessionState::Collecting {
            return Err(SessionError::UnexpectedFragment { state: self.state });
        }
        debug!(
            "request fragment received: peer={}, sequence={}, kind={:?}",
            self.peer,
            fragment.sequence(),
            fragment.kind()
        );
        metrics::inc_fragments(Direction::Inbound);

        self.reassembler.add_fragment(fragment);
        if !self.reassembler.is_complete() {
            return Ok(None);
        }

        let body = self.reassembler.merge()?;
        self.reassembler = Reassembler::new();
        self.transition(SessionState::Dispatched);
        Ok(Some(body))
    }

    /// Queue the merged request for the worker.
    ///
    /// Returns the receiver on which the worker's single reply arrives.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::InvalidState`] unless the session is
    /// [`SessionState::Dispatched`], [`SessionError::InvalidBody`] for
    /// non-UTF-8 bodies, and [`SessionError::QueueClosed`] if the worker is
    /// gone.
    pub fn dispatch(
        &mut self,
        body: Vec<u8>,
        queue: &RequestQueue,
    ) -> Result<oneshot::Receiver<Reply>, SessionError> {
        self.expect_state("dispatch", SessionState::Dispatched)?;
        let body = String::from_utf8(body).map_err(|_| SessionError::InvalidBody)?;
        let (request, reply_rx) = Request::new(body);
        queue.push(request).map_err(|_| SessionError::QueueClosed)?;
        self.transition(SessionState::AwaitingReply);
        Ok(reply_rx)
    }

    /// Wait for the worker's reply, bounded by the reply deadline.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::ReplyTimeout`] when the deadline passes and
    /// [`SessionError::ReplyDropped`] when the worker drops the request.
    pub async fn await_reply(
        &mut self,
        reply_rx: oneshot::Receiver<Reply>,
    ) -> Result<Reply, SessionError> {
        self.expect_state("await reply", SessionState::AwaitingReply)?;
        let limit = self.config.reply_timeout;
        match timeout(limit, reply_rx).await {
            Ok(Ok(reply)) => Ok(reply),
            Ok(Err(_)) => Err(SessionError::ReplyDropped),
            Err(_) => Err(SessionError::ReplyTimeout(limit)),
        }
    }

    /// Format `reply`, split it into fragments and send them in sequence
    /// order. The session is [`SessionState::Done`] afterwards, even when a
    /// send fails part way through.
    ///
    /// Returns the number of fragments sent.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::InvalidState`] if the session already
    /// responded and [`SessionError::Transmit`] for the first failed send;
    /// remaining fragments are not sent.
    pub async fn respond<T>(&mut self, reply: &Reply, transport: &T) -> Result<usize, SessionError>
    where
        T: Transmit + ?Sized,
    {
        if matches!(self.state, SessionState::Responding | SessionState::Done) {
            return Err(SessionError::InvalidState {
                operation: "respond",
                state: self.state,
            });
        }
        self.transition(SessionState::Responding);
        let result = self.transmit(reply, transport).await;
        self.transition(SessionState::Done);
        result
    }

    /// Drive the whole cycle: collect fragments from `inbound`, queue the
    /// request, wait for the reply and transmit it.
    ///
    /// # Errors
    ///
    /// Returns the [`SessionError`] that ended the session early. Timeouts and
    /// worker failures are answered with a synthesized error reply when
    /// [`SessionConfig::notify_peer_on_timeout`] is set; invalid request
    /// bodies are always answered with `400`.
    pub async fn run<T>(
        mut self,
        mut inbound: mpsc::Receiver<Fragment>,
        queue: &RequestQueue,
        transport: &T,
    ) -> Result<SessionReport, SessionError>
    where
        T: Transmit + ?Sized,
    {
        let result = self.drive(&mut inbound, queue, transport).await;
        match &result {
            Ok(report) => info!(
                "reply sent: peer={}, status={}, fragments={}",
                self.peer, report.status, report.fragments_sent
            ),
            Err(err) => {
                metrics::inc_errors();
                warn!("session failed: peer={}, error={err}", self.peer);
                if let Some(reply) = self.error_reply(err)
                    && let Err(e) = self.respond(&reply, transport).await
                {
                    warn!("error reply not delivered: peer={}, error={e}", self.peer);
                }
                self.state = SessionState::Done;
            }
        }
        result
    }

    async fn drive<T>(
        &mut self,
        inbound: &mut mpsc::Receiver<Fragment>,
        queue: &RequestQueue,
        transport: &T,
    ) -> Result<SessionReport, SessionError>
    where
        T: Transmit + ?Sized,
    {
        let body = self.collect(inbound).await;
        // Late re-deliveries are refused by the dispatcher from here on.
        inbound.close();
        let reply_rx = self.dispatch(body?, queue)?;
        let reply = self.await_reply(reply_rx).await?;
        let fragments_sent = self.respond(&reply, transport).await?;
        Ok(SessionReport {
            status: reply.status_code(),
            fragments_sent,
        })
    }

    async fn collect(
        &mut self,
        inbound: &mut mpsc::Receiver<Fragment>,
    ) -> Result<Vec<u8>, SessionError> {
        let limit = self.config.reassembly_timeout;
        timeout_at(self.started_at + limit, self.next_request(inbound))
            .await
            .map_err(|_| SessionError::ReassemblyTimeout(limit))?
    }

    async fn next_request(
        &mut self,
        inbound: &mut mpsc::Receiver<Fragment>,
    ) -> Result<Vec<u8>, SessionError> {
        while let Some(fragment) = inbound.recv().await {
            if let Some(body) = self.add_fragment(fragment)? {
                return Ok(body);
            }
        }
        Err(SessionError::InboundClosed)
    }

    async fn transmit<T>(&self, reply: &Reply, transport: &T) -> Result<usize, SessionError>
    where
        T: Transmit + ?Sized,
    {
        let text = reply::format(reply);
        let fragments = self.fragmenter.split(&text, self.peer)?;
        for fragment in &fragments {
            let sequence = fragment.sequence();
            transport
                .send(&fragment::encode(fragment))
                .await
                .map_err(|source| SessionError::Transmit {
                    sequence: sequence.get(),
                    source,
                })?;
            metrics::inc_fragments(Direction::Outbound);
            debug!(
                "reply fragment sent: peer={}, sequence={sequence}",
                self.peer
            );
        }
        Ok(fragments.len())
    }

    fn error_reply(&self, err: &SessionError) -> Option<Reply> {
        let notify = self.config.notify_peer_on_timeout;
        match err {
            SessionError::InvalidBody => Some(Reply::status(400)),
            SessionError::ReassemblyTimeout(_) if notify => Some(Reply::status(400)),
            SessionError::ReplyTimeout(_) | SessionError::ReplyDropped | SessionError::QueueClosed
                if notify =>
            {
                Some(Reply::status(500))
            }
            _ => None,
        }
    }

    fn expect_state(
        &self,
        operation: &'static str,
        expected: SessionState,
    ) -> Result<(), SessionError> {
        if self.state == expected {
            Ok(())
        } else {
            Err(SessionError::InvalidState {
                operation,
                state: self.state,
            })
        }
    }

    fn transition(&mut self, next: SessionState) {
        debug!(
            "session state change: peer={}, from={}, to={next}",
            self.peer, self.state
        );
        self.state = next;
    }
}

impl Drop for ClientSession {
    fn drop(&mut self) {
        info!("session finished: peer={}, state={}", self.peer, self.state);
    }
}
