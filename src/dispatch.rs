//! Demultiplexing of inbound fragments onto per-client sessions.
//!
//! [`Dispatcher`] keeps one live [`ClientSession`] per peer (address and
//! port carried in the fragment). The first fragment from an unknown peer
//! starts a session task; later fragments are forwarded through that
//! session's inbox. Entries are removed when the session task ends, so the
//! next fragment from the same peer starts a fresh one-shot session.

use std::{
    any::Any,
    net::SocketAddrV4,
    panic::AssertUnwindSafe,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
};

use dashmap::{DashMap, mapref::entry::Entry};
use futures::FutureExt;
use log::{debug, error, warn};
use thiserror::Error;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio_util::task::TaskTracker;

use crate::{
    fragment::Fragment,
    metrics,
    request::RequestQueue,
    session::{ActiveSessions, ClientSession, SessionConfig, SessionError},
    transport::Transmit,
};

/// Inbound fragments buffered per session before new ones are dropped.
pub const DEFAULT_INBOX_CAPACITY: usize = 64;

/// How a fragment was routed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Routed {
    /// The fragment started a new session.
    NewSession,
    /// The fragment was handed to a live session.
    ExistingSession,
}

/// Reasons a fragment could not be routed.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The session's inbox is full.
    #[error("session inbox for {peer} is full")]
    InboxFull { peer: SocketAddrV4 },
    /// The session already has its whole request and accepts no more fragments.
    #[error("session for {peer} no longer accepts fragments")]
    SessionClosed { peer: SocketAddrV4 },
    /// A new session could not be created.
    #[error(transparent)]
    Session(#[from] SessionError),
}

#[derive(Debug)]
struct SessionEntry {
    id: u64,
    inbox: mpsc::Sender<Fragment>,
}

/// Routes fragments to sessions and owns their tasks.
#[derive(Debug)]
pub struct Dispatcher<T> {
    sessions: Arc<DashMap<SocketAddrV4, SessionEntry>>,
    queue: RequestQueue,
    transport: Arc<T>,
    config: SessionConfig,
    active: ActiveSessions,
    tracker: TaskTracker,
    next_id: AtomicU64,
    inbox_capacity: usize,
}

impl<T> Dispatcher<T>
where
    T: Transmit + 'static,
{
    /// Create a dispatcher that queues requests on `queue` and sends replies
    /// through `transport`.
    #[must_use]
    pub fn new(queue: RequestQueue, transport: Arc<T>, config: SessionConfig) -> Self {
        Self {
            sessions: Arc::new(DashMap::new()),
            queue,
            transport,
            config,
            active: ActiveSessions::new(),
            tracker: TaskTracker::new(),
            next_id: AtomicU64::new(0),
            inbox_capacity: DEFAULT_INBOX_CAPACITY,
        }
    }

    /// Override the per-session inbox capacity (minimum one).
    #[must_use]
    pub fn with_inbox_capacity(mut self, capacity: usize) -> Self {
        self.inbox_capacity = capacity.max(1);
        self
    }

    /// Advisory count of sessions that have not finished.
    #[must_use]
    pub fn active_sessions(&self) -> &ActiveSessions { &self.active }

    /// Peers that currently have a live session.
    #[must_use]
    pub fn live_peers(&self) -> Vec<SocketAddrV4> {
        self.sessions.iter().map(|entry| *entry.key()).collect()
    }

    /// Route `fragment` to the session for its peer, starting one if needed.
    ///
    /// Must be called from within a Tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError`] when the fragment had to be dropped. Errors
    /// are local to the affected peer.
    pub fn route(&self, fragment: Fragment) -> Result<Routed, DispatchError> {
        let peer = fragment.peer();
        match self.sessions.entry(peer) {
            Entry::Occupied(occupied) => {
                let inbox = occupied.get().inbox.clone();
                drop(occupied);
                match inbox.try_send(fragment) {
                    Ok(()) => Ok(Routed::ExistingSession),
                    Err(TrySendError::Full(_)) => Err(DispatchError::InboxFull { peer }),
                    Err(TrySendError::Closed(_)) => Err(DispatchError::SessionClosed { peer }),
                }
            }
            Entry::Vacant(vacant) => {
                let session = ClientSession::new(peer, self.config, &self.active)?;
                let (inbox, rx) = mpsc::channel(self.inbox_capacity);
                if inbox.try_send(fragment).is_err() {
                    return Err(DispatchError::SessionClosed { peer });
                }
                let id = self.next_id.fetch_add(1, Ordering::Relaxed);
                vacant.insert(SessionEntry { id, inbox });
                self.spawn_session(id, session, rx);
                Ok(Routed::NewSession)
            }
        }
    }

    fn spawn_session(&self, id: u64, session: ClientSession, rx: mpsc::Receiver<Fragment>) {
        let peer = session.peer();
        let sessions = Arc::clone(&self.sessions);
        let queue = self.queue.clone();
        let transport = Arc::clone(&self.transport);

        self.tracker.spawn(async move {
            let run = AssertUnwindSafe(session.run(rx, &queue, transport.as_ref())).catch_unwind();
            match run.await {
                Ok(Ok(report)) => debug!(
                    "session task finished: peer={peer}, status={}",
                    report.status
                ),
                // Already logged by the session.
                Ok(Err(_)) => {}
                Err(panic) => {
                    metrics::inc_errors();
                    let panic_msg = panic_message(panic.as_ref());
                    // Emit via both `log` and `tracing` for tests that capture either.
                    error!("session task panicked: panic={panic_msg}, peer={peer}");
                    tracing::error!(panic = %panic_msg, %peer, "session task panicked");
                }
            }
            sessions.remove_if(&peer, |_, entry| entry.id == id);
        });
    }

    /// Stop accepting new session tasks and wait for the running ones.
    ///
    /// Sessions still collecting fragments lose their inbox and end without
    /// a reply; sessions past collection finish their cycle.
    pub async fn shutdown(&self) {
        self.tracker.close();
        self.sessions.clear();
        if !self.tracker.is_empty() {
            warn!(
                "waiting for sessions to finish: active_sessions={}",
                self.active.get()
            );
        }
        self.tracker.wait().await;
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = payload.downcast_ref::<&'static str>() {
        (*s).to_owned()
    } else {
        format!("{payload:?}")
    }
}
