//! Advisory count of live sessions.
//!
//! The count exists for logs and diagnostics. Nothing may branch on it.

use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use crate::metrics;

/// Shared counter of sessions that have started but not finished.
#[derive(Clone, Debug, Default)]
pub struct ActiveSessions(Arc<AtomicUsize>);

impl ActiveSessions {
    /// Create a counter starting at zero.
    #[must_use]
    pub fn new() -> Self { Self::default() }

    /// Current number of live sessions.
    #[must_use]
    pub fn get(&self) -> usize { self.0.load(Ordering::Relaxed) }

    /// Register a new session, returning a guard that unregisters it on drop.
    #[must_use]
    pub fn enter(&self) -> SessionGuard {
        self.0.fetch_add(1, Ordering::Relaxed);
        metrics::inc_sessions();
        SessionGuard(self.clone())
    }
}

/// Keeps one session registered in [`ActiveSessions`] while alive.
#[derive(Debug)]
pub struct SessionGuard(ActiveSessions);

impl Drop for SessionGuard {
    fn drop(&mut self) {
        (self.0).0.fetch_sub(1, Ordering::Relaxed);
        metrics::dec_sessions();
    }
}
