//! Metric helpers for `relayhttp`.
//!
//! This module defines metric names and simple helper functions wrapping the
//! [`metrics`](https://docs.rs/metrics) crate. Without the `metrics` feature
//! the helpers compile to no-ops. Metrics are diagnostic only; nothing in the
//! crate reads them back.

#[cfg(feature = "metrics")]
use metrics::{counter, gauge};

/// Name of the gauge tracking sessions that have not finished yet.
pub const SESSIONS_ACTIVE: &str = "relayhttp_sessions_active";
/// Name of the counter tracking fragments received and sent.
pub const FRAGMENTS_PROCESSED: &str = "relayhttp_fragments_total";
/// Name of the counter tracking dropped datagrams and failed sessions.
pub const ERRORS_TOTAL: &str = "relayhttp_errors_total";

/// Direction of fragment processing.
#[derive(Clone, Copy, Debug)]
pub enum Direction {
    /// Fragments received from the router.
    Inbound,
    /// Fragments sent to the router.
    Outbound,
}

impl Direction {
    #[cfg_attr(not(feature = "metrics"), expect(dead_code, reason = "only used as a label"))]
    fn as_str(self) -> &'static str {
        match self {
            Direction::Inbound => "inbound",
            Direction::Outbound => "outbound",
        }
    }
}

/// Increment the active sessions gauge.
pub fn inc_sessions() {
    #[cfg(feature = "metrics")]
    gauge!(SESSIONS_ACTIVE).increment(1.0);
}

/// Decrement the active sessions gauge.
pub fn dec_sessions() {
    #[cfg(feature = "metrics")]
    gauge!(SESSIONS_ACTIVE).decrement(1.0);
}

/// Record a processed fragment for the given direction.
pub fn inc_fragments(direction: Direction) {
    #[cfg(feature = "metrics")]
    counter!(FRAGMENTS_PROCESSED, "direction" => direction.as_str()).increment(1);
    #[cfg(not(feature = "metrics"))]
    let _ = direction;
}

/// Record an error occurrence.
pub fn inc_errors() {
    #[cfg(feature = "metrics")]
    counter!(ERRORS_TOTAL).increment(1);
}
