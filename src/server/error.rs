//! Errors raised by [`RelayServer`](crate::server::RelayServer) operations.

use std::{io, net::SocketAddr};

use thiserror::Error;

/// Errors that may occur while starting or running the server.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Binding the UDP socket failed.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },
    /// Reading the bound socket's address failed.
    #[error("local address unavailable: {0}")]
    LocalAddr(#[from] io::Error),
}
