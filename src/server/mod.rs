//! Tokio-based UDP server feeding client sessions.
//!
//! `RelayServer` owns the datagram socket shared by every session. Inbound
//! datagrams are decoded into fragments and routed to per-client sessions by
//! a [`Dispatcher`](crate::dispatch::Dispatcher); replies leave through the
//! same socket towards the router.

mod backoff;
mod error;
mod runtime;

use std::{
    io,
    net::{Ipv4Addr, SocketAddr},
    sync::Arc,
};

pub use backoff::{Backoff, BackoffConfig};
pub use error::ServerError;
use tokio::net::UdpSocket;

use crate::session::SessionConfig;

/// Default port the server listens on.
pub const DEFAULT_PORT: u16 = 8007;
/// Default router address replies are relayed through.
pub const DEFAULT_ROUTER: SocketAddr =
    SocketAddr::new(std::net::IpAddr::V4(Ipv4Addr::LOCALHOST), 3000);

/// Addresses and tunables for a [`RelayServer`].
#[derive(Clone, Copy, Debug)]
pub struct ServerConfig {
    /// Local address the UDP socket binds to.
    pub bind_addr: SocketAddr,
    /// Router that relays datagrams to and from clients.
    pub router_addr: SocketAddr,
    /// Settings applied to every client session.
    pub session: SessionConfig,
    /// Back-off applied when receiving from the socket fails.
    pub backoff: BackoffConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::new(std::net::IpAddr::V4(Ipv4Addr::UNSPECIFIED), DEFAULT_PORT),
            router_addr: DEFAULT_ROUTER,
            session: SessionConfig::default(),
            backoff: BackoffConfig::default(),
        }
    }
}

/// UDP server that answers fragmented requests relayed by a router.
///
/// # Examples
///
/// ```no_run
/// use relayhttp::{request::request_queue, server::{RelayServer, ServerConfig}};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), relayhttp::server::ServerError> {
/// let (queue, _requests) = request_queue();
/// let server = RelayServer::bind(ServerConfig::default()).await?;
/// server.run(queue).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct RelayServer {
    socket: Arc<UdpSocket>,
    config: ServerConfig,
}

impl RelayServer {
    /// Bind the server socket.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Bind`] if the socket cannot be bound.
    pub async fn bind(config: ServerConfig) -> Result<Self, ServerError> {
        let socket = UdpSocket::bind(config.bind_addr)
            .await
            .map_err(|source| ServerError::Bind {
                addr: config.bind_addr,
                source,
            })?;
        Ok(Self::from_socket(socket, config))
    }

    /// Wrap an already bound socket; `config.bind_addr` is ignored.
    #[must_use]
    pub fn from_socket(socket: UdpSocket, config: ServerConfig) -> Self {
        Self {
            socket: Arc::new(socket),
            config,
        }
    }

    /// Address the server socket is bound to.
    ///
    /// # Errors
    ///
    /// Returns any error reported by the operating system.
    pub fn local_addr(&self) -> io::Result<SocketAddr> { self.socket.local_addr() }
}
