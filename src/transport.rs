//! Outbound side of the datagram boundary.
//!
//! Sessions never own a socket. They hand encoded fragments to a
//! [`Transmit`] implementation, which in production forwards them to the
//! router over the server's shared UDP socket.

use std::{io, net::SocketAddr, sync::Arc};

use async_trait::async_trait;
use tokio::net::UdpSocket;

/// Sends one encoded fragment towards the client.
///
/// Implementations must not retry; a failed send ends the session.
#[async_trait]
pub trait Transmit: Send + Sync {
    /// Send `datagram` to the router.
    async fn send(&self, datagram: &[u8]) -> io::Result<()>;
}

#[async_trait]
impl<T: Transmit + ?Sized> Transmit for Arc<T> {
    async fn send(&self, datagram: &[u8]) -> io::Result<()> { (**self).send(datagram).await }
}

/// [`Transmit`] implementation that relays datagrams through a fixed router.
#[derive(Clone, Debug)]
pub struct RouterTransmitter {
    socket: Arc<UdpSocket>,
    router: SocketAddr,
}

impl RouterTransmitter {
    /// Send through `socket` to `router`.
    #[must_use]
    pub fn new(socket: Arc<UdpSocket>, router: SocketAddr) -> Self { Self { socket, router } }

    /// Address every datagram is sent to.
    #[must_use]
    pub fn router(&self) -> SocketAddr { self.router }
}

#[async_trait]
impl Transmit for RouterTransmitter {
    async fn send(&self, datagram: &[u8]) -> io::Result<()> {
        let sent = self.socket.send_to(datagram, self.router).await?;
        if sent < datagram.len() {
            return Err(io::Error::new(
                io::ErrorKind::WriteZero,
                format!("datagram truncated: sent {sent} of {} bytes", datagram.len()),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use tokio::net::UdpSocket;

    use super::*;

    #[tokio::test]
    async fn router_transmitter_sends_to_router() {
        let router = UdpSocket::bind("127.0.0.1:0").await.expect("bind router");
        let socket = Arc::new(UdpSocket::bind("127.0.0.1:0").await.expect("bind server"));
        let router_addr = router.local_addr().expect("router addr");
        let transmitter = RouterTransmitter::new(socket, router_addr);
        assert_eq!(transmitter.router(), router_addr);

        transmitter.send(b"datagram").await.expect("send");

        let mut buf = [0_u8; 32];
        let (len, _) = router.recv_from(&mut buf).await.expect("recv");
        assert_eq!(&buf[..len], b"datagram");
    }
}
