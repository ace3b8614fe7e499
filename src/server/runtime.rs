//! Runtime control for [`RelayServer`].

use std::{future::Future, net::SocketAddr, sync::Arc};

use log::{debug, info, warn};
use tokio::{net::UdpSocket, select, signal, time::sleep};
use tokio_util::{sync::CancellationToken, task::TaskTracker};

use super::{BackoffConfig, RelayServer, ServerError};
use crate::{
    dispatch::Dispatcher,
    fragment::{self, MAX_DATAGRAM_LEN},
    metrics,
    request::RequestQueue,
    transport::RouterTransmitter,
};

impl RelayServer {
    /// Run the server until Ctrl+C is received.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::LocalAddr`] if the socket address cannot be
    /// read. Receive failures are retried with exponential back-off and do
    /// not surface as errors.
    pub async fn run(self, queue: RequestQueue) -> Result<(), ServerError> {
        self.run_with_shutdown(queue, async {
            let _ = signal::ctrl_c().await;
        })
        .await
    }

    /// Run the server until `shutdown` resolves, then wait for in-flight
    /// sessions to finish.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::LocalAddr`] if the socket address cannot be
    /// read.
    #[expect(
        clippy::integer_division_remainder_used,
        reason = "tokio::select! expands to modulus internally"
    )]
    pub async fn run_with_shutdown<S>(
        self,
        queue: RequestQueue,
        shutdown: S,
    ) -> Result<(), ServerError>
    where
        S: Future<Output = ()> + Send,
    {
        let RelayServer { socket, config } = self;
        let local_addr = socket.local_addr()?;
        let transport = Arc::new(RouterTransmitter::new(
            Arc::clone(&socket),
            config.router_addr,
        ));
        let dispatcher = Arc::new(Dispatcher::new(
            queue,
            Arc::clone(&transport),
            config.session,
        ));
        let shutdown_token = CancellationToken::new();
        let tracker = TaskTracker::new();

        info!(
            "server listening: local_addr={local_addr}, router={}",
            transport.router()
        );
        tracker.spawn(receive_loop(
            socket,
            Arc::clone(&dispatcher),
            shutdown_token.clone(),
            config.backoff,
        ));

        select! {
            () = shutdown => shutdown_token.cancel(),
            () = tracker.wait() => {},
        }

        tracker.close();
        tracker.wait().await;
        dispatcher.shutdown().await;
        info!("server stopped: local_addr={local_addr}");
        Ok(())
    }
}

#[expect(
    clippy::integer_division_remainder_used,
    reason = "tokio::select! expands to modulus internally"
)]
async fn receive_loop(
    socket: Arc<UdpSocket>,
    dispatcher: Arc<Dispatcher<RouterTransmitter>>,
    shutdown: CancellationToken,
    backoff: BackoffConfig,
) {
    // One spare byte exposes datagrams larger than the protocol allows.
    let mut buf = vec![0_u8; MAX_DATAGRAM_LEN + 1];
    let mut backoff = backoff.start();
    loop {
        select! {
            biased;

            () = shutdown.cancelled() => break,
            res = socket.recv_from(&mut buf) => match res {
                Ok((len, from)) => {
                    handle_datagram(&dispatcher, &buf[..len], from);
                    backoff.reset();
                }
                Err(e) => {
                    let local_addr = socket.local_addr().ok();
                    warn!("receive error: error={e:?}, local_addr={local_addr:?}");
                    sleep(backoff.next_delay()).await;
                }
            },
        }
    }
}

fn handle_datagram(dispatcher: &Dispatcher<RouterTransmitter>, datagram: &[u8], from: SocketAddr) {
    let fragment = match fragment::decode(datagram) {
        Ok(fragment) => fragment,
        Err(e) => {
            metrics::inc_errors();
            warn!("dropping malformed datagram: from={from}, error={e}");
            return;
        }
    };
    debug!(
        "datagram received: from={from}, peer={}, sequence={}",
        fragment.peer(),
        fragment.sequence()
    );
    if let Err(e) = dispatcher.route(fragment) {
        metrics::inc_errors();
        warn!("dropping fragment: from={from}, error={e}");
    }
}
