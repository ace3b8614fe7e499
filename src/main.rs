//! `relayhttp` server binary.
//!
//! Serves a directory to clients whose fragmented requests arrive through a
//! UDP router.

mod cli;

use std::{
    net::{IpAddr, Ipv4Addr, SocketAddr},
    num::NonZeroUsize,
    time::Duration,
};

use clap::Parser;
use log::info;
use relayhttp::{
    request::request_queue,
    server::{RelayServer, ServerConfig},
    session::SessionConfig,
    worker::FileWorker,
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = cli::Cli::parse();
    init_logging(cli.verbose);

    #[cfg(feature = "metrics")]
    if let Some(addr) = cli.metrics_addr {
        metrics_exporter_prometheus::PrometheusBuilder::new()
            .with_http_listener(addr)
            .install()?;
        info!("metrics exporter listening: addr={addr}");
    }

    let config = server_config(&cli)?;
    info!(
        "starting relayhttp: port={}, router={}, directory={}",
        cli.port,
        cli.router,
        cli.directory.display()
    );
    let (queue, requests) = request_queue();
    let worker = tokio::spawn(FileWorker::new(cli.directory).serve(requests));

    RelayServer::bind(config).await?.run(queue).await?;
    // The server dropped every queue handle, so the worker drains and exits.
    worker.await?;
    Ok(())
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn server_config(cli: &cli::Cli) -> Result<ServerConfig, Box<dyn std::error::Error>> {
    let max_payload = NonZeroUsize::new(usize::from(cli.max_payload))
        .ok_or("max payload must be non-zero")?;
    let session = SessionConfig::default()
        .with_max_payload_size(max_payload)?
        .with_reassembly_timeout(Duration::from_secs(cli.reassembly_timeout))
        .with_reply_timeout(Duration::from_secs(cli.reply_timeout))
        .with_timeout_notification(!cli.quiet_timeouts);
    Ok(ServerConfig {
        bind_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), cli.port),
        router_addr: cli.router,
        session,
        ..ServerConfig::default()
    })
}
