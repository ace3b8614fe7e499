//! Command line interface for the `relayhttp` server binary.
//!
//! Shared with the build script, which renders the man page from it, so this
//! file depends on nothing but `clap` and the standard library.

use std::{net::SocketAddr, path::PathBuf};

use clap::{ArgAction, Parser};

/// Command line arguments for the `relayhttp` binary.
#[derive(Debug, Parser)]
#[command(
    name = "relayhttp",
    version,
    about = "Serve a directory to clients speaking fragmented HTTP over UDP through a router"
)]
pub struct Cli {
    /// UDP port to listen on.
    #[arg(short, long, default_value_t = 8007)]
    pub port: u16,

    /// Router that relays datagrams between clients and the server.
    #[arg(long, default_value = "127.0.0.1:3000")]
    pub router: SocketAddr,

    /// Directory served to clients.
    #[arg(short, long, default_value = ".")]
    pub directory: PathBuf,

    /// Increase log verbosity (repeat for more detail).
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Largest reply payload placed in one datagram, in bytes.
    #[arg(long, default_value_t = 1013, value_parser = clap::value_parser!(u16).range(1..=1013))]
    pub max_payload: u16,

    /// Seconds allowed for a request to arrive completely.
    #[arg(long, value_name = "SECS", default_value_t = 30)]
    pub reassembly_timeout: u64,

    /// Seconds allowed for the worker to reply to a request.
    #[arg(long, value_name = "SECS", default_value_t = 30)]
    pub reply_timeout: u64,

    /// Do not answer timed out requests with an error reply.
    #[arg(long)]
    pub quiet_timeouts: bool,

    /// Serve Prometheus metrics on this address.
    #[cfg(feature = "metrics")]
    #[arg(long)]
    pub metrics_addr: Option<SocketAddr>,
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::Cli;

    #[test]
    fn defaults_match_router_setup() {
        let cli = Cli::parse_from(["relayhttp"]);
        assert_eq!(cli.port, 8007);
        assert_eq!(cli.router.to_string(), "127.0.0.1:3000");
        assert_eq!(cli.max_payload, 1013);
        assert_eq!(cli.verbose, 0);
        assert!(!cli.quiet_timeouts);
    }

    #[test]
    fn parses_short_options() {
        let cli = Cli::parse_from(["relayhttp", "-p", "9000", "-d", "/srv", "-vv"]);
        assert_eq!(cli.port, 9000);
        assert_eq!(cli.directory.to_str(), Some("/srv"));
        assert_eq!(cli.verbose, 2);
    }

    #[cfg(feature = "metrics")]
    #[test]
    fn parses_metrics_address() {
        let cli = Cli::parse_from(["relayhttp", "--metrics-addr", "127.0.0.1:9100"]);
        assert_eq!(
            cli.metrics_addr.map(|addr| addr.to_string()).as_deref(),
            Some("127.0.0.1:9100")
        );
    }

    #[test]
    fn rejects_payload_beyond_datagram() {
        assert!(Cli::try_parse_from(["relayhttp", "--max-payload", "1014"]).is_err());
        assert!(Cli::try_parse_from(["relayhttp", "--max-payload", "0"]).is_err());
    }
}
