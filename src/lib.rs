#![doc(html_root_url = "https://docs.rs/relayhttp/latest")]
//! Public API for the `relayhttp` library.
//!
//! This crate serves HTTP-style requests that arrive as numbered UDP
//! fragments through a router. It provides the fragment wire codec,
//! fragmentation and reassembly, per-client sessions, a dispatcher that keeps
//! clients apart, and the server loop tying them to a socket.

pub mod dispatch;
pub mod fragment;
pub mod metrics;
pub mod reply;
pub mod request;
pub mod server;
pub mod session;
pub mod test_helpers;
pub mod transport;
pub mod worker;

pub use dispatch::{DispatchError, Dispatcher, Routed};
pub use fragment::{
    CodecError,
    Fragment,
    FragmentError,
    FragmentKind,
    FragmentationError,
    Fragmenter,
    Reassembler,
    ReassemblyError,
    SequenceNumber,
};
pub use metrics::{Direction, ERRORS_TOTAL, FRAGMENTS_PROCESSED, SESSIONS_ACTIVE};
pub use reply::Reply;
pub use request::{Request, RequestQueue, RequestReceiver, request_queue};
pub use server::{RelayServer, ServerConfig, ServerError};
pub use session::{ClientSession, SessionConfig, SessionError, SessionState};
pub use transport::{RouterTransmitter, Transmit};
pub use worker::FileWorker;
