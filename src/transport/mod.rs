//! Transport module - the two ends of a connection.
//!
//! - [`AcceptingTransport`]: binds, accepts one peer, sends framed events
//! - [`ConnectingTransport`]: dials (retrying while refused), receives and
//!   republishes events into a local sink
//!
//! Each connection has exactly one transport per end and is never shared.

mod accepting;
mod connecting;

pub use accepting::{AcceptingTransport, Acceptor};
pub use connecting::{
    receive_loop, retry_on_refused, ConnectingTransport, ReceiveOutcome, Termination,
};
