//! # eventwire
//!
//! Relay discrete application events between two endpoints over one duplex
//! byte stream.
//!
//! ## Architecture
//!
//! - **Accepting side**: binds a loopback port, accepts exactly one peer and
//!   sends each published [`Event`] as a length-prefixed frame
//! - **Connecting side**: dials the peer (retrying while refused), reassembles
//!   frames from partial reads and republishes events into a local
//!   [`EventSink`]
//! - **Consumers**: a [`Dispatcher`] routes events to per-variant handlers;
//!   [`TreeBuilder`] rebuilds a test hierarchy from discovery events
//!
//! ## Wire format
//!
//! `[int32 BE length][length bytes of payload]`, with `length >= 1`. The
//! payload is produced by a pluggable [`Formatter`](codec::Formatter).
//!
//! ## Example
//!
//! ```ignore
//! use eventwire::codec::MsgPackFormatter;
//! use eventwire::config::TransportConfig;
//! use eventwire::transport::{Acceptor, ConnectingTransport};
//! use eventwire::tree::TreeBuilder;
//! use eventwire::EventSink;
//!
//! #[tokio::main]
//! async fn main() -> eventwire::Result<()> {
//!     let config = TransportConfig::default().with_port(0);
//!     let acceptor = Acceptor::bind(&config).await?;
//!     let config = config.with_address(acceptor.local_addr()?);
//!
//!     let (sender, receiver) = tokio::join!(
//!         acceptor.accept(MsgPackFormatter),
//!         ConnectingTransport::connect(&config, MsgPackFormatter, TreeBuilder::new()),
//!     );
//!     let mut sender = sender?;
//!
//!     sender.publish(root_discovered())?;
//!     sender.dispose().await?;
//!
//!     let outcome = receiver?.join().await?;
//!     outcome.result?;
//!     println!("{} tests", outcome.sink.tree().len());
//!     Ok(())
//! }
//! ```

pub mod codec;
pub mod config;
pub mod error;
pub mod event;
pub mod handler;
pub mod protocol;
pub mod sink;
pub mod transport;
pub mod tree;
pub mod writer;

pub use error::{RelayError, Result};
pub use event::Event;
pub use handler::Dispatcher;
pub use sink::EventSink;
pub use tree::TreeBuilder;
