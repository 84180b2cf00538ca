//! Connecting side: dial the peer, then reassemble and republish events.
//!
//! The receive loop is one task owning its [`ReceiveCursor`]. It issues one
//! read at a time and publishes each decoded event synchronously before the
//! next read, so events reach the local sink in wire order and a slow sink
//! slows the reader down.
//!
//! # Example
//!
//! ```ignore
//! use eventwire::codec::MsgPackFormatter;
//! use eventwire::config::TransportConfig;
//! use eventwire::transport::ConnectingTransport;
//! use eventwire::tree::TreeBuilder;
//!
//! let transport =
//!     ConnectingTransport::connect(&TransportConfig::default(), MsgPackFormatter, TreeBuilder::new())
//!         .await?;
//!
//! let outcome = transport.join().await?;
//! outcome.result?;
//! let tree = outcome.sink.into_tree();
//! ```

use std::future::Future;
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::net::TcpStream;
use tokio::task::JoinHandle;

use crate::codec::Formatter;
use crate::config::TransportConfig;
use crate::error::{RelayError, Result};
use crate::protocol::{ReceiveCursor, Step};
use crate::sink::EventSink;

/// Why a receive loop ended without error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// The peer closed the stream at a frame boundary.
    PeerClosed,
    /// `dispose` was observed before the next frame.
    Stopped,
}

/// What a finished receive task hands back to its owner.
#[derive(Debug)]
pub struct ReceiveOutcome<S> {
    /// The sink, with everything published before the loop ended.
    pub sink: S,
    /// How the loop ended. Protocol violations, decode errors and sink
    /// errors all halt the loop and land here.
    pub result: Result<Termination>,
}

/// Call `connect` until it succeeds, sleeping `delay` after each refusal.
///
/// Only `ConnectionRefused` is retried, without limit. Any other error is
/// returned at once as [`RelayError::Connect`].
///
/// Returns the connection and the number of attempts it took.
pub async fn retry_on_refused<T, F, Fut>(delay: Duration, mut connect: F) -> Result<(T, u32)>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = io::Result<T>>,
{
    let mut attempts: u32 = 0;

    loop {
        attempts = attempts.saturating_add(1);

        match connect().await {
            Ok(conn) => return Ok((conn, attempts)),
            Err(e) if e.kind() == io::ErrorKind::ConnectionRefused => {
                tracing::debug!(
                    "Connection refused (attempt {}), retrying in {:?}",
                    attempts,
                    delay
                );
                tokio::time::sleep(delay).await;
            }
            Err(e) => return Err(RelayError::Connect(e)),
        }
    }
}

/// Read frames from `reader` and publish each decoded event to `sink`.
///
/// `stop` is checked only at frame boundaries, before the next header read.
pub async fn receive_loop<R, F, S>(
    reader: &mut R,
    formatter: &F,
    sink: &mut S,
    stop: &AtomicBool,
    max_payload_size: usize,
) -> Result<Termination>
where
    R: AsyncRead + Unpin + ?Sized,
    F: Formatter + ?Sized,
    S: EventSink + ?Sized,
{
    let mut cursor = ReceiveCursor::new(max_payload_size);

    loop {
        if cursor.is_at_boundary() && stop.load(Ordering::Acquire) {
            return Ok(Termination::Stopped);
        }

        let n = reader.read(cursor.unfilled_mut()).await?;

        match cursor.advance(n)? {
            Step::Pending => {}
            Step::Closed => return Ok(Termination::PeerClosed),
            Step::Complete(payload) => {
                let event = formatter.deserialize(&payload)?;
                sink.publish(event)?;
            }
        }
    }
}

/// A running receive loop on a dialed connection.
pub struct ConnectingTransport<S> {
    stop: Arc<AtomicBool>,
    task: JoinHandle<ReceiveOutcome<S>>,
    attempts: u32,
}

impl<S> ConnectingTransport<S>
where
    S: EventSink + Send + 'static,
{
    /// Dial `config.address`, retrying while refused, and start receiving.
    ///
    /// # Errors
    ///
    /// `Connect` for any connect failure other than a refusal.
    pub async fn connect<F: Formatter>(
        config: &TransportConfig,
        formatter: F,
        sink: S,
    ) -> Result<Self> {
        let address = config.address;
        let (stream, attempts) =
            retry_on_refused(config.retry_delay, || TcpStream::connect(address)).await?;
        stream.set_nodelay(true)?;

        tracing::info!("Connected to {} after {} attempt(s)", address, attempts);

        let mut transport = Self::from_stream(stream, formatter, sink, config.max_payload_size);
        transport.attempts = attempts;
        Ok(transport)
    }

    /// Start receiving on an already-established stream.
    pub fn from_stream<R, F>(reader: R, formatter: F, sink: S, max_payload_size: usize) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
        F: Formatter,
    {
        let stop = Arc::new(AtomicBool::new(false));
        let task_stop = stop.clone();

        let task = tokio::spawn(async move {
            let mut reader = reader;
            let mut sink = sink;

            let result =
                receive_loop(&mut reader, &formatter, &mut sink, &task_stop, max_payload_size)
                    .await;

            match &result {
                Ok(termination) => tracing::debug!("Receive loop finished: {:?}", termination),
                Err(e) => tracing::error!("Receive loop faulted: {}", e),
            }

            ReceiveOutcome { sink, result }
        });

        Self {
            stop,
            task,
            attempts: 1,
        }
    }
}

impl<S> ConnectingTransport<S> {
    /// Ask the loop to stop before its next frame.
    ///
    /// The connection stays open; a loop blocked waiting for the next header
    /// only notices once bytes arrive or the peer closes. Use
    /// [`abort`](Self::abort) to stop immediately.
    pub fn dispose(&self) {
        self.stop.store(true, Ordering::Release);
    }

    /// Cancel the receive task outright, dropping the connection.
    pub fn abort(&self) {
        self.task.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Connect attempts made, including the successful one.
    pub fn connect_attempts(&self) -> u32 {
        self.attempts
    }

    /// Wait for the receive loop to end.
    ///
    /// # Errors
    ///
    /// `TaskFailed` if the task panicked or was aborted; the sink is lost.
    pub async fn join(self) -> Result<ReceiveOutcome<S>> {
        self.task
            .await
            .map_err(|e| RelayError::TaskFailed(e.to_string()))
    }
}
