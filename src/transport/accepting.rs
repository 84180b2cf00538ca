//! Accepting side: bind, accept exactly one peer, send framed events.
//!
//! # Example
//!
//! ```ignore
//! use eventwire::codec::MsgPackFormatter;
//! use eventwire::config::TransportConfig;
//! use eventwire::sink::EventSink;
//! use eventwire::transport::AcceptingTransport;
//!
//! // Waits until a peer connects.
//! let mut transport = AcceptingTransport::bind(&TransportConfig::default(), MsgPackFormatter).await?;
//!
//! transport.publish(event)?;
//! transport.dispose().await?;
//! ```

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::io::AsyncWrite;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use crate::codec::Formatter;
use crate::config::TransportConfig;
use crate::error::{RelayError, Result};
use crate::event::Event;
use crate::protocol::build_frame;
use crate::sink::EventSink;
use crate::writer::{spawn_writer_task, OutboundFrame, WriterConfig, WriterHandle};

/// A bound listener waiting for its single peer.
///
/// Splitting bind from accept lets the caller learn the bound port (for
/// example when configured with port 0) before anyone dials it.
pub struct Acceptor {
    listener: TcpListener,
    writer_config: WriterConfig,
}

impl Acceptor {
    /// Bind `config.address`.
    pub async fn bind(config: &TransportConfig) -> Result<Self> {
        let listener = TcpListener::bind(config.address).await?;
        tracing::info!("Listening on {}", listener.local_addr()?);

        Ok(Self {
            listener,
            writer_config: config.writer.clone(),
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Wait for one peer, then stop listening.
    ///
    /// There is no timeout.
    pub async fn accept<F: Formatter>(self, formatter: F) -> Result<AcceptingTransport<F>> {
        let (stream, peer) = self.listener.accept().await?;
        stream.set_nodelay(true)?;
        tracing::info!("Accepted connection from {}", peer);

        let mut transport = AcceptingTransport::from_stream(stream, formatter, self.writer_config);
        transport.peer_addr = Some(peer);
        Ok(transport)
    }
}

/// Sink that frames events and sends them to the one accepted peer.
pub struct AcceptingTransport<F> {
    formatter: F,
    writer: Option<WriterHandle>,
    connected: Arc<AtomicBool>,
    faults: Option<oneshot::Receiver<RelayError>>,
    task: Option<JoinHandle<()>>,
    peer_addr: Option<SocketAddr>,
}

impl<F: Formatter> AcceptingTransport<F> {
    /// Bind, then wait for the peer.
    pub async fn bind(config: &TransportConfig, formatter: F) -> Result<Self> {
        Acceptor::bind(config).await?.accept(formatter).await
    }

    /// Send on an already-established stream.
    pub fn from_stream<W>(stream: W, formatter: F, config: WriterConfig) -> Self
    where
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let connected = Arc::new(AtomicBool::new(true));
        let (fault_tx, fault_rx) = oneshot::channel();
        let (writer, task) = spawn_writer_task(stream, config, connected.clone(), fault_tx);

        Self {
            formatter,
            writer: Some(writer),
            connected,
            faults: Some(fault_rx),
            task: Some(task),
            peer_addr: None,
        }
    }
}

impl<F> AcceptingTransport<F> {
    /// Whether publishes are still being sent.
    pub fn is_connected(&self) -> bool {
        self.writer.is_some() && self.connected.load(Ordering::Acquire)
    }

    /// `None` for streams that are not TCP connections.
    pub fn peer_addr(&self) -> Option<SocketAddr> {
        self.peer_addr
    }

    /// Frames queued but not yet written.
    pub fn pending_frames(&self) -> usize {
        self.writer.as_ref().map_or(0, WriterHandle::pending_count)
    }

    /// Wait for the writer to stop, returning its failure if it had one.
    ///
    /// Resolves to `None` once the writer exits cleanly, or if the fault was
    /// already taken. Cancel-safe.
    pub async fn faulted(&mut self) -> Option<RelayError> {
        let rx = self.faults.as_mut()?;
        let fault = rx.await.ok();
        self.faults = None;
        fault
    }

    /// Flush queued frames and close the connection.
    ///
    /// # Errors
    ///
    /// Returns the write failure if the writer faulted and it was not yet
    /// taken through [`faulted`](Self::faulted).
    pub async fn dispose(mut self) -> Result<()> {
        self.writer = None;

        if let Some(task) = self.task.take() {
            task.await
                .map_err(|e| RelayError::TaskFailed(e.to_string()))?;
        }

        match self.faulted().await {
            Some(fault) => Err(fault),
            None => Ok(()),
        }
    }
}

impl<F: Formatter> EventSink for AcceptingTransport<F> {
    /// Validate, serialize, frame and queue `event`.
    ///
    /// Once the connection is inactive, events are discarded without error.
    fn publish(&mut self, event: Event) -> Result<()> {
        let writer = match &self.writer {
            Some(w) if self.connected.load(Ordering::Acquire) => w,
            _ => {
                tracing::debug!("Connection inactive, discarding {:?}", event.kind());
                return Ok(());
            }
        };

        event.validate()?;
        let payload = self.formatter.serialize(&event)?;
        let frame = build_frame(&payload)?;

        match writer.try_send(OutboundFrame::new(frame)) {
            Err(RelayError::ConnectionClosed) => {
                tracing::debug!("Writer gone, discarding {:?}", event.kind());
                Ok(())
            }
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::MsgPackFormatter;
    use crate::error::ValidationError;
    use crate::event::{TestData, TestDiscovered};
    use crate::protocol::{ReceiveCursor, Step, DEFAULT_MAX_PAYLOAD_SIZE};
    use tokio::io::{duplex, AsyncReadExt};

    fn event(id: &str) -> Event {
        TestDiscovered {
            test: TestData::new(id, id),
            parent_test_id: None,
        }
        .into()
    }

    fn decode_all(bytes: &[u8]) -> Vec<Event> {
        let mut cursor = ReceiveCursor::new(DEFAULT_MAX_PAYLOAD_SIZE);
        let mut events = Vec::new();
        for byte in bytes {
            cursor.unfilled_mut()[0] = *byte;
            if let Step::Complete(payload) = cursor.advance(1).unwrap() {
                events.push(MsgPackFormatter.deserialize(&payload).unwrap());
            }
        }
        events
    }

    #[tokio::test]
    async fn test_publish_frames_events() {
        let (client, mut server) = duplex(4096);
        let mut transport =
            AcceptingTransport::from_stream(client, MsgPackFormatter, WriterConfig::default());

        transport.publish(event("a")).unwrap();
        transport.publish(event("b")).unwrap();
        transport.dispose().await.unwrap();

        let mut bytes = Vec::new();
        server.read_to_end(&mut bytes).await.unwrap();

        assert_eq!(decode_all(&bytes), vec![event("a"), event("b")]);
    }

    #[tokio::test]
    async fn test_invalid_event_rejected_before_io() {
        let (client, mut server) = duplex(4096);
        let mut transport =
            AcceptingTransport::from_stream(client, MsgPackFormatter, WriterConfig::default());

        let result = transport.publish(event(""));
        assert!(matches!(
            result,
            Err(RelayError::Validation(ValidationError::MissingField("test.id")))
        ));

        transport.dispose().await.unwrap();
        let mut bytes = Vec::new();
        server.read_to_end(&mut bytes).await.unwrap();
        assert!(bytes.is_empty());
    }

    #[tokio::test]
    async fn test_lost_connection_discards_silently() {
        let (client, server) = duplex(64);
        drop(server);
        let mut transport =
            AcceptingTransport::from_stream(client, MsgPackFormatter, WriterConfig::default());

        transport.publish(event("first")).unwrap();

        assert!(matches!(transport.faulted().await, Some(RelayError::Io(_))));
        assert!(!transport.is_connected());

        // Even an invalid event is dropped without complaint now.
        assert!(transport.publish(event("")).is_ok());
        assert!(transport.publish(event("later")).is_ok());
        assert!(transport.dispose().await.is_ok());
    }

    #[tokio::test]
    async fn test_dispose_surfaces_untaken_fault() {
        let (client, server) = duplex(64);
        drop(server);
        let mut transport =
            AcceptingTransport::from_stream(client, MsgPackFormatter, WriterConfig::default());

        transport.publish(event("first")).unwrap();

        assert!(matches!(transport.dispose().await, Err(RelayError::Io(_))));
    }

    #[tokio::test]
    async fn test_not_tcp_has_no_peer() {
        let (client, _server) = duplex(64);
        let transport =
            AcceptingTransport::from_stream(client, MsgPackFormatter, WriterConfig::default());

        assert!(transport.is_connected());
        assert!(transport.peer_addr().is_none());
        assert_eq!(transport.pending_frames(), 0);
    }
}
