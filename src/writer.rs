//! Dedicated writer task for outbound frames.
//!
//! Publishers never touch the socket. They hand pre-built frames to a
//! channel, and a single task writes them in order:
//!
//! ```text
//! publish ─┐
//! publish ─┼─► mpsc::Sender<OutboundFrame> ─► Writer Task ─► Socket
//! publish ─┘
//! ```
//!
//! Only the writer task writes, so at most one write is in flight per
//! connection and frames leave in the order they were queued. On the first
//! write failure the task marks the connection inactive, reports the error
//! once on its fault channel, and exits.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::error::{RelayError, Result};

/// Default channel capacity.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1024;

/// Maximum frames to drain before flushing.
const MAX_BATCH_SIZE: usize = 64;

/// A frame ready to be written: length prefix and payload in one buffer.
#[derive(Debug, Clone)]
pub struct OutboundFrame {
    bytes: Bytes,
}

impl OutboundFrame {
    /// Wrap an already-built frame (see [`build_frame`](crate::protocol::build_frame)).
    #[inline]
    pub fn new(bytes: Bytes) -> Self {
        Self { bytes }
    }

    /// Total size of this frame on the wire.
    #[inline]
    pub fn size(&self) -> usize {
        self.bytes.len()
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

/// Configuration for the writer task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WriterConfig {
    /// Frames that may be queued before publishes are rejected.
    pub channel_capacity: usize,
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }
}

/// Handle for queueing frames on the writer task.
///
/// Cheaply cloneable.
#[derive(Clone)]
pub struct WriterHandle {
    tx: mpsc::Sender<OutboundFrame>,
    /// Frames queued but not yet written.
    pending: Arc<AtomicUsize>,
}

impl WriterHandle {
    /// Queue a frame without waiting.
    ///
    /// # Errors
    ///
    /// - `Backpressure` if the queue is full
    /// - `ConnectionClosed` if the writer task has exited
    pub fn try_send(&self, frame: OutboundFrame) -> Result<()> {
        self.pending.fetch_add(1, Ordering::AcqRel);

        self.tx.try_send(frame).map_err(|e| {
            self.pending.fetch_sub(1, Ordering::Release);
            match e {
                mpsc::error::TrySendError::Full(_) => RelayError::Backpressure,
                mpsc::error::TrySendError::Closed(_) => RelayError::ConnectionClosed,
            }
        })
    }

    /// Get current pending frame count.
    #[inline]
    pub fn pending_count(&self) -> usize {
        self.pending.load(Ordering::Acquire)
    }
}

/// Spawn the writer task and return a handle for sending frames.
///
/// # Arguments
///
/// * `writer` - The async writer (socket write half)
/// * `config` - Writer configuration
/// * `connected` - Cleared when a write fails or the task exits
/// * `fault_tx` - Receives the write error, if any
///
/// # Returns
///
/// A tuple of `(WriterHandle, JoinHandle)`. Dropping every handle lets the
/// task drain its queue, shut the stream down and finish.
pub fn spawn_writer_task<W>(
    writer: W,
    config: WriterConfig,
    connected: Arc<AtomicBool>,
    fault_tx: oneshot::Sender<RelayError>,
) -> (WriterHandle, JoinHandle<()>)
where
    W: AsyncWrite + Unpin + Send + 'static,
{
    let (tx, rx) = mpsc::channel(config.channel_capacity.max(1));
    let pending = Arc::new(AtomicUsize::new(0));

    let handle = WriterHandle {
        tx,
        pending: pending.clone(),
    };

    let task = tokio::spawn(async move {
        let result = writer_loop(rx, writer, pending).await;
        connected.store(false, Ordering::Release);

        if let Err(e) = result {
            tracing::error!("Writer task failed: {}", e);
            let _ = fault_tx.send(e);
        } else {
            tracing::debug!("Writer task finished");
        }
    });

    (handle, task)
}

/// Main writer loop - receives frames and writes them to the socket.
async fn writer_loop<W>(
    mut rx: mpsc::Receiver<OutboundFrame>,
    mut writer: W,
    pending: Arc<AtomicUsize>,
) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    // Channel closed: every handle dropped
    while let Some(first) = rx.recv().await {
        let mut batch = Vec::with_capacity(MAX_BATCH_SIZE);
        batch.push(first);

        while batch.len() < MAX_BATCH_SIZE {
            match rx.try_recv() {
                Ok(frame) => batch.push(frame),
                Err(_) => break,
            }
        }

        let batch_size = batch.len();
        write_batch(&mut writer, &batch).await?;
        pending.fetch_sub(batch_size, Ordering::Release);
    }

    writer.shutdown().await?;
    Ok(())
}

/// Write a batch of frames in order, then flush once.
async fn write_batch<W>(writer: &mut W, batch: &[OutboundFrame]) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    for frame in batch {
        writer.write_all(frame.as_bytes()).await?;
    }
    writer.flush().await?;
    Ok(())
}
