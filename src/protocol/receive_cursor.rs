//! Receive cursor for reassembling frames from partial reads.
//!
//! Implements the receive state machine:
//! - `AwaitingHeader`: collecting the 4-byte length prefix
//! - `AwaitingBody`: length known, filling a buffer of exactly that size
//!
//! The caller reads straight into [`ReceiveCursor::unfilled_mut`] and then
//! reports how many bytes arrived with [`ReceiveCursor::advance`]. A read of
//! zero bytes means the peer closed the stream.
//!
//! # Example
//!
//! ```
//! use eventwire::protocol::{build_frame, ReceiveCursor, Step, DEFAULT_MAX_PAYLOAD_SIZE};
//!
//! let frame = build_frame(b"hi").unwrap();
//! let mut cursor = ReceiveCursor::new(DEFAULT_MAX_PAYLOAD_SIZE);
//!
//! let mut delivered = Vec::new();
//! for byte in frame.iter() {
//!     cursor.unfilled_mut()[0] = *byte;
//!     if let Step::Complete(payload) = cursor.advance(1).unwrap() {
//!         delivered.push(payload);
//!     }
//! }
//!
//! assert_eq!(delivered.len(), 1);
//! assert_eq!(&delivered[0][..], b"hi");
//! ```

use bytes::{Bytes, BytesMut};

use super::wire_format::{decode_length, validate_length, LENGTH_PREFIX_SIZE};
use crate::error::{ProtocolViolation, Result};

/// State machine for frame reassembly.
#[derive(Debug)]
enum State {
    /// Collecting the length prefix.
    AwaitingHeader {
        header: [u8; LENGTH_PREFIX_SIZE],
        filled: usize,
    },
    /// Length decoded, filling the body.
    AwaitingBody { body: BytesMut, received: usize },
}

impl State {
    fn fresh() -> Self {
        State::AwaitingHeader {
            header: [0u8; LENGTH_PREFIX_SIZE],
            filled: 0,
        }
    }
}

/// Outcome of feeding one read into the cursor.
#[derive(Debug, PartialEq, Eq)]
pub enum Step {
    /// More bytes are needed.
    Pending,
    /// A whole payload has arrived; the cursor is back at a frame boundary.
    Complete(Bytes),
    /// The peer closed the stream cleanly at a frame boundary.
    Closed,
}

/// Per-connection reassembly state.
///
/// Owned by exactly one receive loop; never shared.
#[derive(Debug)]
pub struct ReceiveCursor {
    state: State,
    max_payload_size: usize,
}

impl ReceiveCursor {
    /// Create a cursor positioned at a frame boundary.
    pub fn new(max_payload_size: usize) -> Self {
        Self {
            state: State::fresh(),
            max_payload_size,
        }
    }

    /// The part of the current buffer still waiting for bytes.
    ///
    /// Never empty: a filled buffer is consumed by `advance` immediately.
    pub fn unfilled_mut(&mut self) -> &mut [u8] {
        match &mut self.state {
            State::AwaitingHeader { header, filled } => &mut header[*filled..],
            State::AwaitingBody { body, received } => &mut body[*received..],
        }
    }

    /// Record that `n` bytes were written into [`unfilled_mut`](Self::unfilled_mut).
    ///
    /// # Errors
    ///
    /// - `HeaderSizeMismatch` if the stream ends inside a length prefix
    /// - `ZeroOrNegativeLength` / `PayloadTooLarge` for an invalid prefix
    /// - `PrematureClose` if the stream ends inside a body
    pub fn advance(&mut self, n: usize) -> Result<Step> {
        match &mut self.state {
            State::AwaitingHeader { header, filled } => {
                if n == 0 {
                    if *filled == 0 {
                        return Ok(Step::Closed);
                    }
                    return Err(ProtocolViolation::HeaderSizeMismatch { received: *filled }.into());
                }

                *filled += n;
                debug_assert!(*filled <= LENGTH_PREFIX_SIZE);
                if *filled < LENGTH_PREFIX_SIZE {
                    return Ok(Step::Pending);
                }

                let length = validate_length(decode_length(*header), self.max_payload_size)?;
                self.state = State::AwaitingBody {
                    body: BytesMut::zeroed(length),
                    received: 0,
                };
                Ok(Step::Pending)
            }

            State::AwaitingBody { body, received } => {
                if n == 0 {
                    return Err(ProtocolViolation::PrematureClose {
                        expected: body.len(),
                        received: *received,
                    }
                    .into());
                }

                *received += n;
                debug_assert!(*received <= body.len());
                if *received < body.len() {
                    return Ok(Step::Pending);
                }

                let body = std::mem::take(body);
                self.state = State::fresh();
                Ok(Step::Complete(body.freeze()))
            }
        }
    }

    /// Whether no bytes of the next frame have arrived yet.
    pub fn is_at_boundary(&self) -> bool {
        matches!(self.state, State::AwaitingHeader { filled: 0, .. })
    }

    /// Bytes received so far for the current frame section.
    pub fn received(&self) -> usize {
        match &self.state {
            State::AwaitingHeader { filled, .. } => *filled,
            State::AwaitingBody { received, .. } => *received,
        }
    }

    /// Declared body size, or `None` while the length prefix is incomplete.
    pub fn expected_size(&self) -> Option<usize> {
        match &self.state {
            State::AwaitingHeader { .. } => None,
            State::AwaitingBody { body, .. } => Some(body.len()),
        }
    }

    /// Get the current state for debugging.
    #[cfg(test)]
    fn state_name(&self) -> &'static str {
        match &self.state {
            State::AwaitingHeader { .. } => "AwaitingHeader",
            State::AwaitingBody { .. } => "AwaitingBody",
        }
    }
}
