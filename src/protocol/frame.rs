//! Outbound frame construction.
//!
//! # Example
//!
//! ```
//! use eventwire::protocol::build_frame;
//!
//! let frame = build_frame(b"hello").unwrap();
//! assert_eq!(&frame[..4], &[0, 0, 0, 5]);
//! assert_eq!(&frame[4..], b"hello");
//! ```

use bytes::{BufMut, Bytes, BytesMut};

use super::wire_format::{encode_length, ABSOLUTE_MAX_PAYLOAD_SIZE, LENGTH_PREFIX_SIZE};
use crate::error::{ProtocolViolation, Result};

/// Build a complete frame (length prefix + payload) as one contiguous buffer.
///
/// # Errors
///
/// An empty payload is rejected as `ZeroOrNegativeLength`; one longer than
/// `i32::MAX` as `PayloadTooLarge`. No frame is ever produced for either.
pub fn build_frame(payload: &[u8]) -> Result<Bytes> {
    if payload.is_empty() {
        return Err(ProtocolViolation::ZeroOrNegativeLength(0).into());
    }
    if payload.len() > ABSOLUTE_MAX_PAYLOAD_SIZE {
        return Err(ProtocolViolation::PayloadTooLarge {
            length: payload.len(),
            max: ABSOLUTE_MAX_PAYLOAD_SIZE,
        }
        .into());
    }

    let mut buf = BytesMut::with_capacity(LENGTH_PREFIX_SIZE + payload.len());
    buf.put_slice(&encode_length(payload.len() as i32));
    buf.put_slice(payload);
    Ok(buf.freeze())
}
