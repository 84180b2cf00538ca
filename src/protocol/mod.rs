//! Protocol module - wire format and framing.
//!
//! This module implements the length-prefixed framing of the byte stream:
//! - 4-byte signed Big Endian length prefix encoding/decoding
//! - Outbound frame building
//! - Receive cursor for reassembling frames from partial reads

mod frame;
mod receive_cursor;
mod wire_format;

pub use frame::build_frame;
pub use receive_cursor::{ReceiveCursor, Step};
pub use wire_format::{
    decode_length, encode_length, validate_length, ABSOLUTE_MAX_PAYLOAD_SIZE,
    DEFAULT_MAX_PAYLOAD_SIZE, LENGTH_PREFIX_SIZE,
};
