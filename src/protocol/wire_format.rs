//! Wire format encoding and decoding.
//!
//! Every frame is a length prefix followed by exactly that many payload bytes:
//! ```text
//! ┌──────────────┬────────────────────────┐
//! │ Length       │ Payload                │
//! │ 4 bytes      │ `Length` bytes         │
//! │ int32 BE     │ opaque (formatter)     │
//! └──────────────┴────────────────────────┘
//! ```
//!
//! The length is a signed 32-bit Big Endian integer and must be at least 1.

use crate::error::ProtocolViolation;

/// Length prefix size in bytes (fixed, exactly 4).
pub const LENGTH_PREFIX_SIZE: usize = 4;

/// Default maximum payload size (1 GB).
pub const DEFAULT_MAX_PAYLOAD_SIZE: usize = 1_073_741_824;

/// Absolute maximum payload size (max i32).
pub const ABSOLUTE_MAX_PAYLOAD_SIZE: usize = i32::MAX as usize;

/// Encode a payload length (Big Endian).
///
/// # Example
///
/// ```
/// use eventwire::protocol::encode_length;
///
/// assert_eq!(encode_length(258), [0, 0, 1, 2]);
/// ```
#[inline]
pub fn encode_length(length: i32) -> [u8; LENGTH_PREFIX_SIZE] {
    length.to_be_bytes()
}

/// Decode a payload length (Big Endian).
#[inline]
pub fn decode_length(bytes: [u8; LENGTH_PREFIX_SIZE]) -> i32 {
    i32::from_be_bytes(bytes)
}

/// Check a decoded length against the framing rules.
///
/// Returns the body size to read.
pub fn validate_length(length: i32, max_payload_size: usize) -> Result<usize, ProtocolViolation> {
    if length <= 0 {
        return Err(ProtocolViolation::ZeroOrNegativeLength(length));
    }

    let length = length as usize;
    if length > max_payload_size {
        return Err(ProtocolViolation::PayloadTooLarge {
            length,
            max: max_payload_size,
        });
    }

    Ok(length)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_length_is_big_endian() {
        assert_eq!(encode_length(1), [0, 0, 0, 1]);
        assert_eq!(encode_length(0x0102_0304), [1, 2, 3, 4]);
        assert_eq!(decode_length([0, 0, 0x01, 0x00]), 256);
    }

    #[test]
    fn test_negative_length_bit_pattern() {
        assert_eq!(decode_length([0xFF, 0xFF, 0xFF, 0xFF]), -1);
        assert_eq!(decode_length([0x80, 0, 0, 0]), i32::MIN);
    }

    #[test]
    fn test_validate_positive() {
        assert_eq!(validate_length(1, DEFAULT_MAX_PAYLOAD_SIZE), Ok(1));
        assert_eq!(validate_length(4096, DEFAULT_MAX_PAYLOAD_SIZE), Ok(4096));
    }

    #[test]
    fn test_validate_zero_and_negative() {
        assert_eq!(
            validate_length(0, DEFAULT_MAX_PAYLOAD_SIZE),
            Err(ProtocolViolation::ZeroOrNegativeLength(0))
        );
        assert_eq!(
            validate_length(-7, DEFAULT_MAX_PAYLOAD_SIZE),
            Err(ProtocolViolation::ZeroOrNegativeLength(-7))
        );
    }

    #[test]
    fn test_validate_too_large() {
        assert_eq!(
            validate_length(101, 100),
            Err(ProtocolViolation::PayloadTooLarge {
                length: 101,
                max: 100
            })
        );
        assert_eq!(validate_length(100, 100), Ok(100));
    }

    #[test]
    fn test_absolute_max_accepted() {
        assert_eq!(
            validate_length(i32::MAX, ABSOLUTE_MAX_PAYLOAD_SIZE),
            Ok(ABSOLUTE_MAX_PAYLOAD_SIZE)
        );
    }
}
