//! MsgPack formatter using `rmp-serde`.
//!
//! Always uses `to_vec_named` so structs are written as maps keyed by field
//! name. Adding an optional field to an event stays readable by older peers.

use super::Formatter;
use crate::error::Result;
use crate::event::Event;

/// MessagePack codec for any serde type.
pub struct MsgPackCodec;

impl MsgPackCodec {
    /// Encode a value to MsgPack bytes (struct-as-map).
    ///
    /// # Errors
    ///
    /// Returns error if the value cannot be serialized.
    #[inline]
    pub fn encode<T: serde::Serialize>(value: &T) -> Result<Vec<u8>> {
        Ok(rmp_serde::to_vec_named(value)?)
    }

    /// Decode MsgPack bytes to a value.
    ///
    /// # Errors
    ///
    /// Returns error if the bytes cannot be deserialized to type T.
    #[inline]
    pub fn decode<T: serde::de::DeserializeOwned>(bytes: &[u8]) -> Result<T> {
        Ok(rmp_serde::from_slice(bytes)?)
    }
}

/// Default [`Formatter`]: events as MessagePack maps.
#[derive(Debug, Clone, Copy, Default)]
pub struct MsgPackFormatter;

impl Formatter for MsgPackFormatter {
    fn serialize(&self, event: &Event) -> Result<Vec<u8>> {
        MsgPackCodec::encode(event)
    }

    fn deserialize(&self, bytes: &[u8]) -> Result<Event> {
        MsgPackCodec::decode(bytes)
    }
}
