//! Codec module - payload formatters.
//!
//! A [`Formatter`] turns an [`Event`] into the opaque payload bytes carried
//! inside a frame, and back. The transport never looks inside the payload.
//!
//! - [`MsgPackFormatter`] - MessagePack using `rmp-serde` (`to_vec_named`), the default
//! - [`JsonFormatter`] - JSON using `serde_json`, readable in packet captures
//!
//! # Example
//!
//! ```
//! use eventwire::codec::{Formatter, MsgPackFormatter};
//! use eventwire::event::{Event, TestData, TestDiscovered};
//!
//! let event: Event = TestDiscovered {
//!     test: TestData::new("t1", "First"),
//!     parent_test_id: None,
//! }
//! .into();
//!
//! let bytes = MsgPackFormatter.serialize(&event).unwrap();
//! assert_eq!(MsgPackFormatter.deserialize(&bytes).unwrap(), event);
//! ```

mod json;
mod msgpack;

pub use json::JsonFormatter;
pub use msgpack::{MsgPackCodec, MsgPackFormatter};

use crate::error::Result;
use crate::event::Event;

/// Pluggable event serializer, injected into both transports.
pub trait Formatter: Send + Sync + 'static {
    /// Encode an event into payload bytes.
    fn serialize(&self, event: &Event) -> Result<Vec<u8>>;

    /// Decode payload bytes back into an event.
    fn deserialize(&self, bytes: &[u8]) -> Result<Event>;
}
