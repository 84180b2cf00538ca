//! JSON formatter using `serde_json`.

use super::Formatter;
use crate::error::Result;
use crate::event::Event;

/// [`Formatter`] that writes events as compact JSON.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonFormatter;

impl Formatter for JsonFormatter {
    fn serialize(&self, event: &Event) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(event)?)
    }

    fn deserialize(&self, bytes: &[u8]) -> Result<Event> {
        Ok(serde_json::from_slice(bytes)?)
    }
}
