//! The publish interface shared by transports and consumers.
//!
//! Anything that accepts events implements [`EventSink`]: the accepting
//! transport (frames and sends), a [`Dispatcher`](crate::handler::Dispatcher)
//! (routes to handlers), a [`TreeBuilder`](crate::tree::TreeBuilder), or a
//! plain `Vec<Event>` in tests.

use tokio::sync::mpsc;

use crate::error::{RelayError, Result};
use crate::event::Event;

/// A destination for events.
pub trait EventSink {
    /// Hand an event to the sink.
    ///
    /// Ownership of the event moves into the sink.
    fn publish(&mut self, event: Event) -> Result<()>;
}

impl EventSink for Vec<Event> {
    fn publish(&mut self, event: Event) -> Result<()> {
        self.push(event);
        Ok(())
    }
}

impl<S: EventSink + ?Sized> EventSink for Box<S> {
    fn publish(&mut self, event: Event) -> Result<()> {
        (**self).publish(event)
    }
}

impl<S: EventSink + ?Sized> EventSink for &mut S {
    fn publish(&mut self, event: Event) -> Result<()> {
        (**self).publish(event)
    }
}

/// Sink that forwards events to another task.
///
/// The receive loop stays responsive while a slow consumer works through
/// the channel at its own pace.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<Event>,
}

impl ChannelSink {
    /// Create a sink and the receiver that drains it.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Event>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl EventSink for ChannelSink {
    fn publish(&mut self, event: Event) -> Result<()> {
        self.tx
            .send(event)
            .map_err(|_| RelayError::ConnectionClosed)
    }
}
