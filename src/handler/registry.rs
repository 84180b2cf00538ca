//! Dispatcher routing events to the handler registered for their variant.
//!
//! The table is keyed by [`EventKind`]. Handlers receive the unwrapped
//! payload type together with a mutable context owned by the dispatcher.
//! Events whose variant has no handler are dropped without error, so a
//! dispatcher only has to register for the events it cares about.
//!
//! # Example
//!
//! ```
//! use eventwire::event::{AnnotationDiscovered, AnnotationData, AnnotationKind, Event};
//! use eventwire::handler::Dispatcher;
//! use eventwire::sink::EventSink;
//!
//! let mut dispatcher = Dispatcher::with_context(Vec::<String>::new())
//!     .handle(|seen: &mut Vec<String>, e: AnnotationDiscovered| {
//!         seen.push(e.annotation.message);
//!         Ok(())
//!     });
//!
//! let event: Event = AnnotationDiscovered {
//!     annotation: AnnotationData::new(AnnotationKind::Info, "hello"),
//! }
//! .into();
//! dispatcher.publish(event).unwrap();
//!
//! assert_eq!(dispatcher.context(), &vec!["hello".to_string()]);
//! ```

use std::collections::HashMap;
use std::marker::PhantomData;

use crate::error::Result;
use crate::event::{Event, EventKind, Variant};
use crate::sink::EventSink;

/// Result type for handler functions.
pub type HandlerResult = Result<()>;

/// Trait for handler functions.
pub trait Handler<C>: Send {
    /// Handle an event already routed to this handler.
    fn call(&mut self, context: &mut C, event: Event) -> HandlerResult;
}

/// Wrapper that unwraps the variant payload before calling the handler.
pub struct TypedHandler<F, V> {
    handler: F,
    _phantom: PhantomData<fn(V)>,
}

impl<F, V> TypedHandler<F, V> {
    /// Create a new typed handler.
    pub fn new(handler: F) -> Self {
        Self {
            handler,
            _phantom: PhantomData,
        }
    }
}

impl<C, F, V> Handler<C> for TypedHandler<F, V>
where
    F: FnMut(&mut C, V) -> HandlerResult + Send,
    V: Variant,
{
    fn call(&mut self, context: &mut C, event: Event) -> HandlerResult {
        match V::from_event(event) {
            Some(payload) => (self.handler)(context, payload),
            None => Ok(()),
        }
    }
}

/// Sink that routes each event to the handler registered for its variant.
pub struct Dispatcher<C = ()> {
    context: C,
    handlers: HashMap<EventKind, Box<dyn Handler<C>>>,
}

impl Dispatcher<()> {
    /// Create a dispatcher without shared state.
    pub fn new() -> Self {
        Self::with_context(())
    }
}

impl Default for Dispatcher<()> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> Dispatcher<C> {
    /// Create a dispatcher whose handlers share `context`.
    pub fn with_context(context: C) -> Self {
        Self {
            context,
            handlers: HashMap::new(),
        }
    }

    /// Register a handler for variant `V` (fluent form).
    ///
    /// A later registration for the same variant replaces the earlier one.
    pub fn handle<V, F>(mut self, handler: F) -> Self
    where
        V: Variant + 'static,
        F: FnMut(&mut C, V) -> HandlerResult + Send + 'static,
    {
        self.register(handler);
        self
    }

    /// Register a handler for variant `V`.
    pub fn register<V, F>(&mut self, handler: F)
    where
        V: Variant + 'static,
        F: FnMut(&mut C, V) -> HandlerResult + Send + 'static,
    {
        self.handlers
            .insert(V::KIND, Box::new(TypedHandler::<F, V>::new(handler)));
    }

    /// Whether a handler is registered for `kind`.
    pub fn handles(&self, kind: EventKind) -> bool {
        self.handlers.contains_key(&kind)
    }

    /// Number of registered handlers.
    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }

    /// Route an event.
    ///
    /// Returns `Ok(false)` when no handler is registered for its variant.
    pub fn dispatch(&mut self, event: Event) -> Result<bool> {
        let kind = event.kind();
        match self.handlers.get_mut(&kind) {
            Some(handler) => {
                handler.call(&mut self.context, event)?;
                Ok(true)
            }
            None => {
                tracing::trace!("No handler for {:?}, dropping event", kind);
                Ok(false)
            }
        }
    }

    pub fn context(&self) -> &C {
        &self.context
    }

    pub fn context_mut(&mut self) -> &mut C {
        &mut self.context
    }

    /// Consume the dispatcher, returning the handlers' shared state.
    pub fn into_context(self) -> C {
        self.context
    }
}

impl<C> EventSink for Dispatcher<C> {
    fn publish(&mut self, event: Event) -> Result<()> {
        self.dispatch(event).map(|_| ())
    }
}
