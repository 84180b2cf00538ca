//! Handler module - typed event dispatch.
//!
//! Provides:
//! - [`Dispatcher`] - a sink that maps event variants to handlers
//! - [`Handler`] / [`TypedHandler`] - the type-erased handler seam
//!
//! # Example
//!
//! ```
//! use eventwire::event::{AnnotationDiscovered, TestDiscovered};
//! use eventwire::handler::Dispatcher;
//!
//! let dispatcher = Dispatcher::with_context(0usize)
//!     .handle(|count: &mut usize, _: TestDiscovered| {
//!         *count += 1;
//!         Ok(())
//!     })
//!     .handle(|_: &mut usize, e: AnnotationDiscovered| {
//!         println!("{}", e.annotation.message);
//!         Ok(())
//!     });
//!
//! assert_eq!(dispatcher.handler_count(), 2);
//! ```

mod registry;

pub use registry::{Dispatcher, Handler, HandlerResult, TypedHandler};
