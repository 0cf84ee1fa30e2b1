//! # Event Bus Module
//!
//! Named-event publish/subscribe used to decouple producers from consumers across the
//! kernel and its plugins.
//!
//! ## Overview
//!
//! - Publishers emit events by name without knowing subscribers
//! - Handlers run synchronously, in registration order, on the emitting thread
//! - Every event carries a stack of block tokens: while one emission of an event is in
//!   progress, nested emissions of the same event are dropped
//!
//! ## Usage
//!
//! ```rust,ignore
//! use camflow_core::event_bus::{EventBus, EventPayload};
//! use std::rc::Rc;
//!
//! let bus = EventBus::new();
//! let handler: EventHandler = Rc::new(|payload| println!("models changed: {payload:?}"));
//! bus.subscribe("model-list-changed", handler.clone());
//!
//! bus.emit("model-list-changed");
//!
//! bus.unsubscribe("model-list-changed", &handler);
//! ```

mod bus;
mod events;

pub use bus::*;
pub use events::*;
