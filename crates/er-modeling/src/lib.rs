#![forbid(unsafe_code)]

//! Modeling side of the ER editor.
//!
//! [`PropertyService`] validates and writes business-object properties,
//! fires change events and queues redraws; [`Editor`] owns the graph and the
//! per-element surfaces and runs the queue after each host transaction.
//! Structural changes go through the [`Modeling`] host trait.

mod editor;
mod events;
mod modeling;
mod queue;
mod service;

pub use editor::{Editor, FlushReport};
pub use events::{Event, EventBus, EventKind, FireReport, Listener, ListenerId};
pub use modeling::{HostCall, InMemoryModeling, Modeling};
pub use queue::{DeferredQueue, Redraw};
pub use service::{BatchOutcome, PropertyService, UpdateOptions, UpdateOutcome};
