//! Orderflow workflow engine.
//!
//! The engine observes order status transitions raised by the host platform
//! and reacts to them:
//! 1. the transition is recorded in the append-only history log,
//! 2. stored workflow rules are matched against the transition,
//! 3. each satisfied rule appends an order note, optionally notifies the
//!    customer, and emits a `RuleExecuted` event for external listeners.
//!
//! The engine is stateless per invocation: rules are re-read on every
//! evaluation. Rule processing never surfaces user-visible errors; an
//! unmatched or uncheckable condition means "rule did not fire", not a
//! failure.
//!
//! All collaborators (stores, order gateway, notifier) are injected; there
//! are no globals.

#![deny(unsafe_code)]
#![warn(rust_2018_idioms)]

mod catalog;
mod error;
mod evaluator;
mod events;
mod gateway;

pub use catalog::StatusCatalog;
pub use error::{EngineError, EngineResult, GatewayError, GatewayResult};
pub use evaluator::WorkflowEngine;
pub use events::WorkflowEvent;
pub use gateway::{MemoryOrderGateway, OrderGateway};
