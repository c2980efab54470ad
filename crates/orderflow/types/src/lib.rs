//! Orderflow domain types.
//!
//! This crate defines the shared vocabulary of the orderflow workspace:
//! - custom order statuses (display metadata + workflow position)
//! - workflow rules (from/to transition patterns with trigger conditions)
//! - the append-only status history and its joined timeline view
//! - order snapshots as observed through the host platform gateway
//!
//! Types here carry no I/O. Persistence lives in `orderflow-storage`,
//! evaluation in `orderflow-engine`.

#![deny(unsafe_code)]
#![warn(rust_2018_idioms)]

mod error;
mod history;
mod order;
mod rule;
mod status;

pub use error::ValidationError;
pub use history::{HistoryAppend, StatusHistoryEntry, TimelineEntry};
pub use order::{OrderLineItem, OrderSnapshot, ProductStock};
pub use rule::{NewRule, RulePatch, TriggerType, WorkflowRule, WILDCARD_FROM};
pub use status::{
    bare_status, display_fallback_name, prefixed_status, CustomStatus, NewStatus, StatusDisplay,
    StatusPatch, StatusVisibility, FALLBACK_STATUS_SLUG, STATUS_KEY_PREFIX,
};
