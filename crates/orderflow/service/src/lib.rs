//! Orderflow REST daemon.
//!
//! The daemon exposes:
//! - an authenticated admin API for statuses, workflow rules, order status
//!   changes, and platform event injection
//! - a public tracking surface (`/order-tracking/<key>`, timelines, health)
//!
//! Modules are public so integration tests can assemble a router over
//! in-memory backends.

#![deny(unsafe_code)]
#![warn(rust_2018_idioms)]

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod router;
pub mod seed;
pub mod server;
pub mod state;

pub use config::ServiceConfig;
pub use error::{ApiError, ApiResult, ServiceError, ServiceResult};
pub use router::create_router;
pub use server::Server;
pub use state::AppState;
