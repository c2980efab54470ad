//! Request handlers.

pub mod health;
pub mod orders;
pub mod platform;
pub mod rules;
pub mod statuses;
pub mod tracking;

pub use health::*;
pub use orders::*;
pub use platform::*;
pub use rules::*;
pub use statuses::*;
pub use tracking::*;
