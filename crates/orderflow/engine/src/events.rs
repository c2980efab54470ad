//! Workflow events published for external listeners.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Events emitted by the workflow engine on its broadcast channel.
///
/// Listeners subscribe via [`crate::WorkflowEngine::subscribe`]; a lagging
/// or absent listener never blocks evaluation.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WorkflowEvent {
    /// An order status transition was observed and recorded.
    StatusChanged {
        order_id: i64,
        from_status: Option<String>,
        to_status: String,
        at: DateTime<Utc>,
    },

    /// A workflow rule's trigger was satisfied and its side effects ran.
    RuleExecuted {
        order_id: i64,
        rule_id: i64,
        from_status: String,
        to_status: String,
        at: DateTime<Utc>,
    },

    /// A customer notification was handed to the notifier.
    NotificationSent {
        order_id: i64,
        recipient: String,
        at: DateTime<Utc>,
    },
}
