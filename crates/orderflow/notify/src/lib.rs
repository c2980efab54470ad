//! Customer notification rendering and transport.
//!
//! The [`Notifier`] trait is the collaborator contract the workflow engine
//! depends on: given an order and either a custom status or a workflow rule,
//! an implementation substitutes template placeholders, wraps the result in
//! an HTML document, and delivers it.
//!
//! Transports:
//! - [`WebhookNotifier`]: POSTs the rendered message as JSON to a mail
//!   relay endpoint (production).
//! - [`RecordingNotifier`]: renders and records in memory (tests).
//! - [`NullNotifier`]: renders nothing, delivers nothing (dev default).

#![deny(unsafe_code)]
#![warn(rust_2018_idioms)]

pub mod template;

use async_trait::async_trait;
use orderflow_types::{CustomStatus, OrderSnapshot, WorkflowRule};
use serde::{Deserialize, Serialize};
use std::sync::Mutex;
use thiserror::Error;

pub use template::SiteInfo;

/// Result type for notification operations.
pub type NotifyResult<T> = Result<T, NotifyError>;

/// Notification-layer errors.
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("transport error: {0}")]
    Transport(String),
}

/// A fully rendered notification, ready for delivery.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub html_body: String,
}

/// Delivers status and workflow-rule notifications for an order.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Notify the customer that their order reached `status`.
    async fn send_status_notification(
        &self,
        order: &OrderSnapshot,
        status: &CustomStatus,
    ) -> NotifyResult<()>;

    /// Notify the customer that `rule` fired for their order.
    async fn send_rule_notification(
        &self,
        order: &OrderSnapshot,
        rule: &WorkflowRule,
    ) -> NotifyResult<()>;
}

// ── Webhook transport ────────────────────────────────────────────────

/// Delivers rendered messages to a mail relay over HTTP.
pub struct WebhookNotifier {
    client: reqwest::Client,
    endpoint: String,
    site: SiteInfo,
}

impl WebhookNotifier {
    pub fn new(endpoint: impl Into<String>, site: SiteInfo) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
            site,
        }
    }

    async fn deliver(&self, message: EmailMessage) -> NotifyResult<()> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&message)
            .send()
            .await
            .map_err(|e| NotifyError::Transport(format!("relay request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(NotifyError::Transport(format!(
                "relay returned {}",
                response.status()
            )));
        }

        tracing::debug!(to = %message.to, subject = %message.subject, "notification delivered");
        Ok(())
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn send_status_notification(
        &self,
        order: &OrderSnapshot,
        status: &CustomStatus,
    ) -> NotifyResult<()> {
        self.deliver(template::render_status_email(order, status, &self.site))
            .await
    }

    async fn send_rule_notification(
        &self,
        order: &OrderSnapshot,
        rule: &WorkflowRule,
    ) -> NotifyResult<()> {
        self.deliver(template::render_rule_email(order, rule, &self.site))
            .await
    }
}

// ── Recording transport (tests) ──────────────────────────────────────

/// Renders messages and records them instead of delivering.
#[derive(Default)]
pub struct RecordingNotifier {
    site: SiteInfo,
    sent: Mutex<Vec<EmailMessage>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_site(site: SiteInfo) -> Self {
        Self {
            site,
            sent: Mutex::new(Vec::new()),
        }
    }

    /// Messages recorded so far, in send order.
    pub fn sent(&self) -> Vec<EmailMessage> {
        self.sent.lock().map(|g| g.clone()).unwrap_or_default()
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().map(|g| g.len()).unwrap_or(0)
    }

    fn record(&self, message: EmailMessage) -> NotifyResult<()> {
        self.sent
            .lock()
            .map_err(|_| NotifyError::Transport("recording lock poisoned".to_string()))?
            .push(message);
        Ok(())
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send_status_notification(
        &self,
        order: &OrderSnapshot,
        status: &CustomStatus,
    ) -> NotifyResult<()> {
        self.record(template::render_status_email(order, status, &self.site))
    }

    async fn send_rule_notification(
        &self,
        order: &OrderSnapshot,
        rule: &WorkflowRule,
    ) -> NotifyResult<()> {
        self.record(template::render_rule_email(order, rule, &self.site))
    }
}

// ── Null transport ───────────────────────────────────────────────────

/// Discards every notification. Used when notifications are disabled.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullNotifier;

#[async_trait]
impl Notifier for NullNotifier {
    async fn send_status_notification(
        &self,
        _order: &OrderSnapshot,
        _status: &CustomStatus,
    ) -> NotifyResult<()> {
        Ok(())
    }

    async fn send_rule_notification(
        &self,
        _order: &OrderSnapshot,
        _rule: &WorkflowRule,
    ) -> NotifyResult<()> {
        Ok(())
    }
}
