//! Workflow rules: transition patterns with a trigger condition.

use crate::status::validate_slug;
use crate::ValidationError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// `from_status` value matching any originating status.
pub const WILDCARD_FROM: &str = "*";

/// What causes a workflow rule to fire.
///
/// `Manual` rules are never executed by the transition path; they exist only
/// to be invoked by direct operator action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TriggerType {
    #[default]
    Manual,
    Automatic,
    Payment,
    Stock,
}

impl TriggerType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TriggerType::Manual => "manual",
            TriggerType::Automatic => "automatic",
            TriggerType::Payment => "payment",
            TriggerType::Stock => "stock",
        }
    }
}

impl std::str::FromStr for TriggerType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "manual" => Ok(TriggerType::Manual),
            "automatic" => Ok(TriggerType::Automatic),
            "payment" => Ok(TriggerType::Payment),
            "stock" => Ok(TriggerType::Stock),
            other => Err(ValidationError::invalid(
                "trigger_type",
                format!("unknown trigger type '{other}'"),
            )),
        }
    }
}

impl std::fmt::Display for TriggerType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A persisted workflow rule. `(from_status, to_status)` is unique.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowRule {
    pub id: i64,
    /// Bare originating slug, or [`WILDCARD_FROM`].
    pub from_status: String,
    /// Bare destination slug.
    pub to_status: String,
    pub trigger_type: TriggerType,
    /// Opaque condition string, meaningful only for `stock` triggers.
    pub trigger_condition: String,
    pub email_notification: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email_template: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl WorkflowRule {
    /// Whether this rule applies to a transition between two *bare* slugs.
    pub fn matches(&self, old_bare: &str, new_bare: &str) -> bool {
        (self.from_status == old_bare || self.from_status == WILDCARD_FROM)
            && self.to_status == new_bare
    }

    /// Whether this rule carries a non-empty notification template.
    pub fn has_email_template(&self) -> bool {
        self.email_template
            .as_deref()
            .is_some_and(|t| !t.trim().is_empty())
    }
}

/// Payload for creating a workflow rule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewRule {
    pub from_status: String,
    pub to_status: String,
    #[serde(default)]
    pub trigger_type: TriggerType,
    #[serde(default)]
    pub trigger_condition: String,
    #[serde(default)]
    pub email_notification: bool,
    #[serde(default)]
    pub email_template: Option<String>,
}

impl NewRule {
    pub fn new(from_status: impl Into<String>, to_status: impl Into<String>) -> Self {
        Self {
            from_status: from_status.into(),
            to_status: to_status.into(),
            trigger_type: TriggerType::Manual,
            trigger_condition: String::new(),
            email_notification: false,
            email_template: None,
        }
    }

    pub fn with_trigger(mut self, trigger: TriggerType) -> Self {
        self.trigger_type = trigger;
        self
    }

    pub fn with_condition(mut self, condition: impl Into<String>) -> Self {
        self.trigger_condition = condition.into();
        self
    }

    pub fn with_notification(mut self, template: impl Into<String>) -> Self {
        self.email_notification = true;
        self.email_template = Some(template.into());
        self
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.from_status != WILDCARD_FROM {
            validate_slug(&self.from_status)
                .map_err(|_| ValidationError::invalid("from_status", "not a slug or wildcard"))?;
        }
        validate_slug(&self.to_status)
            .map_err(|_| ValidationError::invalid("to_status", "not a slug"))?;
        Ok(())
    }
}

/// Partial update for a workflow rule. Unspecified fields retain their
/// previous value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RulePatch {
    pub from_status: Option<String>,
    pub to_status: Option<String>,
    pub trigger_type: Option<TriggerType>,
    pub trigger_condition: Option<String>,
    pub email_notification: Option<bool>,
    pub email_template: Option<Option<String>>,
}

impl RulePatch {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(from) = &self.from_status {
            if from != WILDCARD_FROM {
                validate_slug(from)
                    .map_err(|_| ValidationError::invalid("from_status", "not a slug or wildcard"))?;
            }
        }
        if let Some(to) = &self.to_status {
            validate_slug(to).map_err(|_| ValidationError::invalid("to_status", "not a slug"))?;
        }
        Ok(())
    }
}
