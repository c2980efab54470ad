//! Custom order statuses: display metadata plus a workflow position.
//!
//! The storefront platform stores order status keys with a `shop-` prefix
//! (e.g. `shop-packed`). Everything in this workspace compares *bare* slugs;
//! [`bare_status`] strips the prefix wherever a platform key may leak in.

use crate::ValidationError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Prefix the host platform puts in front of order status keys.
pub const STATUS_KEY_PREFIX: &str = "shop-";

/// Built-in status orders fall back to when their custom status is deleted.
pub const FALLBACK_STATUS_SLUG: &str = "pending";

/// Strip the platform status-key prefix, if present.
pub fn bare_status(key: &str) -> &str {
    key.strip_prefix(STATUS_KEY_PREFIX).unwrap_or(key)
}

/// Build the platform status key for a bare slug.
pub fn prefixed_status(slug: &str) -> String {
    if slug.starts_with(STATUS_KEY_PREFIX) {
        slug.to_string()
    } else {
        format!("{STATUS_KEY_PREFIX}{slug}")
    }
}

/// Display name used when a status key resolves to no catalog row
/// (built-in platform statuses, deleted custom statuses).
pub fn display_fallback_name(key: &str) -> String {
    let bare = bare_status(key);
    let mut chars = bare.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

// ── Visibility ───────────────────────────────────────────────────────

/// Where a status is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StatusVisibility {
    Admin,
    Customer,
    #[default]
    Both,
}

impl StatusVisibility {
    pub fn as_str(&self) -> &'static str {
        match self {
            StatusVisibility::Admin => "admin",
            StatusVisibility::Customer => "customer",
            StatusVisibility::Both => "both",
        }
    }
}

impl std::str::FromStr for StatusVisibility {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(StatusVisibility::Admin),
            "customer" => Ok(StatusVisibility::Customer),
            "both" => Ok(StatusVisibility::Both),
            other => Err(ValidationError::invalid(
                "visibility",
                format!("unknown visibility '{other}'"),
            )),
        }
    }
}

// ── Custom status ────────────────────────────────────────────────────

/// A persisted custom order status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomStatus {
    pub id: i64,
    pub name: String,
    /// Unique, URL-safe, immutable once created.
    pub slug: String,
    /// Hex color used for badges and email banners.
    pub color: String,
    /// Opaque icon identifier (e.g. an icon-font class).
    pub icon: String,
    pub visibility: StatusVisibility,
    /// Sort key for the displayed/logical status sequence. Ties break by id.
    pub workflow_order: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email_template: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CustomStatus {
    pub fn display(&self) -> StatusDisplay {
        StatusDisplay {
            name: self.name.clone(),
            color: self.color.clone(),
            icon: self.icon.clone(),
            visibility: self.visibility,
        }
    }

    /// Whether this status carries a non-empty notification template.
    pub fn has_email_template(&self) -> bool {
        self.email_template
            .as_deref()
            .is_some_and(|t| !t.trim().is_empty())
    }
}

/// Display metadata subset resolved for a status key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusDisplay {
    pub name: String,
    pub color: String,
    pub icon: String,
    pub visibility: StatusVisibility,
}

// ── Create / update payloads ─────────────────────────────────────────

/// Payload for creating a custom status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewStatus {
    pub name: String,
    pub slug: String,
    #[serde(default = "default_color")]
    pub color: String,
    #[serde(default)]
    pub icon: String,
    #[serde(default)]
    pub visibility: StatusVisibility,
    #[serde(default)]
    pub workflow_order: i32,
    #[serde(default)]
    pub email_template: Option<String>,
}

fn default_color() -> String {
    "#0073aa".to_string()
}

impl NewStatus {
    pub fn new(name: impl Into<String>, slug: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            slug: slug.into(),
            color: default_color(),
            icon: String::new(),
            visibility: StatusVisibility::Both,
            workflow_order: 0,
            email_template: None,
        }
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = color.into();
        self
    }

    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = icon.into();
        self
    }

    pub fn with_workflow_order(mut self, order: i32) -> Self {
        self.workflow_order = order;
        self
    }

    pub fn with_email_template(mut self, template: impl Into<String>) -> Self {
        self.email_template = Some(template.into());
        self
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::Missing("name"));
        }
        if self.name.len() > 100 {
            return Err(ValidationError::invalid("name", "longer than 100 characters"));
        }
        validate_slug(&self.slug)?;
        validate_hex_color(&self.color)?;
        if self.icon.len() > 50 {
            return Err(ValidationError::invalid("icon", "longer than 50 characters"));
        }
        Ok(())
    }
}

/// Partial update for a custom status. The slug is immutable and therefore
/// absent here; unspecified fields retain their previous value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatusPatch {
    pub name: Option<String>,
    pub color: Option<String>,
    pub icon: Option<String>,
    pub visibility: Option<StatusVisibility>,
    pub workflow_order: Option<i32>,
    pub email_template: Option<Option<String>>,
}

impl StatusPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.color.is_none()
            && self.icon.is_none()
            && self.visibility.is_none()
            && self.workflow_order.is_none()
            && self.email_template.is_none()
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(name) = &self.name {
            if name.trim().is_empty() {
                return Err(ValidationError::Missing("name"));
            }
        }
        if let Some(color) = &self.color {
            validate_hex_color(color)?;
        }
        Ok(())
    }
}

pub(crate) fn validate_slug(slug: &str) -> Result<(), ValidationError> {
    if slug.is_empty() {
        return Err(ValidationError::Missing("slug"));
    }
    if slug.len() > 50 {
        return Err(ValidationError::invalid("slug", "longer than 50 characters"));
    }
    let ok = slug
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
    if !ok {
        return Err(ValidationError::invalid(
            "slug",
            "only lowercase letters, digits, and dashes allowed",
        ));
    }
    Ok(())
}

fn validate_hex_color(color: &str) -> Result<(), ValidationError> {
    let valid = color.starts_with('#')
        && matches!(color.len(), 4 | 7)
        && color[1..].chars().all(|c| c.is_ascii_hexdigit());
    if !valid {
        return Err(ValidationError::invalid(
            "color",
            format!("'{color}' is not a hex color"),
        ));
    }
    Ok(())
}
