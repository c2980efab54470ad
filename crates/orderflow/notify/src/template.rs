//! Email template rendering: placeholder substitution, default templates,
//! and the HTML document wrapper.
//!
//! Supported placeholders: `{customer_name}`, `{order_number}`,
//! `{status_name}`, `{status_color}`, `{from_status}`, `{to_status}`,
//! `{order_date}`, `{order_total}`, `{tracking_url}`, `{site_name}`,
//! `{site_url}`. Unknown placeholders pass through untouched.

use crate::EmailMessage;
use orderflow_types::{CustomStatus, OrderSnapshot, WorkflowRule};
use serde::{Deserialize, Serialize};

/// Site identity used for placeholders and tracking links.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteInfo {
    pub name: String,
    /// Public base URL, no trailing slash required.
    pub url: String,
}

impl Default for SiteInfo {
    fn default() -> Self {
        Self {
            name: "Orderflow".to_string(),
            url: "http://localhost:8080".to_string(),
        }
    }
}

impl SiteInfo {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
        }
    }

    /// Public tracking URL for an order.
    pub fn tracking_url(&self, order: &OrderSnapshot) -> String {
        format!(
            "{}/order-tracking/{}",
            self.url.trim_end_matches('/'),
            order.tracking_key
        )
    }
}

/// Render the notification sent when an order reaches a custom status.
pub fn render_status_email(
    order: &OrderSnapshot,
    status: &CustomStatus,
    site: &SiteInfo,
) -> EmailMessage {
    let template = status
        .email_template
        .as_deref()
        .filter(|t| !t.trim().is_empty())
        .unwrap_or(DEFAULT_STATUS_TEMPLATE);

    let content = substitute(
        template,
        &placeholders(order, site)
            .chain([
                ("{status_name}", status.name.clone()),
                ("{status_color}", status.color.clone()),
            ])
            .collect::<Vec<_>>(),
    );

    EmailMessage {
        to: order.billing_email.clone(),
        subject: format!("Order #{} Status Update: {}", order.number, status.name),
        html_body: wrap_html(&status.name, &status.color, &status.icon, &content, site),
    }
}

/// Render the notification sent when a workflow rule fires.
pub fn render_rule_email(
    order: &OrderSnapshot,
    rule: &WorkflowRule,
    site: &SiteInfo,
) -> EmailMessage {
    let template = rule
        .email_template
        .as_deref()
        .filter(|t| !t.trim().is_empty())
        .unwrap_or(DEFAULT_RULE_TEMPLATE);

    let content = substitute(
        template,
        &placeholders(order, site)
            .chain([
                ("{from_status}", rule.from_status.clone()),
                ("{to_status}", rule.to_status.clone()),
            ])
            .collect::<Vec<_>>(),
    );

    EmailMessage {
        to: order.billing_email.clone(),
        subject: format!("Order #{} Update: {}", order.number, rule.to_status),
        html_body: wrap_html("Order Update", RULE_BANNER_COLOR, "", &content, site),
    }
}

const RULE_BANNER_COLOR: &str = "#0073aa";

fn placeholders<'a>(
    order: &'a OrderSnapshot,
    site: &'a SiteInfo,
) -> impl Iterator<Item = (&'static str, String)> + 'a {
    [
        ("{customer_name}", order.billing_name.clone()),
        ("{order_number}", order.number.clone()),
        ("{order_date}", order.created_at.format("%B %-d, %Y").to_string()),
        ("{order_total}", order.total.clone()),
        ("{tracking_url}", site.tracking_url(order)),
        ("{site_name}", site.name.clone()),
        ("{site_url}", site.url.clone()),
    ]
    .into_iter()
}

fn substitute(template: &str, pairs: &[(&str, String)]) -> String {
    let mut out = template.to_string();
    for (key, value) in pairs {
        out = out.replace(key, value);
    }
    out
}

fn wrap_html(title: &str, color: &str, icon: &str, content: &str, site: &SiteInfo) -> String {
    let icon_html = if icon.is_empty() {
        String::new()
    } else {
        format!(r#"<i class="{icon}" style="font-size: 24px; margin-right: 10px;"></i>"#)
    };

    format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title}</title>
</head>
<body style="margin: 0; padding: 0; font-family: Arial, sans-serif; background-color: #f4f4f4;">
    <div style="max-width: 600px; margin: 0 auto; background-color: #ffffff; padding: 20px;">
        <div style="text-align: center; margin-bottom: 30px;">
            <h1 style="color: {color}; margin: 0;">{title}</h1>
        </div>
        <div style="background-color: {color}; color: white; padding: 15px; border-radius: 5px; margin-bottom: 20px; text-align: center;">
            {icon_html}<strong style="font-size: 18px;">{title}</strong>
        </div>
        <div style="line-height: 1.6; color: #333;">
            {content}
        </div>
        <div style="margin-top: 30px; padding-top: 20px; border-top: 1px solid #eee; text-align: center; color: #666; font-size: 12px;">
            <p>This email was sent from {site_name}</p>
        </div>
    </div>
</body>
</html>"#,
        title = title,
        color = color,
        icon_html = icon_html,
        content = content,
        site_name = site.name,
    )
}

const DEFAULT_STATUS_TEMPLATE: &str = "\
<p>Hello {customer_name},</p>
<p>We wanted to let you know that your order #{order_number} has been updated to: {status_name}</p>
<p>Order Details:</p>
<ul>
    <li>Order Number: {order_number}</li>
    <li>Order Date: {order_date}</li>
    <li>Total: {order_total}</li>
    <li>Current Status: {status_name}</li>
</ul>
<p>You can track your order status at: <a href=\"{tracking_url}\">{tracking_url}</a></p>
<p>Thank you for your business!</p>
<p>Best regards,<br>The {site_name} Team</p>";

const DEFAULT_RULE_TEMPLATE: &str = "\
<p>Hello {customer_name},</p>
<p>Your order #{order_number} status has changed from {from_status} to {to_status}</p>
<p>You can track your order status at: <a href=\"{tracking_url}\">{tracking_url}</a></p>
<p>Thank you for your business!</p>";
