//! Order snapshots as observed through the host platform gateway.
//!
//! Orders are owned by the storefront platform. This system never mutates
//! order data beyond its status key and notes; everything else is read-only
//! observation attached to `order_id`.

use crate::status::bare_status;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Stock information for a line item's product, when the product resolves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductStock {
    pub in_stock: bool,
    /// Managed stock quantity; `None` when stock is not tracked.
    pub stock_quantity: Option<i32>,
}

/// A single order line item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderLineItem {
    pub name: String,
    pub quantity: i32,
    /// `None` when the product no longer resolves (deleted, external).
    pub product: Option<ProductStock>,
}

/// Read-only view of a platform order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderSnapshot {
    pub id: i64,
    /// Customer-facing order number (usually the id, but opaque).
    pub number: String,
    /// Current status key as stored by the platform (may carry the prefix).
    pub status: String,
    pub paid: bool,
    /// Opaque key for unauthenticated customer lookup.
    pub tracking_key: String,
    pub billing_name: String,
    pub billing_email: String,
    /// Already-formatted order total, currency included.
    pub total: String,
    pub items: Vec<OrderLineItem>,
    pub created_at: DateTime<Utc>,
}

impl OrderSnapshot {
    /// Current status with any platform prefix stripped.
    pub fn bare_status(&self) -> &str {
        bare_status(&self.status)
    }

    pub fn is_paid(&self) -> bool {
        self.paid
    }
}
