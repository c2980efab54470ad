//! The host platform order gateway.
//!
//! Orders are owned by the storefront platform; this trait is the narrow
//! window the engine observes and touches them through. The in-memory
//! implementation backs development profiles and tests.

use crate::error::{GatewayError, GatewayResult};
use async_trait::async_trait;
use chrono::Utc;
use orderflow_types::{bare_status, OrderLineItem, OrderSnapshot};
use std::collections::HashMap;
use std::sync::RwLock;

/// Read/annotate access to platform orders.
#[async_trait]
pub trait OrderGateway: Send + Sync {
    /// Fetch an order snapshot. `Ok(None)` when the id is unknown.
    async fn get(&self, order_id: i64) -> GatewayResult<Option<OrderSnapshot>>;

    /// Resolve an order by its opaque tracking key.
    async fn find_by_key(&self, tracking_key: &str) -> GatewayResult<Option<OrderSnapshot>>;

    /// Ids of all orders currently in the given bare status.
    async fn ids_in_status(&self, bare_slug: &str) -> GatewayResult<Vec<i64>>;

    /// Overwrite an order's status key. The caller raises the transition
    /// event; the gateway only stores the key.
    async fn set_status(&self, order_id: i64, status_key: &str) -> GatewayResult<()>;

    /// Append a note to the order's log.
    async fn add_note(&self, order_id: i64, note: &str) -> GatewayResult<()>;
}

#[derive(Default)]
struct Inner {
    orders: HashMap<i64, OrderSnapshot>,
    notes: HashMap<i64, Vec<String>>,
}

/// In-memory order gateway for development and tests.
#[derive(Default)]
pub struct MemoryOrderGateway {
    inner: RwLock<Inner>,
}

impl MemoryOrderGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert (or replace) an order snapshot.
    pub fn insert(&self, order: OrderSnapshot) {
        if let Ok(mut guard) = self.inner.write() {
            guard.orders.insert(order.id, order);
        }
    }

    /// Convenience constructor for a minimal order in the given status.
    pub fn seed_order(&self, order_id: i64, status_key: &str, paid: bool) -> OrderSnapshot {
        let order = OrderSnapshot {
            id: order_id,
            number: order_id.to_string(),
            status: status_key.to_string(),
            paid,
            tracking_key: format!("ok_{}", uuid::Uuid::new_v4().simple()),
            billing_name: format!("Customer {order_id}"),
            billing_email: format!("customer{order_id}@example.com"),
            total: "$0.00".to_string(),
            items: Vec::new(),
            created_at: Utc::now(),
        };
        self.insert(order.clone());
        order
    }

    /// Replace an order's line items.
    pub fn set_items(&self, order_id: i64, items: Vec<OrderLineItem>) {
        if let Ok(mut guard) = self.inner.write() {
            if let Some(order) = guard.orders.get_mut(&order_id) {
                order.items = items;
            }
        }
    }

    /// Notes recorded against an order, in append order.
    pub fn notes_for(&self, order_id: i64) -> Vec<String> {
        self.inner
            .read()
            .ok()
            .and_then(|g| g.notes.get(&order_id).cloned())
            .unwrap_or_default()
    }

    fn read(&self) -> GatewayResult<std::sync::RwLockReadGuard<'_, Inner>> {
        self.inner
            .read()
            .map_err(|_| GatewayError::Backend("gateway lock poisoned".to_string()))
    }

    fn write(&self) -> GatewayResult<std::sync::RwLockWriteGuard<'_, Inner>> {
        self.inner
            .write()
            .map_err(|_| GatewayError::Backend("gateway lock poisoned".to_string()))
    }
}

#[async_trait]
impl OrderGateway for MemoryOrderGateway {
    async fn get(&self, order_id: i64) -> GatewayResult<Option<OrderSnapshot>> {
        Ok(self.read()?.orders.get(&order_id).cloned())
    }

    async fn find_by_key(&self, tracking_key: &str) -> GatewayResult<Option<OrderSnapshot>> {
        Ok(self
            .read()?
            .orders
            .values()
            .find(|o| o.tracking_key == tracking_key)
            .cloned())
    }

    async fn ids_in_status(&self, bare_slug: &str) -> GatewayResult<Vec<i64>> {
        let mut ids: Vec<i64> = self
            .read()?
            .orders
            .values()
            .filter(|o| bare_status(&o.status) == bare_slug)
            .map(|o| o.id)
            .collect();
        ids.sort_unstable();
        Ok(ids)
    }

    async fn set_status(&self, order_id: i64, status_key: &str) -> GatewayResult<()> {
        let mut guard = self.write()?;
        let order = guard
            .orders
            .get_mut(&order_id)
            .ok_or(GatewayError::OrderNotFound(order_id))?;
        order.status = status_key.to_string();
        Ok(())
    }

    async fn add_note(&self, order_id: i64, note: &str) -> GatewayResult<()> {
        let mut guard = self.write()?;
        if !guard.orders.contains_key(&order_id) {
            return Err(GatewayError::OrderNotFound(order_id));
        }
        guard
            .notes
            .entry(order_id)
            .or_default()
            .push(note.to_string());
        Ok(())
    }
}
