//! First-run seeding.

use orderflow_engine::MemoryOrderGateway;
use orderflow_storage::{OrderflowStore, StatusStore, StorageResult};
use orderflow_types::{NewStatus, OrderLineItem, ProductStock};

/// Insert the default custom statuses when the catalog is empty.
/// Returns how many were created.
pub async fn seed_default_statuses(store: &dyn OrderflowStore) -> StorageResult<usize> {
    if !store.list_statuses().await?.is_empty() {
        return Ok(0);
    }

    let defaults = [
        NewStatus::new("Packed", "packed")
            .with_color("#ff9500")
            .with_icon("fas fa-box")
            .with_workflow_order(3),
        NewStatus::new("Out for Delivery", "out-for-delivery")
            .with_color("#00a32a")
            .with_icon("fas fa-shipping-fast")
            .with_workflow_order(4),
        NewStatus::new("Ready for Pickup", "ready-for-pickup")
            .with_color("#8c8f94")
            .with_icon("fas fa-hand-holding")
            .with_workflow_order(5),
    ];

    let mut created = 0;
    for status in defaults {
        store.create_status(status).await?;
        created += 1;
    }
    tracing::info!(created, "seeded default custom statuses");
    Ok(created)
}

/// Seed a handful of demo orders into the in-memory gateway so the tracking
/// surface has something to show in development profiles.
pub fn seed_demo_orders(gateway: &MemoryOrderGateway) {
    let paid = gateway.seed_order(1001, "shop-processing", true);
    gateway.set_items(
        1001,
        vec![OrderLineItem {
            name: "Ceramic Mug".to_string(),
            quantity: 2,
            product: Some(ProductStock {
                in_stock: true,
                stock_quantity: Some(14),
            }),
        }],
    );

    let pending = gateway.seed_order(1002, "shop-pending", false);
    gateway.set_items(
        1002,
        vec![OrderLineItem {
            name: "Walnut Desk Organizer".to_string(),
            quantity: 1,
            product: Some(ProductStock {
                in_stock: true,
                stock_quantity: Some(3),
            }),
        }],
    );

    tracing::info!(
        paid_key = %paid.tracking_key,
        pending_key = %pending.tracking_key,
        "seeded demo orders"
    );
}
