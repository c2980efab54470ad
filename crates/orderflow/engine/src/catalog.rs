//! Status catalog orchestration.
//!
//! Thin validation and lookup over the status store, plus the one
//! multi-step operation in the system: deleting a status reassigns every
//! order still in it to the built-in fallback before removing the row.
//! The two steps are separate statements by design; there is no transaction.

use crate::error::EngineResult;
use crate::evaluator::WorkflowEngine;
use crate::gateway::OrderGateway;
use orderflow_storage::{OrderflowStore, StatusStore, StorageError};
use orderflow_types::{
    bare_status, CustomStatus, NewStatus, StatusDisplay, StatusPatch, FALLBACK_STATUS_SLUG,
};
use std::sync::Arc;

/// Reason recorded on orders moved off a deleted status.
const DELETE_REASSIGN_REASON: &str = "Status deleted, moved to pending";

/// Validated CRUD and display lookup for custom statuses.
pub struct StatusCatalog {
    store: Arc<dyn OrderflowStore>,
    orders: Arc<dyn OrderGateway>,
    engine: Arc<WorkflowEngine>,
}

impl StatusCatalog {
    pub fn new(
        store: Arc<dyn OrderflowStore>,
        orders: Arc<dyn OrderGateway>,
        engine: Arc<WorkflowEngine>,
    ) -> Self {
        Self {
            store,
            orders,
            engine,
        }
    }

    /// Create a custom status. The new status is immediately visible to the
    /// evaluator and the status list.
    pub async fn create(&self, new: NewStatus) -> EngineResult<CustomStatus> {
        new.validate()?;
        Ok(self.store.create_status(new).await?)
    }

    /// Partial update. The slug is immutable; `StatusPatch` cannot carry it.
    pub async fn update(&self, id: i64, patch: StatusPatch) -> EngineResult<CustomStatus> {
        patch.validate()?;
        Ok(self.store.update_status(id, patch).await?)
    }

    /// Delete a status: every order still in it is moved to the fallback
    /// status (each gaining a history entry), then the row is removed.
    /// Returns the number of reassigned orders.
    pub async fn delete(&self, id: i64) -> EngineResult<usize> {
        let status = self
            .store
            .get_status(id)
            .await?
            .ok_or_else(|| StorageError::NotFound(format!("status {id} not found")))?;

        let order_ids = self.orders.ids_in_status(&status.slug).await?;
        let mut reassigned = 0;
        for order_id in order_ids {
            match self
                .engine
                .change_status(order_id, FALLBACK_STATUS_SLUG, None, DELETE_REASSIGN_REASON)
                .await
            {
                Ok(()) => reassigned += 1,
                Err(err) => {
                    tracing::warn!(order_id, slug = %status.slug, %err,
                        "failed to reassign order off deleted status");
                }
            }
        }

        self.store.delete_status(id).await?;
        tracing::info!(status_id = id, slug = %status.slug, reassigned,
            "custom status deleted");
        Ok(reassigned)
    }

    pub async fn get(&self, id: i64) -> EngineResult<Option<CustomStatus>> {
        Ok(self.store.get_status(id).await?)
    }

    pub async fn get_by_slug(&self, slug: &str) -> EngineResult<Option<CustomStatus>> {
        Ok(self.store.get_status_by_slug(slug).await?)
    }

    /// All statuses ordered by workflow position. Fresh query per call.
    pub async fn list(&self) -> EngineResult<Vec<CustomStatus>> {
        Ok(self.store.list_statuses().await?)
    }

    /// Display metadata for a (possibly prefixed) status key. `None` when
    /// the key resolves to no catalog row.
    pub async fn display_info(&self, status_key: &str) -> EngineResult<Option<StatusDisplay>> {
        let status = self
            .store
            .get_status_by_slug(bare_status(status_key))
            .await?;
        Ok(status.map(|s| s.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::MemoryOrderGateway;
    use orderflow_notify::NullNotifier;
    use orderflow_storage::InMemoryOrderflowStore;
    use orderflow_types::{StatusVisibility, ValidationError};

    struct Fixture {
        orders: Arc<MemoryOrderGateway>,
        engine: Arc<WorkflowEngine>,
        catalog: StatusCatalog,
    }

    fn fixture() -> Fixture {
        let store: Arc<InMemoryOrderflowStore> = Arc::new(InMemoryOrderflowStore::new());
        let orders = Arc::new(MemoryOrderGateway::new());
        let engine = Arc::new(WorkflowEngine::new(
            store.clone(),
            orders.clone(),
            Arc::new(NullNotifier),
        ));
        let catalog = StatusCatalog::new(store, orders.clone(), engine.clone());
        Fixture {
            orders,
            engine,
            catalog,
        }
    }

    #[tokio::test]
    async fn test_create_validates_input() {
        let f = fixture();
        let err = f
            .catalog
            .create(NewStatus::new("Bad", "Not A Slug"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            crate::EngineError::Validation(ValidationError::Invalid { field: "slug", .. })
        ));
    }

    #[tokio::test]
    async fn test_display_info_strips_prefix_and_falls_through() {
        let f = fixture();
        f.catalog
            .create(
                NewStatus::new("Packed", "packed")
                    .with_color("#ff9500")
                    .with_icon("fas fa-box"),
            )
            .await
            .unwrap();

        let info = f.catalog.display_info("shop-packed").await.unwrap().unwrap();
        assert_eq!(info.name, "Packed");
        assert_eq!(info.color, "#ff9500");
        assert_eq!(info.visibility, StatusVisibility::Both);

        assert!(f.catalog.display_info("shop-completed").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_reassigns_orders_and_logs_history() {
        let f = fixture();
        let status = f
            .catalog
            .create(NewStatus::new("Packed", "packed"))
            .await
            .unwrap();

        f.orders.seed_order(1, "shop-packed", true);
        f.orders.seed_order(2, "shop-packed", false);
        f.orders.seed_order(3, "shop-processing", true);

        let reassigned = f.catalog.delete(status.id).await.unwrap();
        assert_eq!(reassigned, 2);

        // No orders remain in the deleted status.
        assert!(f.orders.ids_in_status("packed").await.unwrap().is_empty());
        assert_eq!(f.orders.ids_in_status("pending").await.unwrap(), vec![1, 2]);
        // The untouched order keeps its status.
        assert_eq!(f.orders.ids_in_status("processing").await.unwrap(), vec![3]);

        // Exactly one history entry per reassigned order, noting the fallback.
        for order_id in [1, 2] {
            let timeline = f.engine.timeline(order_id).await.unwrap();
            assert_eq!(timeline.len(), 1);
            assert_eq!(timeline[0].entry.to_status, "pending");
            assert_eq!(
                timeline[0].entry.change_reason,
                "Status deleted, moved to pending"
            );
        }
        assert!(f.engine.timeline(3).await.unwrap().is_empty());

        // The row itself is gone.
        assert!(f.catalog.get(status.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_unknown_status_is_not_found() {
        let f = fixture();
        let err = f.catalog.delete(77).await.unwrap_err();
        assert!(err.is_not_found());
    }
}
