//! Shared application state for request handlers.

use crate::config::ServiceConfig;
use orderflow_engine::{OrderGateway, StatusCatalog, WorkflowEngine};
use orderflow_storage::OrderflowStore;
use std::sync::Arc;

/// State handed to every handler. Cheap to clone; everything is Arc'd.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServiceConfig>,
    pub store: Arc<dyn OrderflowStore>,
    pub orders: Arc<dyn OrderGateway>,
    pub engine: Arc<WorkflowEngine>,
    pub catalog: Arc<StatusCatalog>,
}

impl AppState {
    pub fn new(
        config: ServiceConfig,
        store: Arc<dyn OrderflowStore>,
        orders: Arc<dyn OrderGateway>,
        engine: Arc<WorkflowEngine>,
        catalog: Arc<StatusCatalog>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            store,
            orders,
            engine,
            catalog,
        }
    }
}
