//! Server setup and lifecycle management.

use crate::config::{ServiceConfig, StorageConfig};
use crate::error::{ServiceError, ServiceResult};
use crate::router::create_router;
use crate::seed;
use crate::state::AppState;
use orderflow_engine::{MemoryOrderGateway, OrderGateway, StatusCatalog, WorkflowEngine};
use orderflow_notify::{Notifier, NullNotifier, SiteInfo, WebhookNotifier};
use orderflow_storage::{InMemoryOrderflowStore, OrderflowStore, PostgresOrderflowStore};
use std::sync::Arc;
use tokio::net::TcpListener;

/// Orderflow daemon server.
pub struct Server {
    config: ServiceConfig,
    state: AppState,
}

impl Server {
    /// Wire storage, gateway, notifier, engine, and catalog per the
    /// configuration, and run first-run seeding.
    pub async fn new(config: ServiceConfig) -> ServiceResult<Self> {
        let store: Arc<dyn OrderflowStore> = match &config.storage {
            StorageConfig::Memory => {
                tracing::info!("using in-memory storage");
                Arc::new(InMemoryOrderflowStore::new())
            }
            StorageConfig::Postgres {
                url,
                max_connections,
                connect_timeout_secs,
            } => {
                tracing::info!("connecting to postgres storage");
                Arc::new(
                    PostgresOrderflowStore::connect_with_options(
                        url,
                        *max_connections,
                        *connect_timeout_secs,
                    )
                    .await?,
                )
            }
        };

        let memory_gateway = Arc::new(MemoryOrderGateway::new());
        if config.seed.demo_orders {
            seed::seed_demo_orders(&memory_gateway);
        }
        let orders: Arc<dyn OrderGateway> = memory_gateway;

        let site = SiteInfo::new(&config.site.name, &config.site.public_url);
        let notifier: Arc<dyn Notifier> = match &config.notifications.webhook_url {
            Some(url) if config.notifications.enabled => {
                tracing::info!(relay = %url, "notifications via webhook relay");
                Arc::new(WebhookNotifier::new(url.clone(), site))
            }
            _ => {
                tracing::info!("notifications disabled or no relay configured");
                Arc::new(NullNotifier)
            }
        };

        let engine = Arc::new(
            WorkflowEngine::new(store.clone(), orders.clone(), notifier)
                .with_notifications_enabled(config.notifications.enabled),
        );
        let catalog = Arc::new(StatusCatalog::new(
            store.clone(),
            orders.clone(),
            engine.clone(),
        ));

        if config.seed.default_statuses {
            seed::seed_default_statuses(store.as_ref()).await?;
        }

        if config.auth.admin_token.is_none() {
            tracing::warn!("no admin token configured; admin routes are open");
        }

        let state = AppState::new(config.clone(), store, orders, engine, catalog);
        Ok(Self { config, state })
    }

    /// State accessor for in-process testing.
    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Run the server until shutdown.
    pub async fn run(self) -> ServiceResult<()> {
        let addr = self.config.server.listen_addr;

        // Log workflow events for observability; listeners elsewhere can
        // subscribe through the engine the same way.
        let mut events = self.state.engine.subscribe();
        tokio::spawn(async move {
            while let Ok(event) = events.recv().await {
                tracing::debug!(?event, "workflow event");
            }
        });

        let app = create_router(self.state);
        let listener = TcpListener::bind(addr).await?;

        tracing::info!("orderflow daemon listening on {}", addr);

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| ServiceError::Server(e.to_string()))?;

        tracing::info!("orderflow daemon shutting down");
        Ok(())
    }
}

/// Graceful shutdown signal handler.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(%err, "failed to install Ctrl+C handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => tracing::error!(%err, "failed to install signal handler"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("received terminate signal, initiating graceful shutdown");
        }
    }
}
