//! Configuration for the orderflow daemon.

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

/// Main service configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Storage configuration
    #[serde(default)]
    pub storage: StorageConfig,

    /// Admin authentication
    #[serde(default)]
    pub auth: AuthConfig,

    /// Site identity used in notifications and tracking links
    #[serde(default)]
    pub site: SiteConfig,

    /// Customer tracking surface
    #[serde(default)]
    pub tracking: TrackingConfig,

    /// Customer notifications
    #[serde(default)]
    pub notifications: NotificationConfig,

    /// First-run seeding
    #[serde(default)]
    pub seed: SeedConfig,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            storage: StorageConfig::default(),
            auth: AuthConfig::default(),
            site: SiteConfig::default(),
            tracking: TrackingConfig::default(),
            notifications: NotificationConfig::default(),
            seed: SeedConfig::default(),
        }
    }
}

/// Server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Listen address
    pub listen_addr: SocketAddr,

    /// Enable CORS
    #[serde(default = "default_true")]
    pub enable_cors: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            enable_cors: true,
        }
    }
}

fn default_listen_addr() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 8080))
}

/// Storage configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StorageConfig {
    /// In-memory storage (for development/testing)
    Memory,

    /// PostgreSQL storage
    Postgres {
        /// Connection URL
        url: String,

        /// Maximum connections in pool
        #[serde(default = "default_pool_size")]
        max_connections: u32,

        /// Connection timeout in seconds
        #[serde(default = "default_connection_timeout")]
        connect_timeout_secs: u64,
    },
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig::Memory
    }
}

/// Admin authentication configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Bearer token required on admin routes. When unset, admin routes are
    /// open (development profiles only).
    #[serde(default)]
    pub admin_token: Option<String>,
}

/// Site identity configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    #[serde(default = "default_site_name")]
    pub name: String,

    /// Public base URL used for tracking links
    #[serde(default = "default_public_url")]
    pub public_url: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            name: default_site_name(),
            public_url: default_public_url(),
        }
    }
}

/// Customer tracking configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackingConfig {
    /// Enable the customer tracking surface
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Include the status timeline in tracking views
    #[serde(default = "default_true")]
    pub timeline: bool,

    /// Heading shown on the tracking page
    #[serde(default = "default_tracking_title")]
    pub page_title: String,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            timeline: true,
            page_title: default_tracking_title(),
        }
    }
}

/// Customer notification configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationConfig {
    /// Master switch for outbound notifications
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Mail relay endpoint receiving rendered messages. When unset,
    /// notifications are rendered nowhere and silently dropped.
    #[serde(default)]
    pub webhook_url: Option<String>,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            webhook_url: None,
        }
    }
}

/// First-run seeding configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedConfig {
    /// Insert the default custom statuses when the catalog is empty
    #[serde(default = "default_true")]
    pub default_statuses: bool,

    /// Seed demo orders into the in-memory gateway (memory storage only)
    #[serde(default)]
    pub demo_orders: bool,
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self {
            default_statuses: true,
            demo_orders: false,
        }
    }
}

// Default value helpers
fn default_true() -> bool {
    true
}

fn default_pool_size() -> u32 {
    10
}

fn default_connection_timeout() -> u64 {
    5
}

fn default_site_name() -> String {
    "Orderflow".to_string()
}

fn default_public_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_tracking_title() -> String {
    "Order Tracking".to_string()
}

impl ServiceConfig {
    /// Load configuration: defaults, then an optional file, then
    /// `ORDERFLOW_*` environment variables.
    pub fn load(path: Option<&str>) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder();

        builder = builder.add_source(config::Config::try_from(&ServiceConfig::default())?);

        if let Some(path) = path {
            builder = builder.add_source(config::File::with_name(path).required(false));
        }

        builder = builder.add_source(
            config::Environment::with_prefix("ORDERFLOW")
                .separator("_")
                .try_parsing(true),
        );

        builder.build()?.try_deserialize()
    }
}
