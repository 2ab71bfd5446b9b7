//! # Application State
//!
//! Shared state for the Axum application.
//! Everything is read-only after startup: configuration, the package table,
//! and the outbound clients.

use crate::entitlement::EntitlementUpdater;
use crate::story::{ChatCompletionClient, StoryConfig};
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use tale_core::{
    BoxedPaymentGateway, BoxedStoryGenerator, GateError, GateResult, PackageCatalog,
};
use tale_firestore::{FirestoreConfig, FirestoreEntitlementStore};
use tale_midtrans::{MidtransConfig, SnapClient, WebhookVerifier};

/// Application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Environment (development, staging, production)
    pub environment: String,
    /// Optional package table override
    pub packages_path: Option<String>,
}

impl AppConfig {
    /// Load from environment variables
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            host: lookup("HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
            port: lookup("PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),
            environment: lookup("ENVIRONMENT").unwrap_or_else(|| "development".to_string()),
            packages_path: lookup("PACKAGES_CONFIG"),
        }
    }

    /// Get the socket address to bind to
    pub fn socket_addr(&self) -> GateResult<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| GateError::Configuration(format!("Invalid HOST/PORT: {}", e)))
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Application config
    pub config: AppConfig,
    /// Package tiers
    pub catalog: Arc<PackageCatalog>,
    /// Transaction creation
    pub gateway: BoxedPaymentGateway,
    /// Verification-gated entitlement writes
    pub updater: Arc<EntitlementUpdater>,
    /// Story generation
    pub story: BoxedStoryGenerator,
}

impl AppState {
    /// Build state from the environment; any missing secret fails here
    pub fn from_env() -> GateResult<Self> {
        let config = AppConfig::from_env();
        let catalog = Arc::new(load_package_catalog(config.packages_path.as_deref())?);

        let midtrans = MidtransConfig::from_env()?;
        let firestore = FirestoreConfig::from_env()?;
        let story = StoryConfig::from_env()?;

        let verifier = WebhookVerifier::new(midtrans.server_key.clone());
        let gateway = Arc::new(SnapClient::new(midtrans)?);
        let store = Arc::new(FirestoreEntitlementStore::with_cached_tokens(firestore)?);
        let story = Arc::new(ChatCompletionClient::new(story)?);

        let updater = EntitlementUpdater::new(verifier, catalog.clone(), store);

        Ok(Self::from_parts(config, catalog, gateway, updater, story))
    }

    /// Assemble state from already-built parts
    pub fn from_parts(
        config: AppConfig,
        catalog: Arc<PackageCatalog>,
        gateway: BoxedPaymentGateway,
        updater: EntitlementUpdater,
        story: BoxedStoryGenerator,
    ) -> Self {
        Self {
            config,
            catalog,
            gateway,
            updater: Arc::new(updater),
            story,
        }
    }
}

/// Load the package table from an explicit path, `config/packages.toml`, or built-ins
pub fn load_package_catalog(explicit: Option<&str>) -> GateResult<PackageCatalog> {
    if let Some(path) = explicit {
        let content = std::fs::read_to_string(path)
            .map_err(|e| GateError::Configuration(format!("Cannot read {}: {}", path, e)))?;
        let catalog = PackageCatalog::from_toml_str(&content)?;
        tracing::info!("Loaded {} packages from {}", catalog.len(), path);
        return Ok(catalog);
    }

    let config_paths = [
        "config/packages.toml",
        "../config/packages.toml",
        "../../config/packages.toml",
    ];

    for path in config_paths {
        if Path::new(path).is_file() {
            let content = std::fs::read_to_string(path)
                .map_err(|e| GateError::Configuration(format!("Cannot read {}: {}", path, e)))?;
            let catalog = PackageCatalog::from_toml_str(&content)?;
            tracing::info!("Loaded {} packages from {}", catalog.len(), path);
            return Ok(catalog);
        }
    }

    tracing::info!("No package table found, using built-in packages");
    Ok(PackageCatalog::builtin())
}
