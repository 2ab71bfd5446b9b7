//! # Midtrans Configuration
//!
//! Configuration management for the Midtrans integration.
//! The server key is loaded from the environment once at startup.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use std::env;
use tale_core::GateError;

pub const PRODUCTION_SNAP_URL: &str = "https://app.midtrans.com";
pub const SANDBOX_SNAP_URL: &str = "https://app.sandbox.midtrans.com";

/// Midtrans API configuration
#[derive(Clone)]
pub struct MidtransConfig {
    /// Server key (Mid-server-... or SB-Mid-server-...)
    pub server_key: String,

    /// Snap API base URL (for testing/mocking)
    pub snap_base_url: String,

    /// Production or sandbox account
    pub is_production: bool,
}

impl MidtransConfig {
    /// Load configuration from environment variables.
    ///
    /// Required env vars:
    /// - `MIDTRANS_SERVER_KEY`
    ///
    /// Optional:
    /// - `MIDTRANS_IS_PRODUCTION` (default `true`)
    pub fn from_env() -> Result<Self, GateError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, GateError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let server_key = lookup("MIDTRANS_SERVER_KEY")
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .ok_or_else(|| {
                GateError::Configuration("MIDTRANS_SERVER_KEY not set".to_string())
            })?;

        let is_production = match lookup("MIDTRANS_IS_PRODUCTION").as_deref().map(str::trim) {
            None | Some("") => true,
            Some("true") | Some("1") => true,
            Some("false") | Some("0") => false,
            Some(other) => {
                return Err(GateError::Configuration(format!(
                    "MIDTRANS_IS_PRODUCTION must be true or false, got '{}'",
                    other
                )))
            }
        };

        let config = Self::new(server_key).with_production(is_production);

        if config.is_production && config.is_sandbox_key() {
            tracing::warn!("MIDTRANS_SERVER_KEY looks like a sandbox key but production mode is on");
        }

        Ok(config)
    }

    /// Create config with explicit values (for testing)
    pub fn new(server_key: impl Into<String>) -> Self {
        Self {
            server_key: server_key.into(),
            snap_base_url: PRODUCTION_SNAP_URL.to_string(),
            is_production: true,
        }
    }

    /// Check if the server key belongs to a sandbox account
    pub fn is_sandbox_key(&self) -> bool {
        self.server_key.starts_with("SB-")
    }

    /// Get authorization header value (Basic, server key as user, empty password)
    pub fn auth_header(&self) -> String {
        format!("Basic {}", STANDARD.encode(format!("{}:", self.server_key)))
    }

    /// Snap transaction endpoint
    pub fn transactions_url(&self) -> String {
        format!("{}/snap/v1/transactions", self.snap_base_url)
    }

    /// Builder: switch between production and sandbox hosts
    pub fn with_production(mut self, is_production: bool) -> Self {
        self.is_production = is_production;
        self.snap_base_url = if is_production {
            PRODUCTION_SNAP_URL
        } else {
            SANDBOX_SNAP_URL
        }
        .to_string();
        self
    }

    /// Builder: set custom Snap base URL (for testing)
    pub fn with_snap_base_url(mut self, url: impl Into<String>) -> Self {
        self.snap_base_url = url.into();
        self
    }
}

impl std::fmt::Debug for MidtransConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MidtransConfig")
            .field("server_key", &"<redacted>")
            .field("snap_base_url", &self.snap_base_url)
            .field("is_production", &self.is_production)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_auth_header() {
        let config = MidtransConfig::new("SB-Mid-server-TEST");
        // base64("SB-Mid-server-TEST:")
        assert_eq!(config.auth_header(), "Basic U0ItTWlkLXNlcnZlci1URVNUOg==");
    }

    #[test]
    fn test_missing_server_key() {
        let result = MidtransConfig::from_lookup(lookup(&[]));
        assert!(matches!(result, Err(GateError::Configuration(_))));

        let result = MidtransConfig::from_lookup(lookup(&[("MIDTRANS_SERVER_KEY", "  ")]));
        assert!(result.is_err());
    }

    #[test]
    fn test_sandbox_switch() {
        let config = MidtransConfig::from_lookup(lookup(&[
            ("MIDTRANS_SERVER_KEY", "SB-Mid-server-TEST"),
            ("MIDTRANS_IS_PRODUCTION", "false"),
        ]))
        .unwrap();

        assert!(!config.is_production);
        assert!(config.is_sandbox_key());
        assert_eq!(
            config.transactions_url(),
            "https://app.sandbox.midtrans.com/snap/v1/transactions"
        );
    }

    #[test]
    fn test_invalid_production_flag() {
        let result = MidtransConfig::from_lookup(lookup(&[
            ("MIDTRANS_SERVER_KEY", "Mid-server-TEST"),
            ("MIDTRANS_IS_PRODUCTION", "maybe"),
        ]));
        assert!(result.is_err());
    }

    #[test]
    fn test_debug_redacts_key() {
        let config = MidtransConfig::new("Mid-server-SECRET");
        assert!(!format!("{:?}", config).contains("SECRET"));
    }
}
