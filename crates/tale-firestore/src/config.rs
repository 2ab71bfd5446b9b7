//! # Firestore Configuration
//!
//! Project id, service account, and endpoints for the document store.

use crate::credential::ServiceAccountCredential;
use reqwest::Url;
use std::env;
use tale_core::{GateError, GateResult};

pub const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
pub const FIRESTORE_API_URL: &str = "https://firestore.googleapis.com";
pub const DATASTORE_SCOPE: &str = "https://www.googleapis.com/auth/datastore";

/// Firestore access configuration
#[derive(Debug, Clone)]
pub struct FirestoreConfig {
    /// GCP project hosting the database
    pub project_id: String,

    /// Service account used to mint access tokens
    pub credential: ServiceAccountCredential,

    /// OAuth token endpoint; also the assertion audience
    pub token_url: String,

    /// Firestore REST base URL (for testing/mocking)
    pub api_base_url: String,

    /// Scope requested for access tokens
    pub scope: String,

    /// Collection holding one document per user
    pub users_collection: String,
}

impl FirestoreConfig {
    /// Load configuration from environment variables.
    ///
    /// Required env vars:
    /// - `FIREBASE_PROJECT_ID`
    /// - `FIREBASE_CLIENT_EMAIL`
    /// - `FIREBASE_PRIVATE_KEY` (one line, `\n` escaped, header optional)
    pub fn from_env() -> Result<Self, GateError> {
        dotenvy::dotenv().ok();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, GateError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| GateError::Configuration(format!("{} not set", key)))
        };

        let project_id = required("FIREBASE_PROJECT_ID")?;
        let client_email = required("FIREBASE_CLIENT_EMAIL")?;
        let private_key = required("FIREBASE_PRIVATE_KEY")?;

        let credential =
            ServiceAccountCredential::from_env_value(client_email.trim(), &private_key)?;

        Ok(Self::new(project_id.trim(), credential))
    }

    /// Create config with explicit values (for testing)
    pub fn new(project_id: impl Into<String>, credential: ServiceAccountCredential) -> Self {
        Self {
            project_id: project_id.into(),
            credential,
            token_url: TOKEN_URL.to_string(),
            api_base_url: FIRESTORE_API_URL.to_string(),
            scope: DATASTORE_SCOPE.to_string(),
            users_collection: "users".to_string(),
        }
    }

    /// REST URL of a user's document; every segment is percent-encoded
    pub fn user_document_url(&self, user_id: &str) -> GateResult<Url> {
        let mut url = Url::parse(&self.api_base_url).map_err(|e| {
            GateError::Configuration(format!("Invalid Firestore base URL: {}", e))
        })?;

        url.path_segments_mut()
            .map_err(|_| {
                GateError::Configuration(format!(
                    "Firestore base URL cannot have a path: {}",
                    self.api_base_url
                ))
            })?
            .pop_if_empty()
            .extend([
                "v1",
                "projects",
                self.project_id.as_str(),
                "databases",
                "(default)",
                "documents",
                self.users_collection.as_str(),
                user_id,
            ]);

        Ok(url)
    }

    /// Builder: set custom token endpoint (for testing)
    pub fn with_token_url(mut self, url: impl Into<String>) -> Self {
        self.token_url = url.into();
        self
    }

    /// Builder: set custom Firestore base URL (for testing)
    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }
}
