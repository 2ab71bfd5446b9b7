//! # Token Minter
//!
//! Exchanges a signed service-account assertion for an OAuth access token
//! (`urn:ietf:params:oauth:grant-type:jwt-bearer`). Every call mints and
//! exchanges a new assertion; reuse is the job of [`crate::CachedTokenSource`].

use crate::assertion::{AssertionClaims, AuthAssertion};
use crate::config::FirestoreConfig;
use crate::credential::ServiceAccountCredential;
use async_trait::async_trait;
use chrono::{Duration, Utc};
use reqwest::Client;
use serde::Deserialize;
use tale_core::{AccessToken, GateError, GateResult, TokenSource};
use tracing::{debug, error, instrument};

pub const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

/// Lifetime assumed when the endpoint omits `expires_in`
const DEFAULT_EXPIRES_IN_SECS: i64 = 3600;

/// Mints access tokens for one service account and scope
#[derive(Debug, Clone)]
pub struct TokenMinter {
    credential: ServiceAccountCredential,
    scope: String,
    token_url: String,
    client: Client,
}

impl TokenMinter {
    pub fn new(
        credential: ServiceAccountCredential,
        scope: impl Into<String>,
        token_url: impl Into<String>,
        client: Client,
    ) -> Self {
        Self {
            credential,
            scope: scope.into(),
            token_url: token_url.into(),
            client,
        }
    }

    pub fn from_config(config: &FirestoreConfig, client: Client) -> Self {
        Self::new(
            config.credential.clone(),
            config.scope.clone(),
            config.token_url.clone(),
            client,
        )
    }

    pub fn scope(&self) -> &str {
        &self.scope
    }

    /// Build and sign a fresh assertion (audience = token endpoint)
    pub fn signed_assertion(&self) -> GateResult<String> {
        let claims = AssertionClaims::new(
            self.credential.client_email(),
            self.scope.as_str(),
            self.token_url.as_str(),
            Utc::now(),
        );
        AuthAssertion::new(claims).sign(&self.credential)
    }

    /// Mint a new assertion and exchange it for an access token
    #[instrument(skip(self), fields(scope = %self.scope))]
    pub async fn mint(&self) -> GateResult<AccessToken> {
        let assertion = self.signed_assertion()?;

        let response = self
            .client
            .post(&self.token_url)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await
            .map_err(|e| GateError::Auth(format!("Token endpoint unreachable: {}", e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| GateError::Auth(format!("Token endpoint read failed: {}", e)))?;

        if !status.is_success() {
            error!("Token endpoint error: status={}, body={}", status, body);

            let detail = serde_json::from_str::<TokenErrorResponse>(&body)
                .map(|e| match e.error_description {
                    Some(description) => format!("{}: {}", e.error, description),
                    None => e.error,
                })
                .unwrap_or(body);

            return Err(GateError::Auth(format!("HTTP {}: {}", status, detail)));
        }

        let token: TokenResponse = serde_json::from_str(&body)
            .map_err(|e| GateError::Auth(format!("Malformed token response: {}", e)))?;

        if token.access_token.is_empty() {
            return Err(GateError::Auth("Token response has empty access_token".to_string()));
        }

        let expires_in = token.expires_in.unwrap_or(DEFAULT_EXPIRES_IN_SECS);
        debug!("Minted access token, expires_in={}s", expires_in);

        let expires_at = Duration::try_seconds(expires_in)
            .and_then(|lifetime| Utc::now().checked_add_signed(lifetime))
            .ok_or_else(|| {
                GateError::Auth(format!("Token response has invalid expires_in: {}", expires_in))
            })?;

        Ok(AccessToken::new(token.access_token, expires_at))
    }
}

#[async_trait]
impl TokenSource for TokenMinter {
    async fn access_token(&self) -> GateResult<AccessToken> {
        self.mint().await
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct TokenErrorResponse {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}
