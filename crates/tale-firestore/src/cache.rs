//! # Token Cache
//!
//! Reuses minted access tokens until shortly before their declared expiry.
//! Entries are keyed by scope and dropped when the store rejects a token.

use crate::minter::TokenMinter;
use async_trait::async_trait;
use chrono::{Duration, Utc};
use std::collections::HashMap;
use tale_core::{AccessToken, GateResult, TokenSource};
use tokio::sync::Mutex;
use tracing::debug;

/// Refresh this long before the server-declared expiry
const DEFAULT_REFRESH_SKEW_SECS: i64 = 60;

/// Expiry-aware cache in front of a [`TokenMinter`]
#[derive(Debug)]
pub struct CachedTokenSource {
    minter: TokenMinter,
    tokens: Mutex<HashMap<String, AccessToken>>,
    refresh_skew: Duration,
}

impl CachedTokenSource {
    pub fn new(minter: TokenMinter) -> Self {
        Self {
            minter,
            tokens: Mutex::new(HashMap::new()),
            refresh_skew: Duration::seconds(DEFAULT_REFRESH_SKEW_SECS),
        }
    }

    /// Builder: set how early tokens are refreshed
    pub fn with_refresh_skew(mut self, skew: Duration) -> Self {
        self.refresh_skew = skew;
        self
    }
}

#[async_trait]
impl TokenSource for CachedTokenSource {
    async fn access_token(&self) -> GateResult<AccessToken> {
        // Held across the mint so concurrent callers share one exchange
        let mut tokens = self.tokens.lock().await;
        let scope = self.minter.scope();

        if let Some(token) = tokens.get(scope) {
            if !token.expires_within(self.refresh_skew, Utc::now()) {
                return Ok(token.clone());
            }
            debug!("Cached token for {} is expiring, re-minting", scope);
        }

        let token = self.minter.mint().await?;
        tokens.insert(scope.to_string(), token.clone());
        Ok(token)
    }

    async fn invalidate(&self) {
        let mut tokens = self.tokens.lock().await;
        if tokens.remove(self.minter.scope()).is_some() {
            debug!("Invalidated cached token for {}", self.minter.scope());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DATASTORE_SCOPE;
    use crate::credential::ServiceAccountCredential;
    use reqwest::Client;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const TEST_KEY_PEM: &str = include_str!("../tests/fixtures/service_account.pem");

    async fn token_server(expires_in: i64, expected_calls: u64) -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "ya29.cached",
                "expires_in": expires_in
            })))
            .expect(expected_calls)
            .mount(&server)
            .await;
        server
    }

    fn cache_for(server: &MockServer) -> CachedTokenSource {
        let credential =
            ServiceAccountCredential::from_pem("svc@example.com", TEST_KEY_PEM).unwrap();
        CachedTokenSource::new(TokenMinter::new(
            credential,
            DATASTORE_SCOPE,
            format!("{}/token", server.uri()),
            Client::new(),
        ))
    }

    #[tokio::test]
    async fn test_reuses_valid_token() {
        let server = token_server(3600, 1).await;
        let cache = cache_for(&server);

        let first = cache.access_token().await.unwrap();
        let second = cache.access_token().await.unwrap();

        assert_eq!(first.secret(), second.secret());
    }

    #[tokio::test]
    async fn test_remints_after_invalidate() {
        let server = token_server(3600, 2).await;
        let cache = cache_for(&server);

        cache.access_token().await.unwrap();
        cache.invalidate().await;
        cache.access_token().await.unwrap();
    }

    #[tokio::test]
    async fn test_remints_token_inside_refresh_window() {
        // 30s lifetime is already inside the 60s skew
        let server = token_server(30, 2).await;
        let cache = cache_for(&server);

        cache.access_token().await.unwrap();
        cache.access_token().await.unwrap();
    }
}
