//! # Entitlement Store
//!
//! Field-masked PATCH of `users/{uid}` through the Firestore REST API.
//! Only the four entitlement fields are named in the update mask, so any
//! other field on the document is left untouched.

use crate::cache::CachedTokenSource;
use crate::config::FirestoreConfig;
use crate::minter::TokenMinter;
use async_trait::async_trait;
use chrono::SecondsFormat;
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use std::sync::Arc;
use tale_core::{
    BoxedTokenSource, EntitlementRecord, EntitlementStore, GateError, GateResult, OrderId,
};
use tracing::{error, info, instrument, warn};

/// Fields written on every entitlement update
pub const ENTITLEMENT_FIELDS: [&str; 4] = ["isPremium", "package", "quotaPerDay", "premiumUntil"];

/// Firestore-backed [`EntitlementStore`]
pub struct FirestoreEntitlementStore {
    config: FirestoreConfig,
    tokens: BoxedTokenSource,
    client: Client,
}

impl FirestoreEntitlementStore {
    pub fn new(config: FirestoreConfig, tokens: BoxedTokenSource, client: Client) -> Self {
        Self {
            config,
            tokens,
            client,
        }
    }

    /// Store with a cached token source minting from the config's service account
    pub fn with_cached_tokens(config: FirestoreConfig) -> GateResult<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| GateError::Configuration(format!("HTTP client: {}", e)))?;

        let minter = TokenMinter::from_config(&config, client.clone());
        let tokens: BoxedTokenSource = Arc::new(CachedTokenSource::new(minter));

        Ok(Self::new(config, tokens, client))
    }
}

/// Firestore typed-value encoding of an entitlement record
pub fn document_fields(record: &EntitlementRecord) -> Value {
    json!({
        "fields": {
            "isPremium": { "booleanValue": record.is_premium },
            "package": { "stringValue": record.package },
            "quotaPerDay": { "integerValue": record.quota_per_day.to_string() },
            "premiumUntil": {
                "timestampValue": record.premium_until.to_rfc3339_opts(SecondsFormat::Millis, true)
            }
        }
    })
}

fn update_mask() -> Vec<(&'static str, &'static str)> {
    ENTITLEMENT_FIELDS
        .iter()
        .map(|field| ("updateMask.fieldPaths", *field))
        .collect()
}

#[async_trait]
impl EntitlementStore for FirestoreEntitlementStore {
    #[instrument(skip(self, record), fields(package = %record.package))]
    async fn write_entitlement(&self, user_id: &str, record: &EntitlementRecord) -> GateResult<Value> {
        if !OrderId::is_valid_user_id(user_id) {
            return Err(GateError::InvalidRequest(format!(
                "Invalid document id: {:?}",
                user_id
            )));
        }

        let url = self.config.user_document_url(user_id)?;
        let token = self.tokens.access_token().await?;

        let response = self
            .client
            .patch(url)
            .query(&update_mask())
            .header("Authorization", token.bearer_header())
            .json(&document_fields(record))
            .send()
            .await
            .map_err(|e| GateError::Network(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| GateError::Network(e.to_string()))?;

        if status == StatusCode::UNAUTHORIZED {
            warn!("Firestore rejected access token, invalidating cache");
            self.tokens.invalidate().await;
        }

        if !status.is_success() {
            error!("Firestore error: status={}, body={}", status, body);

            let message = serde_json::from_str::<Value>(&body)
                .ok()
                .and_then(|v| {
                    v.pointer("/error/message")
                        .and_then(|m| m.as_str())
                        .map(String::from)
                })
                .unwrap_or_else(|| format!("HTTP {}: {}", status, body));

            return Err(GateError::upstream("firestore", message));
        }

        let result: Value = serde_json::from_str(&body).map_err(|e| {
            GateError::upstream("firestore", format!("Malformed document reply: {}", e))
        })?;

        info!(
            "Entitlement written: user={}, until={}",
            user_id, record.premium_until
        );

        Ok(result)
    }
}
