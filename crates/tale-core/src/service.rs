//! # Service Traits
//!
//! Seams between the HTTP layer and the outbound providers.
//!
//! ```text
//!            ┌──────────────────────────────┐
//!            │           tale-api           │
//!            └──────────────┬───────────────┘
//!      ┌──────────────┬─────┴────────┬──────────────┐
//!      ▼              ▼              ▼              ▼
//! PaymentGateway  TokenSource  EntitlementStore  StoryGenerator
//!  (midtrans)     (firestore)    (firestore)     (chat API)
//! ```

use crate::error::GateResult;
use crate::order::{EntitlementRecord, OrderId};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;

/// Request to open a payment transaction for one package
#[derive(Debug, Clone)]
pub struct TransactionRequest {
    pub order_id: OrderId,
    pub user_id: String,
    /// Whole currency units
    pub gross_amount: i64,
}

/// Transaction opened with the gateway
#[derive(Debug, Clone)]
pub struct TransactionToken {
    /// Token the client-side payment widget is opened with
    pub token: String,
    pub redirect_url: Option<String>,
}

/// Payment gateway client
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Open a transaction and return the client token.
    async fn create_transaction(&self, request: &TransactionRequest) -> GateResult<TransactionToken>;

    /// Provider name (for logging).
    fn provider_name(&self) -> &'static str;
}

/// Opaque bearer credential with a server-declared expiry
#[derive(Clone)]
pub struct AccessToken {
    value: String,
    expires_at: DateTime<Utc>,
}

impl AccessToken {
    pub fn new(value: impl Into<String>, expires_at: DateTime<Utc>) -> Self {
        Self {
            value: value.into(),
            expires_at,
        }
    }

    pub fn secret(&self) -> &str {
        &self.value
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    /// True once fewer than `skew` remain before expiry
    pub fn expires_within(&self, skew: Duration, now: DateTime<Utc>) -> bool {
        now + skew >= self.expires_at
    }

    /// `Authorization` header value
    pub fn bearer_header(&self) -> String {
        format!("Bearer {}", self.value)
    }
}

impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessToken")
            .field("value", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Source of bearer tokens for the document store
#[async_trait]
pub trait TokenSource: Send + Sync {
    /// Return a token valid for at least a short while.
    async fn access_token(&self) -> GateResult<AccessToken>;

    /// Drop any cached token (called when the store rejects it).
    async fn invalidate(&self) {}
}

/// Writer for remote entitlement documents
#[async_trait]
pub trait EntitlementStore: Send + Sync {
    /// Partially update the user's document with the four entitlement fields.
    /// Returns the store's reply body.
    async fn write_entitlement(
        &self,
        user_id: &str,
        record: &EntitlementRecord,
    ) -> GateResult<serde_json::Value>;
}

/// Text generation client
#[async_trait]
pub trait StoryGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> GateResult<String>;
}

pub type BoxedPaymentGateway = Arc<dyn PaymentGateway>;
pub type BoxedTokenSource = Arc<dyn TokenSource>;
pub type BoxedEntitlementStore = Arc<dyn EntitlementStore>;
pub type BoxedStoryGenerator = Arc<dyn StoryGenerator>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_access_token_expiry_window() {
        let now = Utc::now();
        let token = AccessToken::new("ya29.test", now + Duration::seconds(3600));

        assert!(!token.expires_within(Duration::seconds(60), now));
        assert!(token.expires_within(Duration::seconds(60), now + Duration::seconds(3550)));
    }

    #[test]
    fn test_access_token_debug_redacts() {
        let token = AccessToken::new("ya29.secret", Utc::now());
        let rendered = format!("{:?}", token);

        assert!(!rendered.contains("ya29.secret"));
        assert_eq!(token.bearer_header(), "Bearer ya29.secret");
    }
}
