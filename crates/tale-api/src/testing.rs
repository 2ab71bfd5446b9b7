//! In-memory service fakes shared by the handler and updater tests.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;
use tale_core::{
    EntitlementRecord, EntitlementStore, GateError, GateResult, GrossAmount, PackageCatalog,
    PaymentGateway, PaymentNotification, StoryGenerator, TransactionRequest, TransactionStatus,
    TransactionToken,
};
use tale_midtrans::WebhookVerifier;
use tokio::sync::Mutex;

use crate::entitlement::EntitlementUpdater;
use crate::state::{AppConfig, AppState};

pub const SERVER_KEY: &str = "SB-Mid-server-TEST";
// sha512("order-user42-1700000000000" + "5000" + SERVER_KEY)
pub const SIG_5000: &str = "a5749eceaa4b4c553614c9ee9b3a9a12a6b95a37bd7eea0725bed71f241fcb7c6554bc06cf93f77639bb43d9c2f2d9b6d18c9071fc834e7aba3e06228049039b";

pub fn notification(order_id: &str, gross_amount: &str, signature: &str) -> PaymentNotification {
    PaymentNotification {
        order_id: order_id.to_string(),
        transaction_status: TransactionStatus::Settlement,
        signature_key: signature.to_string(),
        gross_amount: GrossAmount::new(gross_amount),
    }
}

#[derive(Default)]
pub struct RecordingStore {
    writes: Mutex<Vec<(String, EntitlementRecord)>>,
}

impl RecordingStore {
    pub async fn writes(&self) -> Vec<(String, EntitlementRecord)> {
        self.writes.lock().await.clone()
    }
}

#[async_trait]
impl EntitlementStore for RecordingStore {
    async fn write_entitlement(&self, user_id: &str, record: &EntitlementRecord) -> GateResult<Value> {
        self.writes
            .lock()
            .await
            .push((user_id.to_string(), record.clone()));
        Ok(json!({ "name": format!("users/{}", user_id) }))
    }
}

#[derive(Default)]
pub struct RecordingGateway {
    requests: Mutex<Vec<TransactionRequest>>,
}

impl RecordingGateway {
    pub async fn requests(&self) -> Vec<TransactionRequest> {
        self.requests.lock().await.clone()
    }
}

#[async_trait]
impl PaymentGateway for RecordingGateway {
    async fn create_transaction(&self, request: &TransactionRequest) -> GateResult<TransactionToken> {
        self.requests.lock().await.push(request.clone());
        Ok(TransactionToken {
            token: "snap-token-123".to_string(),
            redirect_url: None,
        })
    }

    fn provider_name(&self) -> &'static str {
        "recording"
    }
}

/// Replies with the prompt, or fails when told to
pub struct EchoStory {
    pub fail: bool,
}

#[async_trait]
impl StoryGenerator for EchoStory {
    async fn generate(&self, prompt: &str) -> GateResult<String> {
        if self.fail {
            return Err(GateError::upstream("groq", "model overloaded"));
        }
        Ok(format!("Once upon a time: {}", prompt))
    }
}

pub struct Fakes {
    pub store: Arc<RecordingStore>,
    pub gateway: Arc<RecordingGateway>,
}

/// App state wired to in-memory fakes
pub fn test_state(story_fails: bool) -> (AppState, Fakes) {
    let store = Arc::new(RecordingStore::default());
    let gateway = Arc::new(RecordingGateway::default());
    let catalog = Arc::new(PackageCatalog::builtin());

    let updater = EntitlementUpdater::new(
        WebhookVerifier::new(SERVER_KEY),
        catalog.clone(),
        store.clone(),
    );

    let state = AppState::from_parts(
        AppConfig::default(),
        catalog,
        gateway.clone(),
        updater,
        Arc::new(EchoStory { fail: story_fails }),
    );

    (state, Fakes { store, gateway })
}
