//! # Entitlement Updater
//!
//! The only path that writes entitlement documents. A notification must
//! pass signature verification, resolve to a package tier, and name a user
//! before anything is sent to the store.
//!
//! Replays are not filtered: the same verified notification delivered twice
//! produces two identical writes.

use chrono::Utc;
use serde_json::Value;
use std::sync::Arc;
use tale_core::{
    BoxedEntitlementStore, EntitlementRecord, GateError, GateResult, PackageCatalog,
    PackageTier, PaymentNotification,
};
use tale_midtrans::WebhookVerifier;
use tracing::{info, instrument, warn};

/// Verification-gated entitlement writer
pub struct EntitlementUpdater {
    verifier: WebhookVerifier,
    catalog: Arc<PackageCatalog>,
    store: BoxedEntitlementStore,
}

impl EntitlementUpdater {
    pub fn new(
        verifier: WebhookVerifier,
        catalog: Arc<PackageCatalog>,
        store: BoxedEntitlementStore,
    ) -> Self {
        Self {
            verifier,
            catalog,
            store,
        }
    }

    /// Tier whose nominal equals the notification's gross amount
    pub fn resolve_tier(&self, notification: &PaymentNotification) -> GateResult<&PackageTier> {
        notification
            .gross_amount
            .whole_units()
            .and_then(|amount| self.catalog.find_by_amount(amount))
            .ok_or_else(|| {
                GateError::UnknownPackage(format!(
                    "no package priced {}",
                    notification.gross_amount.as_str()
                ))
            })
    }

    /// Verify, resolve, and write. Returns the store's reply.
    #[instrument(skip(self, notification), fields(order_id = %notification.order_id))]
    pub async fn apply(&self, notification: &PaymentNotification) -> GateResult<Value> {
        if !self.verifier.verify(notification) {
            warn!("Rejected notification with invalid signature");
            return Err(GateError::SignatureMismatch);
        }

        let tier = self.resolve_tier(notification)?;

        let user_id = notification.user_id().ok_or_else(|| {
            GateError::InvalidRequest(format!(
                "order_id carries no valid user id: {}",
                notification.order_id
            ))
        })?;

        // Status is logged, not enforced
        if !notification.transaction_status.is_paid() {
            warn!(
                "Granting entitlement for unpaid status {:?}",
                notification.transaction_status
            );
        }

        let record = EntitlementRecord::grant(tier, Utc::now());

        info!(
            "Granting {} to {} until {}",
            record.package, user_id, record.premium_until
        );

        self.store.write_entitlement(user_id, &record).await
    }
}
