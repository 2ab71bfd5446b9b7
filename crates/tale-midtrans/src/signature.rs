//! # Notification Signature
//!
//! Midtrans signs each payment notification with
//! `SHA512(order_id || gross_amount || server_key)`, hex encoded in lowercase.
//! Fields are concatenated with no separator, and `gross_amount` is used in
//! the exact literal form it was sent in.

use sha2::{Digest, Sha512};
use tale_core::PaymentNotification;

/// Recomputes notification digests with the merchant's server key
#[derive(Clone)]
pub struct WebhookVerifier {
    server_key: String,
}

impl WebhookVerifier {
    pub fn new(server_key: impl Into<String>) -> Self {
        Self {
            server_key: server_key.into(),
        }
    }

    /// True iff the notification's `signature_key` matches the recomputed digest
    pub fn verify(&self, notification: &PaymentNotification) -> bool {
        verify_signature(
            &notification.order_id,
            notification.gross_amount.as_str(),
            &notification.signature_key,
            &self.server_key,
        )
    }
}

impl std::fmt::Debug for WebhookVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebhookVerifier")
            .field("server_key", &"<redacted>")
            .finish()
    }
}

/// Lowercase hex SHA-512 over `order_id`, `gross_amount`, `server_key`
pub fn expected_signature(order_id: &str, gross_amount: &str, server_key: &str) -> String {
    let mut hasher = Sha512::new();
    hasher.update(order_id.as_bytes());
    hasher.update(gross_amount.as_bytes());
    hasher.update(server_key.as_bytes());
    hex::encode(hasher.finalize())
}

/// Compare a supplied signature against the recomputed digest
pub fn verify_signature(
    order_id: &str,
    gross_amount: &str,
    supplied: &str,
    server_key: &str,
) -> bool {
    let expected = expected_signature(order_id, gross_amount, server_key);
    constant_time_compare(&expected, supplied)
}

fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.bytes()
        .zip(b.bytes())
        .fold(0, |acc, (x, y)| acc | (x ^ y))
        == 0
}
