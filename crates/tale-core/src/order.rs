//! # Orders & Notifications
//!
//! Order ids, payment notifications, and the entitlement record they grant.

use crate::error::{GateError, GateResult};
use crate::package::PackageTier;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Order identifier of the form `order-<uid>-<unix millis>`.
///
/// The user id is recovered positionally on the notification path and
/// becomes a document id, so it is limited to `[A-Za-z0-9_]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(String);

impl OrderId {
    pub const PREFIX: &'static str = "order";
    pub const DELIMITER: char = '-';

    /// Create an order id for `user_id` at `at`
    pub fn new(user_id: &str, at: DateTime<Utc>) -> GateResult<Self> {
        if user_id.is_empty() {
            return Err(GateError::InvalidRequest("uid is required".to_string()));
        }
        if !Self::is_valid_user_id(user_id) {
            return Err(GateError::InvalidRequest(format!(
                "uid may only contain letters, digits and '_': {:?}",
                user_id
            )));
        }

        Ok(Self(format!(
            "{}{}{}{}{}",
            Self::PREFIX,
            Self::DELIMITER,
            user_id,
            Self::DELIMITER,
            at.timestamp_millis()
        )))
    }

    /// Non-empty and ASCII alphanumeric or `_`
    pub fn is_valid_user_id(user_id: &str) -> bool {
        !user_id.is_empty()
            && user_id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_')
    }

    /// Extract the user id (second delimited segment) from a raw order id
    pub fn user_id_of(order_id: &str) -> Option<&str> {
        order_id
            .split(Self::DELIMITER)
            .nth(1)
            .filter(|uid| Self::is_valid_user_id(uid))
    }

    pub fn user_id(&self) -> Option<&str> {
        Self::user_id_of(&self.0)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Gross amount exactly as the gateway sent it.
///
/// The literal text feeds the signature digest, so it is kept verbatim;
/// the numeric value is only used for tier lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct GrossAmount(String);

impl GrossAmount {
    pub fn new(literal: impl Into<String>) -> Self {
        Self(literal.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Amount in whole units, if the literal is a whole number ("5000", "5000.00")
    pub fn whole_units(&self) -> Option<i64> {
        let value: f64 = self.0.trim().parse().ok()?;
        if !value.is_finite() || value.fract() != 0.0 || value.abs() > i64::MAX as f64 {
            return None;
        }
        Some(value as i64)
    }
}

impl<'de> Deserialize<'de> for GrossAmount {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            Number(serde_json::Number),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Text(s) => GrossAmount(s),
            Raw::Number(n) => GrossAmount(number_literal(&n)),
        })
    }
}

/// Render a JSON number the way the sender stringifies it: integral values
/// carry no fractional part.
fn number_literal(n: &serde_json::Number) -> String {
    if n.is_i64() || n.is_u64() {
        return n.to_string();
    }
    match n.as_f64() {
        Some(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", f as i64),
        Some(f) => f.to_string(),
        None => n.to_string(),
    }
}

/// Gateway transaction status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    Capture,
    Settlement,
    Pending,
    Deny,
    Cancel,
    Expire,
    Failure,
    Refund,
    #[default]
    #[serde(other)]
    Unknown,
}

impl TransactionStatus {
    /// Funds captured or settled
    pub fn is_paid(&self) -> bool {
        matches!(self, TransactionStatus::Capture | TransactionStatus::Settlement)
    }
}

/// Inbound payment notification
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentNotification {
    pub order_id: String,
    #[serde(default)]
    pub transaction_status: TransactionStatus,
    /// Missing signatures verify as mismatches, not parse errors
    #[serde(default)]
    pub signature_key: String,
    pub gross_amount: GrossAmount,
}

impl PaymentNotification {
    pub fn user_id(&self) -> Option<&str> {
        OrderId::user_id_of(&self.order_id)
    }
}

/// Remote entitlement document fields written after a verified payment
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntitlementRecord {
    pub is_premium: bool,
    pub package: String,
    pub quota_per_day: u32,
    pub premium_until: DateTime<Utc>,
}

impl EntitlementRecord {
    /// Entitlement for `tier`, starting at `now`
    pub fn grant(tier: &PackageTier, now: DateTime<Utc>) -> Self {
        Self {
            is_premium: true,
            package: tier.name.clone(),
            quota_per_day: tier.quota_per_day,
            premium_until: now + Duration::seconds(tier.duration_secs()),
        }
    }
}
