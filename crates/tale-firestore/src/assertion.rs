//! # Service Account Assertion
//!
//! A self-signed JWT presented to the OAuth token endpoint:
//!
//! ```text
//! base64url(header) "." base64url(claims) "." base64url(RS256 signature)
//! ```
//!
//! Segments are unpadded base64url of the compact JSON encoding.

use crate::credential::ServiceAccountCredential;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Utc};
use jsonwebtoken::Algorithm;
use serde::{Deserialize, Serialize};
use tale_core::{GateError, GateResult};

/// Assertion lifetime requested from the token endpoint
pub const ASSERTION_LIFETIME_SECS: i64 = 3600;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssertionHeader {
    pub alg: String,
    pub typ: String,
}

impl Default for AssertionHeader {
    fn default() -> Self {
        Self {
            alg: "RS256".to_string(),
            typ: "JWT".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssertionClaims {
    /// Service account identity
    pub iss: String,
    /// Space-delimited OAuth scopes
    pub scope: String,
    /// Token endpoint URL
    pub aud: String,
    pub iat: i64,
    pub exp: i64,
}

impl AssertionClaims {
    pub fn new(
        issuer: impl Into<String>,
        scope: impl Into<String>,
        audience: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        let iat = now.timestamp();
        Self {
            iss: issuer.into(),
            scope: scope.into(),
            aud: audience.into(),
            iat,
            exp: iat + ASSERTION_LIFETIME_SECS,
        }
    }
}

/// Unsigned assertion; built fresh for every token request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthAssertion {
    pub header: AssertionHeader,
    pub claims: AssertionClaims,
}

impl AuthAssertion {
    pub fn new(claims: AssertionClaims) -> Self {
        Self {
            header: AssertionHeader::default(),
            claims,
        }
    }

    /// `base64url(header) "." base64url(claims)`
    pub fn signing_input(&self) -> GateResult<String> {
        Ok(format!(
            "{}.{}",
            base64url_json(&self.header)?,
            base64url_json(&self.claims)?
        ))
    }

    /// Sign with the credential's key and return the compact assertion
    pub fn sign(&self, credential: &ServiceAccountCredential) -> GateResult<String> {
        let signing_input = self.signing_input()?;

        // crypto::sign already returns unpadded base64url
        let signature = jsonwebtoken::crypto::sign(
            signing_input.as_bytes(),
            credential.signing_key(),
            Algorithm::RS256,
        )
        .map_err(|e| GateError::Auth(format!("Failed to sign assertion: {}", e)))?;

        Ok(format!("{}.{}", signing_input, signature))
    }
}

/// Unpadded base64url of the value's JSON encoding
pub fn base64url_json<T: Serialize>(value: &T) -> GateResult<String> {
    let json = serde_json::to_vec(value).map_err(|e| GateError::Serialization(e.to_string()))?;
    Ok(URL_SAFE_NO_PAD.encode(json))
}
