//! # Gate Error Types
//!
//! Typed error handling for the tale-gate router.
//! Every core operation returns `Result<T, GateError>`.

use thiserror::Error;

/// Core error type for all router operations
#[derive(Debug, Error)]
pub enum GateError {
    /// Missing or malformed secret, key, or config file
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Token mint or token exchange failure
    #[error("Auth error: {0}")]
    Auth(String),

    /// Webhook digest did not match the supplied signature
    #[error("Invalid signature")]
    SignatureMismatch,

    /// Gross amount or tier name maps to no configured package
    #[error("Unknown package: {0}")]
    UnknownPackage(String),

    /// Malformed inbound request body
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Non-2xx or malformed reply from an external API
    #[error("Upstream error [{service}]: {message}")]
    Upstream { service: String, message: String },

    /// Transport failure talking to an external API
    #[error("Network error: {0}")]
    Network(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl GateError {
    /// Shorthand for an upstream failure from `service`
    pub fn upstream(service: impl Into<String>, message: impl Into<String>) -> Self {
        GateError::Upstream {
            service: service.into(),
            message: message.into(),
        }
    }

    /// Returns the HTTP status code appropriate for this error
    pub fn status_code(&self) -> u16 {
        match self {
            GateError::Configuration(_) => 500,
            GateError::Auth(_) => 500,
            GateError::SignatureMismatch => 403,
            GateError::UnknownPackage(_) => 400,
            GateError::InvalidRequest(_) => 400,
            GateError::Upstream { .. } => 500,
            GateError::Network(_) => 500,
            GateError::Serialization(_) => 500,
        }
    }
}

/// Result type alias for router operations
pub type GateResult<T> = Result<T, GateError>;
