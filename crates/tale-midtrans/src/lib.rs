//! # tale-midtrans
//!
//! Midtrans payment gateway client for tale-gate.
//!
//! 1. **SnapClient** - opens Snap transactions (implements `PaymentGateway`)
//! 2. **WebhookVerifier** - authenticates HTTP notifications by their SHA-512 digest
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use tale_midtrans::{MidtransConfig, SnapClient, WebhookVerifier};
//!
//! let config = MidtransConfig::from_env()?;
//! let verifier = WebhookVerifier::new(config.server_key.clone());
//! let snap = SnapClient::new(config)?;
//!
//! if !verifier.verify(&notification) {
//!     return Err(GateError::SignatureMismatch);
//! }
//! ```

pub mod config;
pub mod signature;
pub mod snap;

// Re-exports
pub use config::MidtransConfig;
pub use signature::{expected_signature, verify_signature, WebhookVerifier};
pub use snap::SnapClient;
