//! # tale-firestore
//!
//! Talks to Firestore as a service account, without an SDK.
//!
//! ```text
//! ServiceAccountCredential ──► AuthAssertion (RS256 JWT)
//!                                   │ jwt-bearer grant
//!                                   ▼
//!                    TokenMinter ──► oauth2 token endpoint
//!                         ▲
//!                CachedTokenSource (per scope, 401 ⇒ invalidate)
//!                         ▲
//!            FirestoreEntitlementStore ──► PATCH users/{uid}?updateMask...
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use tale_firestore::{FirestoreConfig, FirestoreEntitlementStore};
//!
//! let store = FirestoreEntitlementStore::with_cached_tokens(FirestoreConfig::from_env()?)?;
//! store.write_entitlement("user42", &record).await?;
//! ```

pub mod assertion;
pub mod cache;
pub mod config;
pub mod credential;
pub mod minter;
pub mod store;

// Re-exports
pub use assertion::{AssertionClaims, AssertionHeader, AuthAssertion};
pub use cache::CachedTokenSource;
pub use config::FirestoreConfig;
pub use credential::{reconstruct_pem, ServiceAccountCredential};
pub use minter::TokenMinter;
pub use store::FirestoreEntitlementStore;
