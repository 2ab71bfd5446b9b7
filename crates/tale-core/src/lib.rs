//! # tale-core
//!
//! Core types and traits for the tale-gate request router.
//!
//! This crate provides:
//! - `PackageCatalog` and `PackageTier` for the subscription tiers
//! - `OrderId`, `PaymentNotification`, and `EntitlementRecord` for the payment flow
//! - `PaymentGateway`, `TokenSource`, `EntitlementStore`, `StoryGenerator` seams
//! - `GateError` for typed error handling
//!
//! ## Example
//!
//! ```rust,ignore
//! use tale_core::{EntitlementRecord, PackageCatalog};
//!
//! let catalog = PackageCatalog::builtin();
//! let tier = catalog.find_by_amount(5000).unwrap();
//! let record = EntitlementRecord::grant(tier, chrono::Utc::now());
//!
//! store.write_entitlement("user42", &record).await?;
//! ```

pub mod error;
pub mod order;
pub mod package;
pub mod service;

// Re-exports for convenience
pub use error::{GateError, GateResult};
pub use order::{EntitlementRecord, GrossAmount, OrderId, PaymentNotification, TransactionStatus};
pub use package::{PackageCatalog, PackageTier};
pub use service::{
    AccessToken, BoxedEntitlementStore, BoxedPaymentGateway, BoxedStoryGenerator,
    BoxedTokenSource, EntitlementStore, PaymentGateway, StoryGenerator, TokenSource,
    TransactionRequest, TransactionToken,
};
