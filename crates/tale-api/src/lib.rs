//! # tale-api
//!
//! HTTP API layer for tale-gate.
//!
//! This crate provides:
//! - Axum-based HTTP server with an explicit route table
//! - Payment notification handling gated on signature verification
//! - Story generation relay
//!
//! ## Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | POST | `/create-transaction` | Open a Snap transaction for a package |
//! | POST | `/midtrans-webhook` | Payment notification |
//! | POST | `/` | Generate a story |
//! | OPTIONS | `*` | CORS preflight |

pub mod entitlement;
pub mod handlers;
pub mod routes;
pub mod state;
pub mod story;

#[cfg(test)]
mod testing;

pub use entitlement::EntitlementUpdater;
pub use routes::create_router;
pub use state::{AppConfig, AppState};
