//! # tale-gate
//!
//! Request router between the storefront, Midtrans, Firestore and the
//! story model.
//!
//! ## Usage
//!
//! ```bash
//! # Set environment variables
//! export MIDTRANS_SERVER_KEY=Mid-server-...
//! export FIREBASE_PROJECT_ID=...
//! export FIREBASE_CLIENT_EMAIL=...@....iam.gserviceaccount.com
//! export FIREBASE_PRIVATE_KEY='MIIEv...\n...'
//! export GROQ_API_KEY=gsk_...
//!
//! # Run the server
//! tale-gate
//! ```

use tale_api::{routes, state::AppState};
use tracing::{info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(Level::INFO.into())
                .from_env_lossy(),
        )
        .init();

    // Fails fast on any missing secret
    let state = AppState::from_env()?;

    let addr = state.config.socket_addr()?;
    let is_prod = state.config.is_production();

    info!("Environment: {}", state.config.environment);
    info!("Packages: {:?}", state.catalog.names());
    info!("Payment gateway: {}", state.gateway.provider_name());

    let app = routes::create_router(state);

    info!("tale-gate {} listening on http://{}", env!("CARGO_PKG_VERSION"), addr);

    if !is_prod {
        info!("Transaction: POST http://{}/create-transaction", addr);
        info!("Webhook: POST http://{}/midtrans-webhook", addr);
        info!("Story: POST http://{}/", addr);
    }

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
