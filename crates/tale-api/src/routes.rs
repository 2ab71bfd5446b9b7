//! # Routes
//!
//! Route table for the router. Every response, errors and 404s included,
//! carries permissive CORS headers; `OPTIONS` is answered on any path.

use crate::handlers;
use crate::state::AppState;
use axum::{
    extract::Request,
    http::{header, HeaderValue},
    middleware::{self, Next},
    response::Response,
    routing::{post, MethodRouter},
    Router,
};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

pub const ALLOW_METHODS: &str = "GET, POST, OPTIONS";
pub const ALLOW_HEADERS: &str = "Content-Type, Authorization";

/// Create the main application router
///
/// Routes:
///   - POST /create-transaction - Open a Snap transaction for a package
///   - POST /midtrans-webhook   - Payment notification
///   - POST /                   - Generate a story
///   - OPTIONS *                - Empty 200
///
/// Anything else is a 404.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/create-transaction", endpoint(post(handlers::create_transaction)))
        .route("/midtrans-webhook", endpoint(post(handlers::midtrans_webhook)))
        .route("/", endpoint(post(handlers::generate_story)))
        .fallback(handlers::fallback)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(middleware::from_fn(cors_headers)),
        )
        .with_state(state)
}

/// Add preflight and 404-for-other-methods to a route
fn endpoint(route: MethodRouter<AppState>) -> MethodRouter<AppState> {
    route
        .options(handlers::preflight)
        .fallback(handlers::not_found)
}

async fn cors_headers(request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;

    let headers = response.headers_mut();
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static(ALLOW_METHODS),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static(ALLOW_HEADERS),
    );

    response
}
