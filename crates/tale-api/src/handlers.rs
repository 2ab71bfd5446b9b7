//! # Request Handlers
//!
//! Axum request handlers for the router.
//! Bodies are read as raw bytes and parsed here so malformed JSON gets the
//! same JSON error body as every other rejection.

use crate::state::AppState;
use axum::{
    body::Bytes,
    extract::State,
    http::{header, Method, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tale_core::{GateError, OrderId, PaymentNotification, TransactionRequest};
use tracing::{error, info, instrument};

// =============================================================================
// Request/Response Types
// =============================================================================

/// Create transaction request
#[derive(Debug, Deserialize)]
pub struct CreateTransactionRequest {
    /// Account id of the buyer
    pub uid: String,
    /// Package tier name
    pub paket: String,
}

/// Create transaction response
#[derive(Debug, Serialize)]
pub struct CreateTransactionResponse {
    #[serde(rename = "snapToken")]
    pub snap_token: String,
}

/// Webhook response
#[derive(Debug, Serialize)]
pub struct WebhookResponse {
    pub success: bool,
    /// Document store reply
    pub result: serde_json::Value,
}

/// Story request
#[derive(Debug, Deserialize)]
pub struct StoryRequest {
    #[serde(default)]
    pub prompt: Option<String>,
}

/// Story response
#[derive(Debug, Serialize)]
pub struct StoryResponse {
    pub reply: String,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: u16,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, code: u16) -> Self {
        Self {
            error: error.into(),
            code,
        }
    }
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn gate_error_to_response(err: GateError) -> ApiError {
    let code = err.status_code();
    let response = ErrorResponse::new(err.to_string(), code);
    (
        StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
        Json(response),
    )
}

fn parse_body<T: serde::de::DeserializeOwned>(body: &Bytes) -> Result<T, GateError> {
    serde_json::from_slice(body).map_err(|e| GateError::InvalidRequest(e.to_string()))
}

// =============================================================================
// Handlers
// =============================================================================

/// Open a payment transaction for a package
#[instrument(skip(state, body))]
pub async fn create_transaction(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<CreateTransactionResponse>, ApiError> {
    let request: CreateTransactionRequest = parse_body(&body).map_err(gate_error_to_response)?;

    let tier = state.catalog.get(&request.paket).ok_or_else(|| {
        gate_error_to_response(GateError::UnknownPackage(request.paket.clone()))
    })?;

    let order_id = OrderId::new(&request.uid, Utc::now()).map_err(gate_error_to_response)?;

    info!(
        "Creating transaction: order={}, package={}, amount={}",
        order_id, tier.name, tier.nominal
    );

    let transaction = TransactionRequest {
        order_id,
        user_id: request.uid,
        gross_amount: tier.nominal,
    };

    let token = state
        .gateway
        .create_transaction(&transaction)
        .await
        .map_err(|e| {
            error!("Failed to create transaction: {}", e);
            gate_error_to_response(e)
        })?;

    Ok(Json(CreateTransactionResponse {
        snap_token: token.token,
    }))
}

/// Handle a payment notification
#[instrument(skip(state, body))]
pub async fn midtrans_webhook(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<WebhookResponse>, ApiError> {
    let notification: PaymentNotification = parse_body(&body).map_err(|e| {
        error!("Unparseable notification: {}", e);
        gate_error_to_response(e)
    })?;

    info!(
        "Received notification: order={}, status={:?}",
        notification.order_id, notification.transaction_status
    );

    let result = state.updater.apply(&notification).await.map_err(|e| {
        error!("Notification rejected: {}", e);
        gate_error_to_response(e)
    })?;

    Ok(Json(WebhookResponse {
        success: true,
        result,
    }))
}

/// Generate a story. Every failure on this route is a 500.
#[instrument(skip(state, body))]
pub async fn generate_story(State(state): State<AppState>, body: Bytes) -> Response {
    let headers = [(header::CACHE_CONTROL, "no-store")];

    let prompt = match parse_body::<StoryRequest>(&body) {
        Ok(StoryRequest {
            prompt: Some(prompt),
        }) if !prompt.is_empty() => prompt,
        Ok(_) => return story_error("Prompt missing."),
        Err(e) => return story_error(&e.to_string()),
    };

    match state.story.generate(&prompt).await {
        Ok(reply) => (headers, Json(StoryResponse { reply })).into_response(),
        Err(e) => {
            error!("Story generation failed: {}", e);
            story_error(&e.to_string())
        }
    }
}

fn story_error(message: &str) -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse::new(message, 500)),
    )
        .into_response()
}

/// Preflight: empty 200, CORS headers are added by the router
pub async fn preflight() -> StatusCode {
    StatusCode::OK
}

/// Unknown method on a known path
pub async fn not_found() -> ApiError {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse::new("Not Found", 404)),
    )
}

/// Unknown path: preflight still succeeds
pub async fn fallback(method: Method) -> Response {
    if method == Method::OPTIONS {
        return preflight().await.into_response();
    }
    not_found().await.into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_response() {
        let err = ErrorResponse::new("Test error", 400);
        assert_eq!(err.error, "Test error");
        assert_eq!(err.code, 400);
    }

    #[test]
    fn test_gate_error_conversion() {
        let (status, _json) = gate_error_to_response(GateError::SignatureMismatch);
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, json) = gate_error_to_response(GateError::UnknownPackage("9999".into()));
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json.code, 400);
    }

    #[test]
    fn test_snap_token_field_name() {
        let body = serde_json::to_value(CreateTransactionResponse {
            snap_token: "abc".into(),
        })
        .unwrap();
        assert_eq!(body, serde_json::json!({ "snapToken": "abc" }));
    }
}
