//! HTTP handlers for the webhook endpoint.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tracing::{error, warn};

use crate::application::handlers::{ProcessWebhookCommand, ProcessWebhookHandler};

/// Shared state for the HTTP layer.
#[derive(Clone)]
pub struct AppState {
    pub webhooks: Arc<ProcessWebhookHandler>,
}

/// POST /api/webhooks/stripe
///
/// The raw body must be passed to verification byte-for-byte; any
/// deserialization before signature checking would break the HMAC.
pub async fn handle_stripe_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let Some(signature) = headers
        .get("stripe-signature")
        .and_then(|value| value.to_str().ok())
    else {
        warn!("Webhook request without stripe-signature header");
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "Missing stripe-signature header"})),
        )
            .into_response();
    };

    let command = ProcessWebhookCommand {
        payload: body.to_vec(),
        signature: signature.to_string(),
    };

    match state.webhooks.handle(command).await {
        Ok(result) => (
            StatusCode::OK,
            Json(json!({"received": true, "result": result.as_str()})),
        )
            .into_response(),
        Err(err) => {
            let status = err.status_code();
            if status.is_server_error() {
                error!(error = %err, "Webhook processing failed; Stripe will redeliver");
            } else {
                warn!(error = %err, "Webhook rejected");
            }
            (
                status,
                Json(json!({"received": status == StatusCode::OK, "error": err.to_string()})),
            )
                .into_response()
        }
    }
}

/// GET /health
pub async fn health() -> impl IntoResponse {
    Json(json!({"status": "ok"}))
}
