//! Route definitions for the payments service.

use axum::routing::{get, post};
use axum::Router;

use super::handlers::{self, AppState};

/// Builds the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/api/webhooks/stripe", post(handlers::handle_stripe_webhook))
        .with_state(state)
}
