//! HTTP adapter - axum routes and handlers for the webhook endpoint.

pub mod handlers;
pub mod routes;

pub use handlers::AppState;
pub use routes::router;
