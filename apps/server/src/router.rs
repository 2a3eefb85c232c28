//! Axum router — maps the receiver's URL paths to handlers.

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use crate::handlers::{healthz, receive_batch};
use crate::state::{AppState, SharedState};

/// Build the receiver router.
pub fn build_router(state: AppState) -> Router {
    let shared: SharedState = Arc::new(state);

    Router::new()
        .route("/artlist", post(receive_batch))
        .route("/healthz", get(healthz))
        .layer(TraceLayer::new_for_http())
        .with_state(shared)
}
