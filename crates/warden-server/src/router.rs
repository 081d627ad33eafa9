//! Axum router construction for the command API.
//!
//! Assembles the four routes plus the uniform 404 fallback, wrapped in the
//! admission middleware. Layer order matters: requests pass the rate
//! limiter first, then auth, then the body-size precheck, and only then
//! reach route logic -- the order the admission pipeline documents.

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::{Router, middleware};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::admission;
use crate::handlers;
use crate::state::AppState;

/// Build the complete Axum router for the command API.
///
/// The router includes:
/// - `GET /health` -- liveness + queue depth
/// - `GET /state` -- colony snapshot
/// - `POST /event` -- trigger a colony event (cooldown-gated)
/// - `POST /message` -- post an in-game message
///
/// CORS is configured to allow any origin for development tooling. The
/// fallback is registered before the layers so unmatched paths still pass
/// admission.
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Hard cap on bytes actually read, backing up the declared-length
    // precheck for chunked or lying clients.
    let read_cap = state.config.security.max_request_body_bytes;

    Router::new()
        .route("/health", get(handlers::get_health))
        .route("/state", get(handlers::get_state))
        .route("/event", post(handlers::post_event))
        .route("/message", post(handlers::post_message))
        .fallback(handlers::not_found)
        .layer(DefaultBodyLimit::max(read_cap))
        .layer(middleware::from_fn_with_state(
            Arc::clone(&state),
            admission::body_size_limit,
        ))
        .layer(middleware::from_fn_with_state(
            Arc::clone(&state),
            admission::authenticate,
        ))
        .layer(middleware::from_fn_with_state(
            Arc::clone(&state),
            admission::rate_limit,
        ))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
