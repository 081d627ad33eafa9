//! Admission middleware: the ordered checks a request clears before it may
//! become a command.
//!
//! Layered outermost-in as rate limit, then auth, then declared-body-size
//! precheck. Each check answers rejected requests itself -- admission
//! failures never reach the bridge -- and all of them run before route
//! matching, so even unmatched paths are rate limited.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::{HeaderMap, header};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use tracing::debug;

use warden_types::ErrorCode;

use crate::error::ApiError;
use crate::state::AppState;

/// Bucket key for the global rate limit.
const GLOBAL_RATE_KEY: &str = "global";

/// Legacy auth header, kept for callers predating bearer tokens.
const LEGACY_TOKEN_HEADER: &str = "x-warden-token";

/// Global sliding-window rate limit. First gate on every request.
pub async fn rate_limit(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    let max = state.config.security.max_requests_per_minute;
    if !state.rate_limiter.try_enter(GLOBAL_RATE_KEY, max) {
        debug!(max_per_minute = max, "rate limiter rejected request");
        return ApiError::new(ErrorCode::RateLimited, "Too many requests").into_response();
    }
    next.run(request).await
}

/// LAN-mode token auth. A loopback bind never requires a token.
pub async fn authenticate(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    if state.config.lan_mode() && !is_authorized(&state, request.headers()) {
        return ApiError::new(ErrorCode::Unauthorized, "Missing or invalid token").into_response();
    }
    next.run(request).await
}

/// Exact-match token check: `Authorization: Bearer <token>` primary, the
/// legacy header as fallback. An empty configured secret authorizes
/// nobody.
fn is_authorized(state: &AppState, headers: &HeaderMap) -> bool {
    let secret = &state.config.network.auth_token;
    if secret.is_empty() {
        return false;
    }

    if let Some(auth) = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
    {
        if let Some(bearer) = auth.strip_prefix("Bearer ") {
            return bearer.trim() == secret;
        }
    }

    headers
        .get(LEGACY_TOKEN_HEADER)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|token| token == secret)
}

/// Declared-body-size precheck: reject before reading when the client
/// announces a body over the cap. Bodies are also hard-capped at read
/// time for clients that lie or stream chunked.
pub async fn body_size_limit(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    let cap = state.config.security.max_request_body_bytes;
    let declared = request
        .headers()
        .get(header::CONTENT_LENGTH)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse::<usize>().ok());

    if let Some(length) = declared {
        if length > cap {
            debug!(length, cap, "declared body exceeds cap");
            return ApiError::new(ErrorCode::InvalidRequest, "Request body too large")
                .into_response();
        }
    }
    next.run(request).await
}
