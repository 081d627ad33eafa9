//! Route handlers: argument extraction, cooldown gating, and dispatch over
//! the bridge.
//!
//! Extraction here is deliberately narrow -- a handful of known fields per
//! route, not a general query language. Anything missing or malformed is an
//! admission-layer error answered on the spot; only fully-formed typed
//! commands are enqueued.

use std::sync::Arc;
use std::time::Duration;

use axum::Json;
use axum::body::Bytes;
use axum::extract::{Query, State};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use warden_types::{ColonyEvent, Command, CommandPayload, ErrorCode, EventId, MessageStyle};

use crate::error::ApiError;
use crate::state::AppState;

/// Minimum spacing between triggers of the same event type, independent of
/// the global rate limit.
pub const EVENT_COOLDOWN: Duration = Duration::from_secs(30);

/// Default threat-point budget when the caller supplies none.
const DEFAULT_EVENT_POINTS: i64 = 500;

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

/// Query parameters for `GET /state`.
#[derive(Debug, Deserialize)]
pub struct StateQuery {
    /// Bool-ish toggle for the colonist list (default true).
    pub include_colonists: Option<String>,
    /// Bool-ish toggle for the resource map (default true).
    pub include_resources: Option<String>,
}

/// Body fields for `POST /event`.
#[derive(Debug, Deserialize)]
struct EventRequest {
    event_type: Option<String>,
    points: Option<i64>,
}

/// Body fields for `POST /message`.
#[derive(Debug, Deserialize)]
struct MessageRequest {
    text: Option<String>,
    #[serde(rename = "type")]
    style: Option<String>,
}

/// Query booleans accept `1`/`true` (any case); anything else is false,
/// and an absent parameter takes the default.
fn query_bool(raw: Option<&str>, default: bool) -> bool {
    match raw {
        None | Some("") => default,
        Some(value) => value == "1" || value.eq_ignore_ascii_case("true"),
    }
}

fn parse_body<T: for<'de> Deserialize<'de>>(body: &Bytes) -> Result<T, ApiError> {
    serde_json::from_slice(body)
        .map_err(|_| ApiError::new(ErrorCode::InvalidRequest, "Request body must be valid JSON"))
}

// ---------------------------------------------------------------------------
// GET /health
// ---------------------------------------------------------------------------

/// Liveness probe. Answered by the executor so the report reflects the
/// simulation thread actually draining commands.
pub async fn get_health(State(state): State<Arc<AppState>>) -> Result<Json<Value>, ApiError> {
    let payload = CommandPayload::Health {
        uptime_seconds: state.uptime_seconds(),
    };
    dispatch(&state, payload).await
}

// ---------------------------------------------------------------------------
// GET /state
// ---------------------------------------------------------------------------

/// Colony snapshot with optional section toggles.
pub async fn get_state(
    State(state): State<Arc<AppState>>,
    Query(query): Query<StateQuery>,
) -> Result<Json<Value>, ApiError> {
    let payload = CommandPayload::State {
        include_colonists: query_bool(query.include_colonists.as_deref(), true),
        include_resources: query_bool(query.include_resources.as_deref(), true),
    };
    dispatch(&state, payload).await
}

// ---------------------------------------------------------------------------
// POST /event
// ---------------------------------------------------------------------------

/// Trigger a colony event.
///
/// Passes the per-event cooldown gate (keyed by the normalized event name)
/// before anything is enqueued -- repeated triggering of the same
/// high-impact action is refused even when overall traffic is low.
pub async fn post_event(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<Value>, ApiError> {
    let request: EventRequest = parse_body(&body)?;

    let raw_type = request.event_type.unwrap_or_default();
    if raw_type.trim().is_empty() {
        return Err(ApiError::new(
            ErrorCode::InvalidRequest,
            "event_type is required",
        ));
    }

    let event = ColonyEvent::from_wire(&raw_type).ok_or_else(|| {
        ApiError::new(
            ErrorCode::InvalidEvent,
            format!("Unknown event_type '{}'", raw_type.trim()),
        )
    })?;

    let cooldown_key = format!("event:{}", event.as_str());
    if let Err(retry_after) = state.cooldowns.try_enter(&cooldown_key, EVENT_COOLDOWN) {
        debug!(event = %event, retry_after, "cooldown gate rejected event");
        return Err(ApiError::new(
            ErrorCode::CooldownActive,
            format!("Event cooling down, retry in {retry_after}s"),
        ));
    }

    let points = u32::try_from(request.points.unwrap_or(DEFAULT_EVENT_POINTS).max(0))
        .unwrap_or(u32::MAX);

    let payload = CommandPayload::Event {
        event,
        points,
        event_id: EventId::new(),
    };
    dispatch(&state, payload).await
}

// ---------------------------------------------------------------------------
// POST /message
// ---------------------------------------------------------------------------

/// Post a message into the colony's in-game log.
pub async fn post_message(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<Value>, ApiError> {
    let request: MessageRequest = parse_body(&body)?;

    let text = request.text.unwrap_or_default();
    if text.trim().is_empty() {
        return Err(ApiError::new(ErrorCode::InvalidRequest, "text is required"));
    }

    let style = MessageStyle::from_wire(request.style.as_deref().unwrap_or_default());

    let payload = CommandPayload::Message { text, style };
    dispatch(&state, payload).await
}

// ---------------------------------------------------------------------------
// Fallback
// ---------------------------------------------------------------------------

/// Uniform 404 for unmatched routes. Sits inside the admission layers, so
/// unknown paths are still rate limited and authed first.
pub async fn not_found() -> ApiError {
    ApiError::new(ErrorCode::NotFound, "No such route")
}

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

/// Carry one admitted payload across the bridge and translate the outcome.
///
/// The three bridge-availability failures -- refused enqueue, wait
/// timeout, empty payload -- all collapse to `MOD_NOT_READY`: the caller
/// cannot tell "busy" from "crashed", and retries identically either way.
/// On timeout the command is cancelled so a stalled executor skips it on
/// resume instead of doing abandoned work.
async fn dispatch(state: &AppState, payload: CommandPayload) -> Result<Json<Value>, ApiError> {
    let command = Command::new(payload);
    let kind = command.kind();
    let cancel = command.cancel.clone();

    let request_id = state.dispatcher.enqueue(command).map_err(|e| {
        warn!(kind = kind.as_str(), error = %e, "bridge refused command");
        ApiError::new(ErrorCode::ModNotReady, "Command bridge unavailable")
    })?;

    let timeout = state.config.engine.command_timeout();
    match state.dispatcher.wait_for_result(request_id, timeout).await {
        Some(Ok(data)) if data.is_null() => {
            warn!(request_id = %request_id, "command result carried no payload");
            Err(ApiError::new(
                ErrorCode::ModNotReady,
                "No command result produced",
            ))
        }
        Some(Ok(data)) => Ok(Json(data)),
        Some(Err(code)) => Err(ApiError::from_code(code)),
        None => {
            cancel.cancel();
            debug!(
                request_id = %request_id,
                kind = kind.as_str(),
                timeout_ms = %timeout.as_millis(),
                "result wait timed out"
            );
            Err(ApiError::new(
                ErrorCode::ModNotReady,
                "Main-thread executor not ready",
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_bool_accepts_one_and_true() {
        assert!(query_bool(Some("1"), false));
        assert!(query_bool(Some("TRUE"), false));
        assert!(!query_bool(Some("yes"), true));
        assert!(!query_bool(Some("0"), true));
        assert!(query_bool(None, true));
        assert!(!query_bool(None, false));
        assert!(query_bool(Some(""), true));
    }
}
