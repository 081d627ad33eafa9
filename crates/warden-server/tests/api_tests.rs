//! Integration tests for the command API.
//!
//! Tests drive the Axum `Router` directly via `tower::ServiceExt` without
//! starting a TCP server. Routes that need a live consumer get a real
//! executor spawned on its own thread, exactly as the engine binary wires
//! it -- so these tests exercise the full path: admission, enqueue, the
//! cross-thread hop, execution, and result collection.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::Value;
use tower::ServiceExt;

use warden_core::colony::ColonySim;
use warden_core::{
    CommandDispatcher, CooldownGate, Executor, ExecutorControl, RateLimiter, WardenConfig,
};
use warden_server::state::AppState;
use warden_server::build_router;

/// A running front end plus the executor thread behind it.
struct TestHarness {
    state: Arc<AppState>,
    router: Router,
    control: Arc<ExecutorControl>,
    executor: Option<std::thread::JoinHandle<()>>,
}

impl TestHarness {
    /// Front end and executor over the given simulation and config.
    fn with_config(sim: ColonySim, config: WardenConfig) -> Self {
        let dispatcher = Arc::new(CommandDispatcher::new());
        let state = Arc::new(AppState::new(
            config,
            Arc::clone(&dispatcher),
            RateLimiter::new(),
            CooldownGate::new(),
        ));
        let router = build_router(Arc::clone(&state));

        let control = Arc::new(ExecutorControl::new(10));
        let executor = Executor::new(dispatcher, sim, "0.1.0-test")
            .spawn(Arc::clone(&control))
            .unwrap();

        Self {
            state,
            router,
            control,
            executor: Some(executor),
        }
    }

    /// Front end and executor with default (loopback) config.
    fn new(sim: ColonySim) -> Self {
        Self::with_config(sim, WardenConfig::normalized_default())
    }

    /// Front end with no executor behind it -- the "stalled simulation"
    /// scenario. Uses a short result-wait bound to keep the test fast.
    fn stalled(config_yaml: &str) -> (Arc<AppState>, Router) {
        let config = WardenConfig::parse(config_yaml).unwrap();
        let state = Arc::new(AppState::new(
            config,
            Arc::new(CommandDispatcher::new()),
            RateLimiter::new(),
            CooldownGate::new(),
        ));
        let router = build_router(Arc::clone(&state));
        (state, router)
    }

    async fn get(&self, uri: &str) -> (StatusCode, Value) {
        let response = self
            .router
            .clone()
            .oneshot(Request::get(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        (status, body_to_json(response.into_body()).await)
    }

    async fn post(&self, uri: &str, body: &str) -> (StatusCode, Value) {
        let response = self
            .router
            .clone()
            .oneshot(
                Request::post(uri)
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_owned()))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        (status, body_to_json(response.into_body()).await)
    }
}

impl Drop for TestHarness {
    fn drop(&mut self) {
        self.control.request_stop();
        if let Some(handle) = self.executor.take() {
            let _ = handle.join();
        }
    }
}

async fn body_to_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    }
}

/// Config for a LAN bind with a configured token.
fn lan_config(token: &str) -> WardenConfig {
    WardenConfig::parse(&format!(
        "network:\n  bind_address: 0.0.0.0\n  allow_lan: true\n  auth_token: {token}\n"
    ))
    .unwrap()
}

// =========================================================================
// Health
// =========================================================================

#[tokio::test]
async fn health_reports_ok_with_empty_queue() {
    let harness = TestHarness::new(ColonySim::with_demo_colony());

    let (status, json) = harness.get("/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
    assert_eq!(json["game_running"], true);
    assert_eq!(json["colony_loaded"], true);
    assert_eq!(json["queue_depth"], 0);
    assert_eq!(json["mod_version"], "0.1.0-test");
    assert!(json["uptime_seconds"].is_u64());
}

#[tokio::test]
async fn health_reflects_an_unloaded_colony() {
    let harness = TestHarness::new(ColonySim::empty());

    let (status, json) = harness.get("/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["colony_loaded"], false);
}

// =========================================================================
// State
// =========================================================================

#[tokio::test]
async fn state_without_a_colony_is_409() {
    let harness = TestHarness::new(ColonySim::empty());

    let (status, json) = harness.get("/state").await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["success"], false);
    assert_eq!(json["error"], "NO_COLONY_LOADED");
}

#[tokio::test]
async fn state_returns_the_colony_sections() {
    let harness = TestHarness::new(ColonySim::with_demo_colony());

    let (status, json) = harness.get("/state").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["colony"]["name"], "New Hope");
    assert_eq!(json["colonists"].as_array().map(Vec::len), Some(3));
    assert_eq!(json["resources"]["silver"], 800);
    assert_eq!(json["threats"]["toxic_fallout"], false);
}

#[tokio::test]
async fn state_query_toggles_empty_the_sections() {
    let harness = TestHarness::new(ColonySim::with_demo_colony());

    let (status, json) = harness
        .get("/state?include_colonists=false&include_resources=0")
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["colonists"], serde_json::json!([]));
    assert_eq!(json["resources"], serde_json::json!({}));
}

// =========================================================================
// Events
// =========================================================================

#[tokio::test]
async fn event_triggers_then_hits_the_cooldown() {
    let harness = TestHarness::new(ColonySim::with_demo_colony());

    let (status, json) = harness
        .post("/event", r#"{"event_type":"raid","points":1000}"#)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["success"], true);
    assert!(json["event_id"].is_string());

    // Identical trigger inside the 30s window is refused at admission.
    let (status, json) = harness
        .post("/event", r#"{"event_type":"raid","points":1000}"#)
        .await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(json["error"], "COOLDOWN_ACTIVE");
}

#[tokio::test]
async fn distinct_events_cool_down_independently() {
    let harness = TestHarness::new(ColonySim::with_demo_colony());

    let (status, _) = harness
        .post("/event", r#"{"event_type":"raid"}"#)
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, json) = harness
        .post("/event", r#"{"event_type":"cold_snap"}"#)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["success"], true);
}

#[tokio::test]
async fn unknown_event_type_is_400() {
    let harness = TestHarness::new(ColonySim::with_demo_colony());

    let (status, json) = harness
        .post("/event", r#"{"event_type":"meteor_storm"}"#)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "INVALID_EVENT");
}

#[tokio::test]
async fn missing_event_type_is_400() {
    let harness = TestHarness::new(ColonySim::with_demo_colony());

    let (status, json) = harness.post("/event", r#"{"points":200}"#).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "INVALID_REQUEST");
}

#[tokio::test]
async fn malformed_event_body_is_400() {
    let harness = TestHarness::new(ColonySim::with_demo_colony());

    let (status, json) = harness.post("/event", "not json at all").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "INVALID_REQUEST");
}

// =========================================================================
// Messages
// =========================================================================

#[tokio::test]
async fn message_posts_into_the_colony_log() {
    let harness = TestHarness::new(ColonySim::with_demo_colony());

    let (status, json) = harness
        .post("/message", r#"{"text":"Supply drop inbound","type":"positive"}"#)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["success"], true);
}

#[tokio::test]
async fn empty_message_text_is_rejected_before_the_bridge() {
    let harness = TestHarness::new(ColonySim::with_demo_colony());

    let (status, json) = harness.post("/message", r#"{"text":"  "}"#).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "INVALID_REQUEST");

    // Admission failure: nothing was ever enqueued or left pending.
    assert_eq!(harness.state.dispatcher.queue_depth(), 0);
    assert_eq!(harness.state.dispatcher.pending_len(), 0);
}

// =========================================================================
// Stalled executor
// =========================================================================

#[tokio::test]
async fn stalled_executor_times_out_with_503_and_entry_is_reaped_later() {
    let (state, router) = TestHarness::stalled("engine:\n  command_timeout_ms: 100\n");

    let response = router
        .oneshot(
            Request::post("/message")
                .header("content-type", "application/json")
                .body(Body::from(r#"{"text":"anyone there?"}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["error"], "MOD_NOT_READY");

    // The abandoned command was cancelled by the front end and still sits
    // queued and pending.
    assert_eq!(state.dispatcher.queue_depth(), 1);
    assert_eq!(state.dispatcher.pending_len(), 1);

    // The executor resumes: the cancelled command is skipped with no
    // result published.
    let mut executor = Executor::new(
        Arc::clone(&state.dispatcher),
        ColonySim::with_demo_colony(),
        "0.1.0-test",
    );
    let report = executor.tick();
    assert_eq!(report.skipped, 1);
    assert_eq!(report.executed, 0);
    assert_eq!(state.dispatcher.queue_depth(), 0);

    // Once the entry crosses the staleness window the reaper absorbs it.
    std::thread::sleep(Duration::from_millis(10));
    assert_eq!(state.dispatcher.cleanup_stale(Duration::from_millis(1)), 1);
    assert_eq!(state.dispatcher.pending_len(), 0);
}

// =========================================================================
// Auth (LAN mode)
// =========================================================================

#[tokio::test]
async fn lan_mode_requires_a_token() {
    let harness = TestHarness::with_config(ColonySim::with_demo_colony(), lan_config("sekrit"));

    let (status, json) = harness.get("/health").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["error"], "UNAUTHORIZED");
}

#[tokio::test]
async fn lan_mode_rejects_a_wrong_token() {
    let harness = TestHarness::with_config(ColonySim::with_demo_colony(), lan_config("sekrit"));

    let response = harness
        .router
        .clone()
        .oneshot(
            Request::get("/health")
                .header("authorization", "Bearer wrong")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn lan_mode_accepts_the_bearer_token() {
    let harness = TestHarness::with_config(ColonySim::with_demo_colony(), lan_config("sekrit"));

    let response = harness
        .router
        .clone()
        .oneshot(
            Request::get("/health")
                .header("authorization", "Bearer sekrit")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn lan_mode_accepts_the_legacy_header() {
    let harness = TestHarness::with_config(ColonySim::with_demo_colony(), lan_config("sekrit"));

    let response = harness
        .router
        .clone()
        .oneshot(
            Request::get("/health")
                .header("x-warden-token", "sekrit")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn loopback_bind_needs_no_token() {
    let harness = TestHarness::new(ColonySim::with_demo_colony());
    let (status, _) = harness.get("/health").await;
    assert_eq!(status, StatusCode::OK);
}

// =========================================================================
// Rate limiting
// =========================================================================

#[tokio::test]
async fn requests_over_the_window_budget_are_rejected() {
    let config =
        WardenConfig::parse("security:\n  max_requests_per_minute: 10\n").unwrap();
    let harness = TestHarness::with_config(ColonySim::with_demo_colony(), config);

    for _ in 0..10 {
        let (status, _) = harness.get("/health").await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, json) = harness.get("/health").await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(json["error"], "RATE_LIMITED");
}

// =========================================================================
// Body size
// =========================================================================

#[tokio::test]
async fn oversized_declared_body_is_rejected_before_reading() {
    let harness = TestHarness::new(ColonySim::with_demo_colony());

    let response = harness
        .router
        .clone()
        .oneshot(
            Request::post("/event")
                .header("content-type", "application/json")
                .header("content-length", "1000000")
                .body(Body::from(r#"{"event_type":"raid"}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["error"], "INVALID_REQUEST");
    assert_eq!(json["message"], "Request body too large");
}

// =========================================================================
// Routing
// =========================================================================

#[tokio::test]
async fn unknown_routes_get_the_uniform_404_shape() {
    let harness = TestHarness::new(ColonySim::with_demo_colony());

    let (status, json) = harness.get("/api/teleport").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["success"], false);
    assert_eq!(json["error"], "NOT_FOUND");
}

#[tokio::test]
async fn wrong_method_on_a_route_is_not_matched() {
    let harness = TestHarness::new(ColonySim::with_demo_colony());

    let response = harness
        .router
        .clone()
        .oneshot(Request::get("/event").body(Body::empty()).unwrap())
        .await
        .unwrap();
    // Axum answers a known path with the wrong method as 405.
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}
