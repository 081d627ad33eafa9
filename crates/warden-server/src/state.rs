//! Shared application state for the HTTP front end.
//!
//! [`AppState`] carries the constructor-injected services every request
//! touches: the validated configuration, the command bridge, and the two
//! admission primitives. Created once at startup and torn down on
//! shutdown; there is no ambient global state.

use chrono::{DateTime, Utc};

use std::sync::Arc;

use warden_core::{CommandDispatcher, CooldownGate, RateLimiter, WardenConfig};

/// Shared state for the Axum application.
///
/// Wrapped in [`Arc`] and injected via Axum's `State` extractor. The rate
/// limiter and cooldown gate each guard their own lock, independent of the
/// bridge's -- an admission check never contends with the executor.
#[derive(Debug)]
pub struct AppState {
    /// Validated, normalized configuration.
    pub config: WardenConfig,
    /// The command bridge shared with the executor thread.
    pub dispatcher: Arc<CommandDispatcher>,
    /// Global sliding-window rate limiter.
    pub rate_limiter: RateLimiter,
    /// Per-event cooldown gate.
    pub cooldowns: CooldownGate,
    /// Wall-clock time the front end came up, for uptime reporting.
    started_at: DateTime<Utc>,
}

impl AppState {
    /// Assemble the front end's state from its injected services.
    pub fn new(
        config: WardenConfig,
        dispatcher: Arc<CommandDispatcher>,
        rate_limiter: RateLimiter,
        cooldowns: CooldownGate,
    ) -> Self {
        Self {
            config,
            dispatcher,
            rate_limiter,
            cooldowns,
            started_at: Utc::now(),
        }
    }

    /// Whole seconds since the front end started.
    pub fn uptime_seconds(&self) -> u64 {
        let elapsed = Utc::now()
            .signed_duration_since(self.started_at)
            .num_seconds();
        // `num_seconds` can be negative if clocks are weird; treat as 0.
        u64::try_from(elapsed.max(0)).unwrap_or(u64::MAX)
    }
}
