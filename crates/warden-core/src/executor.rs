//! Bounded per-tick command draining on the simulation's own thread.
//!
//! The executor is the single consumer of the bridge. Each tick it reaps
//! stale pending entries, advances the simulation, then drains at most
//! [`MAX_COMMANDS_PER_TICK`] commands -- the tick has a real-time budget,
//! and unbounded draining under load would starve the simulation itself.
//! Whatever remains queued is picked up next tick; the queue, not the
//! executor, absorbs burst load.
//!
//! Every dequeued, non-cancelled command gets exactly one result, even when
//! its handler fails: a handler error becomes a failure result, and a
//! panicking handler is caught at the tick boundary rather than taking the
//! host loop down.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use serde_json::json;
use tracing::{debug, error, info, warn};

use warden_types::{CommandPayload, CommandResult, ErrorCode};

use crate::dispatch::CommandDispatcher;
use crate::simulation::Simulation;

/// Maximum commands drained per tick.
pub const MAX_COMMANDS_PER_TICK: usize = 10;

/// Pending entries older than this are reaped at the top of each tick.
pub const STALE_ENTRY_MAX_AGE: Duration = Duration::from_secs(30);

/// Floor for the runtime-adjustable tick interval.
const MIN_TICK_INTERVAL_MS: u64 = 10;

// ---------------------------------------------------------------------------
// Control state
// ---------------------------------------------------------------------------

/// Shared control state for the executor loop.
///
/// Wrapped in [`Arc`] and shared between the executor thread and whoever
/// manages shutdown. Atomic fields keep the tick loop hot path lock-free.
#[derive(Debug)]
pub struct ExecutorControl {
    stop_requested: AtomicBool,
    tick_interval_ms: AtomicU64,
}

impl ExecutorControl {
    /// Create control state with the given tick interval.
    pub const fn new(tick_interval_ms: u64) -> Self {
        Self {
            stop_requested: AtomicBool::new(false),
            tick_interval_ms: AtomicU64::new(tick_interval_ms),
        }
    }

    /// Request a clean stop; the loop exits after the current tick.
    pub fn request_stop(&self) {
        self.stop_requested.store(true, Ordering::Release);
    }

    /// Whether a stop has been requested.
    pub fn is_stop_requested(&self) -> bool {
        self.stop_requested.load(Ordering::Acquire)
    }

    /// Current tick interval in milliseconds.
    pub fn tick_interval_ms(&self) -> u64 {
        self.tick_interval_ms.load(Ordering::Acquire)
    }

    /// Set the tick interval. Returns the previous value, or `None` if the
    /// requested value was below the floor and rejected.
    pub fn set_tick_interval_ms(&self, ms: u64) -> Option<u64> {
        if ms < MIN_TICK_INTERVAL_MS {
            return None;
        }
        Some(self.tick_interval_ms.swap(ms, Ordering::AcqRel))
    }
}

// ---------------------------------------------------------------------------
// Executor
// ---------------------------------------------------------------------------

/// What one tick did; returned for logging and tests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Stale pending entries reaped.
    pub reaped: usize,
    /// Commands executed and resulted.
    pub executed: usize,
    /// Cancelled commands skipped without a result.
    pub skipped: usize,
}

/// The bridge's single consumer, owning the simulation it drives.
///
/// `S` is moved onto the executor thread by [`spawn`](Self::spawn) and
/// never shared, so it does not need to be `Sync`.
#[derive(Debug)]
pub struct Executor<S> {
    dispatcher: Arc<CommandDispatcher>,
    sim: S,
    version: String,
}

impl<S: Simulation + 'static> Executor<S> {
    /// Build an executor over a bridge and a simulation.
    ///
    /// `version` is reported verbatim in health payloads.
    pub fn new(dispatcher: Arc<CommandDispatcher>, sim: S, version: impl Into<String>) -> Self {
        Self {
            dispatcher,
            sim,
            version: version.into(),
        }
    }

    /// The simulation this executor drives.
    pub const fn simulation(&self) -> &S {
        &self.sim
    }

    /// Run one scheduling tick: reap, advance the world, drain commands.
    pub fn tick(&mut self) -> TickReport {
        let mut report = TickReport {
            reaped: self.dispatcher.cleanup_stale(STALE_ENTRY_MAX_AGE),
            ..TickReport::default()
        };
        if report.reaped > 0 {
            debug!(reaped = report.reaped, "reaped stale pending entries");
        }

        self.sim.advance();

        for _ in 0..MAX_COMMANDS_PER_TICK {
            let Some(command) = self.dispatcher.try_dequeue() else {
                break;
            };

            if command.cancel.is_cancelled() {
                debug!(request_id = %command.id, kind = command.kind().as_str(), "skipping cancelled command");
                report.skipped = report.skipped.saturating_add(1);
                continue;
            }

            let result = self.execute_guarded(&command.payload);
            if let Err(code) = &result {
                warn!(
                    request_id = %command.id,
                    kind = command.kind().as_str(),
                    code = %code,
                    "command failed"
                );
            }
            self.dispatcher.set_result(command.id, result);
            report.executed = report.executed.saturating_add(1);
        }

        report
    }

    /// Execute one payload, converting a handler panic into a failure
    /// result. Nothing may propagate out of the tick and crash the host
    /// scheduling loop.
    fn execute_guarded(&mut self, payload: &CommandPayload) -> CommandResult {
        catch_unwind(AssertUnwindSafe(|| self.execute(payload))).unwrap_or_else(|_| {
            error!(kind = payload.kind().as_str(), "command handler panicked");
            Err(ErrorCode::EventFailed)
        })
    }

    fn execute(&mut self, payload: &CommandPayload) -> CommandResult {
        match payload {
            CommandPayload::Health { uptime_seconds } => Ok(json!({
                "status": "ok",
                "game_running": true,
                "colony_loaded": self.sim.colony_loaded(),
                "mod_version": self.version,
                "queue_depth": self.dispatcher.queue_depth(),
                "uptime_seconds": uptime_seconds,
            })),
            CommandPayload::State {
                include_colonists,
                include_resources,
            } => self.sim.snapshot(*include_colonists, *include_resources),
            CommandPayload::Event {
                event,
                points,
                event_id,
            } => {
                self.sim.trigger_event(*event, *points)?;
                Ok(json!({
                    "success": true,
                    "message": "Event triggered successfully",
                    "event_id": event_id,
                }))
            }
            CommandPayload::Message { text, style } => {
                self.sim.post_message(text, *style)?;
                Ok(json!({ "success": true }))
            }
        }
    }

    /// Drive the tick loop until a stop is requested, then close the
    /// bridge so producers fail fast during shutdown.
    pub fn run(mut self, control: &ExecutorControl) {
        info!("executor loop starting");
        while !control.is_stop_requested() {
            let _ = self.tick();
            std::thread::sleep(Duration::from_millis(control.tick_interval_ms()));
        }
        self.dispatcher.close();
        info!("executor loop stopped");
    }

    /// Spawn the loop on a dedicated OS thread -- the simulation's own
    /// execution thread. All simulation mutation happens there and nowhere
    /// else.
    pub fn spawn(
        self,
        control: Arc<ExecutorControl>,
    ) -> std::io::Result<std::thread::JoinHandle<()>> {
        std::thread::Builder::new()
            .name("warden-executor".to_owned())
            .spawn(move || self.run(&control))
    }
}
