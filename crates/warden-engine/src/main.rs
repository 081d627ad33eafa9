//! Warden binary.
//!
//! Wires the whole system together: loads configuration, builds the
//! command bridge and admission services, moves the colony simulation onto
//! its own executor thread, and serves the HTTP front end until `Ctrl-C`.
//!
//! # Startup Sequence
//!
//! 1. Initialize structured logging (tracing)
//! 2. Load and normalize `warden.yaml` (defaults if the file is absent)
//! 3. Create the command dispatcher, rate limiter, and cooldown gate
//! 4. Spawn the executor thread with the demo colony
//! 5. Serve the command API until `Ctrl-C`
//! 6. Stop the executor, close the bridge, join the thread

mod error;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use warden_core::colony::ColonySim;
use warden_core::{
    CommandDispatcher, CooldownGate, Executor, ExecutorControl, RateLimiter, WardenConfig,
};
use warden_server::{AppState, start_server};

use crate::error::EngineError;

/// Reported in health payloads as `mod_version`.
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default config file looked up next to the working directory.
const DEFAULT_CONFIG_PATH: &str = "warden.yaml";

#[tokio::main]
async fn main() -> Result<(), EngineError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    info!(version = VERSION, "warden-engine starting");

    let config = load_config()?;
    info!(
        bind_address = %config.network.bind_address,
        port = config.network.port,
        lan_mode = config.lan_mode(),
        max_requests_per_minute = config.security.max_requests_per_minute,
        tick_interval_ms = config.engine.tick_interval_ms,
        "configuration loaded"
    );

    // The bridge and admission services: created once, injected everywhere.
    let dispatcher = Arc::new(CommandDispatcher::new());
    let control = Arc::new(ExecutorControl::new(config.engine.tick_interval_ms));

    // The simulation moves onto its own thread; all mutation happens there.
    let executor = Executor::new(
        Arc::clone(&dispatcher),
        ColonySim::with_demo_colony(),
        VERSION,
    );
    let executor_thread = executor.spawn(Arc::clone(&control))?;
    info!("executor thread spawned");

    let state = Arc::new(AppState::new(
        config,
        Arc::clone(&dispatcher),
        RateLimiter::new(),
        CooldownGate::new(),
    ));

    let serve_result = start_server(state, shutdown_signal()).await;

    // Server is down; stop the executor and drain the bridge.
    control.request_stop();
    if executor_thread.join().is_err() {
        warn!("executor thread terminated abnormally");
    }
    info!("warden-engine stopped");

    serve_result?;
    Ok(())
}

/// Resolves after `Ctrl-C`; drives the server's graceful shutdown.
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for ctrl-c; shutting down");
    }
    info!("shutdown signal received");
}

/// Load `warden.yaml` from argv[1] or the default path; missing files fall
/// back to defaults, matching the settings loader's lenient contract.
fn load_config() -> Result<WardenConfig, EngineError> {
    let path: PathBuf = std::env::args_os()
        .nth(1)
        .map_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH), PathBuf::from);

    if Path::new(&path).exists() {
        Ok(WardenConfig::from_file(&path)?)
    } else {
        info!(path = %path.display(), "config file not found, using defaults");
        Ok(WardenConfig::normalized_default())
    }
}
