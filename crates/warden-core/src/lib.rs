//! Command bridge, admission primitives, executor loop, and the in-memory
//! colony simulation for Warden.
//!
//! This crate owns everything between the HTTP boundary and the simulation:
//! the thread-safe [`CommandDispatcher`] that carries commands from caller
//! tasks onto the simulation's single execution thread, the [`Executor`]
//! tick pump that drains it, and the [`RateLimiter`] / [`CooldownGate`]
//! primitives the front end gates admission with.
//!
//! # Modules
//!
//! - [`dispatch`] -- The cross-thread command bridge (queue + result registry)
//! - [`executor`] -- Bounded per-tick command draining on the simulation thread
//! - [`ratelimit`] -- Sliding-window admission counter
//! - [`cooldown`] -- Per-key minimum-interval gate for abuse-prone actions
//! - [`simulation`] -- The [`Simulation`] seam the executor delegates through
//! - [`colony`] -- In-memory colony implementing [`Simulation`]
//! - [`config`] -- `warden.yaml` loading, validation, and normalization
//!
//! [`CommandDispatcher`]: dispatch::CommandDispatcher
//! [`Executor`]: executor::Executor
//! [`RateLimiter`]: ratelimit::RateLimiter
//! [`CooldownGate`]: cooldown::CooldownGate
//! [`Simulation`]: simulation::Simulation

pub mod colony;
pub mod config;
pub mod cooldown;
pub mod dispatch;
pub mod executor;
pub mod ratelimit;
pub mod simulation;

pub use colony::ColonySim;
pub use config::{ConfigError, WardenConfig};
pub use cooldown::CooldownGate;
pub use dispatch::{BridgeError, CommandDispatcher};
pub use executor::{Executor, ExecutorControl, MAX_COMMANDS_PER_TICK, STALE_ENTRY_MAX_AGE};
pub use ratelimit::RateLimiter;
pub use simulation::Simulation;
