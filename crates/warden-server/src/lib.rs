//! HTTP front end for the Warden command bridge.
//!
//! This crate provides the Axum server that exposes the simulation to
//! external callers:
//!
//! - **Admission pipeline** -- every request passes rate limiting, LAN-mode
//!   token auth, and a declared-body-size precheck, in that order, before
//!   any route logic runs
//! - **REST endpoints** -- `GET /health`, `GET /state`, `POST /event`,
//!   `POST /message`
//! - **Dispatch** -- an admitted request becomes a typed command, crosses
//!   the bridge, and blocks (bounded) for the executor's result
//!
//! # Architecture
//!
//! The front end never touches the simulation. Admission failures are
//! decided and answered here; everything else is correlated through the
//! bridge by request id and translated back into the uniform wire shape
//! `{"success": false, "error": CODE, "message": ...}` on failure.

pub mod admission;
pub mod error;
pub mod handlers;
pub mod router;
pub mod server;
pub mod state;

// Re-export primary types for convenience.
pub use error::ApiError;
pub use router::build_router;
pub use server::{ServerError, start_server};
pub use state::AppState;
