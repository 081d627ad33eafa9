//! Shared type definitions for the Warden command bridge.
//!
//! This crate is the single source of truth for the value types that cross
//! the bridge between the HTTP front end and the simulation's executor
//! thread. Nothing here performs I/O; everything is plain data.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe UUID wrappers for request and event identifiers
//! - [`command`] -- The [`Command`] model carried across the thread boundary
//! - [`error`] -- The closed [`ErrorCode`] taxonomy shared by all layers
//!
//! [`Command`]: command::Command
//! [`ErrorCode`]: error::ErrorCode

pub mod command;
pub mod error;
pub mod ids;

// Re-export all public types at crate root for convenience.
pub use command::{
    CancelFlag, ColonyEvent, Command, CommandKind, CommandPayload, CommandResult, MessageStyle,
};
pub use error::ErrorCode;
pub use ids::{EventId, RequestId};
