//! The closed error-code taxonomy shared by every layer.
//!
//! Admission failures (auth, rate limit, cooldown, body size, missing
//! fields) are produced by the front end; execution failures travel back
//! across the bridge inside a command result. Both sides draw from this
//! single enum so the wire shape stays uniform.

use serde::{Deserialize, Serialize};

/// Every failure the API can report, each mapped to one HTTP status by the
/// front end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// A malformed internal command reached the executor. Defensive only;
    /// the typed payload makes this unreachable from the wire.
    InvalidCommand,
    /// A required field is missing or invalid, or the body is oversized.
    InvalidRequest,
    /// The event-type key is not one of the recognized colony events.
    InvalidEvent,
    /// Auth is required (LAN mode) and the token is missing or wrong.
    Unauthorized,
    /// The simulation has no colony loaded and cannot answer.
    NoColonyLoaded,
    /// The handler ran but the underlying action did not succeed.
    EventFailed,
    /// The per-event cooldown gate rejected the request.
    CooldownActive,
    /// The global rate limiter rejected the request.
    RateLimited,
    /// The bridge is unavailable, the bounded wait timed out, or the
    /// result carried no payload. Callers retry identically in all three
    /// cases, so they are deliberately indistinguishable.
    ModNotReady,
    /// The executor dequeued a command kind it has no handler for.
    NotImplemented,
    /// No route matches the request path.
    NotFound,
}

impl ErrorCode {
    /// The wire spelling of this code.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InvalidCommand => "INVALID_COMMAND",
            Self::InvalidRequest => "INVALID_REQUEST",
            Self::InvalidEvent => "INVALID_EVENT",
            Self::Unauthorized => "UNAUTHORIZED",
            Self::NoColonyLoaded => "NO_COLONY_LOADED",
            Self::EventFailed => "EVENT_FAILED",
            Self::CooldownActive => "COOLDOWN_ACTIVE",
            Self::RateLimited => "RATE_LIMITED",
            Self::ModNotReady => "MOD_NOT_READY",
            Self::NotImplemented => "NOT_IMPLEMENTED",
            Self::NotFound => "NOT_FOUND",
        }
    }

    /// The HTTP status code the front end reports for this failure.
    ///
    /// Codes with no natural mapping default to 409, matching the
    /// executor-side "command refused" semantics.
    pub const fn http_status(self) -> u16 {
        match self {
            Self::InvalidRequest | Self::InvalidEvent => 400,
            Self::Unauthorized => 401,
            Self::NotFound => 404,
            Self::CooldownActive | Self::RateLimited => 429,
            Self::ModNotReady => 503,
            Self::InvalidCommand
            | Self::NoColonyLoaded
            | Self::EventFailed
            | Self::NotImplemented => 409,
        }
    }
}

impl core::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}
