//! The command model carried across the bridge.
//!
//! A [`Command`] is built by the front end at admission time, owned by the
//! bridge while queued, and handed to the executor for the duration of
//! execution. The payload is a closed tagged union -- one typed variant per
//! command kind -- so field mistakes are caught at compile time. Untyped
//! string extraction happens only once, at the wire boundary.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use serde::{Deserialize, Serialize};

use crate::error::ErrorCode;
use crate::ids::{EventId, RequestId};

/// Outcome of executing one command.
///
/// Success carries an opaque, handler-owned JSON payload the front end
/// returns verbatim; failure carries a taxonomy code. Exactly one result is
/// produced per command that reaches execution.
pub type CommandResult = Result<serde_json::Value, ErrorCode>;

// ---------------------------------------------------------------------------
// Command kinds and payloads
// ---------------------------------------------------------------------------

/// Discriminant of a command payload, used for logging and metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandKind {
    /// Liveness/status probe.
    Health,
    /// Colony state snapshot read.
    State,
    /// Trigger a colony event.
    Event,
    /// Post an in-game message.
    Message,
}

impl CommandKind {
    /// Lowercase name for log fields.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Health => "health",
            Self::State => "state",
            Self::Event => "event",
            Self::Message => "message",
        }
    }
}

/// The typed payload of a command, one variant per kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandPayload {
    /// Liveness probe. Uptime is measured by the front end (it owns the
    /// server start time) and echoed into the health report.
    Health {
        /// Whole seconds since the server started.
        uptime_seconds: u64,
    },
    /// Colony snapshot read with section toggles.
    State {
        /// Include the per-colonist list in the snapshot.
        include_colonists: bool,
        /// Include the resource stock map in the snapshot.
        include_resources: bool,
    },
    /// Trigger a colony event.
    Event {
        /// Which event to trigger.
        event: ColonyEvent,
        /// Threat-point budget for the event; 0 lets the simulation pick.
        points: u32,
        /// Identifier echoed back to the caller on success.
        event_id: EventId,
    },
    /// Post a message into the colony's in-game log.
    Message {
        /// The message text. Admission guarantees it is non-empty.
        text: String,
        /// Presentation style.
        style: MessageStyle,
    },
}

impl CommandPayload {
    /// The discriminant of this payload.
    pub const fn kind(&self) -> CommandKind {
        match self {
            Self::Health { .. } => CommandKind::Health,
            Self::State { .. } => CommandKind::State,
            Self::Event { .. } => CommandKind::Event,
            Self::Message { .. } => CommandKind::Message,
        }
    }
}

// ---------------------------------------------------------------------------
// Colony events and message styles
// ---------------------------------------------------------------------------

/// The closed set of colony events callers may trigger.
///
/// Unknown wire names are rejected at admission with
/// [`ErrorCode::InvalidEvent`] before anything is enqueued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColonyEvent {
    /// Hostile raid against the colony.
    Raid,
    /// Solar flare disabling powered equipment.
    SolarFlare,
    /// Sudden temperature drop.
    ColdSnap,
    /// Pack of man-hunting animals.
    Manhunter,
    /// Cargo pods crash-land with free resources.
    CargoPod,
}

impl ColonyEvent {
    /// Parse a wire event-type key, case-insensitively.
    pub fn from_wire(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "raid" => Some(Self::Raid),
            "solar_flare" => Some(Self::SolarFlare),
            "cold_snap" => Some(Self::ColdSnap),
            "manhunter" => Some(Self::Manhunter),
            "cargo_pod" => Some(Self::CargoPod),
            _ => None,
        }
    }

    /// The normalized wire name, also used as the cooldown key suffix.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Raid => "raid",
            Self::SolarFlare => "solar_flare",
            Self::ColdSnap => "cold_snap",
            Self::Manhunter => "manhunter",
            Self::CargoPod => "cargo_pod",
        }
    }
}

impl core::fmt::Display for ColonyEvent {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Presentation style for an in-game message.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageStyle {
    /// Neutral notification.
    #[default]
    Info,
    /// Good-news notification.
    Positive,
    /// Bad-news notification.
    Negative,
    /// Full letter in the colony's mail stack.
    Dramatic,
}

impl MessageStyle {
    /// Parse a wire style name. Unknown names fall back to [`Self::Info`],
    /// matching the lenient `type` field contract.
    pub fn from_wire(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "positive" => Self::Positive,
            "negative" => Self::Negative,
            "dramatic" => Self::Dramatic,
            _ => Self::Info,
        }
    }

    /// The wire name of this style.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Positive => "positive",
            Self::Negative => "negative",
            Self::Dramatic => "dramatic",
        }
    }
}

// ---------------------------------------------------------------------------
// Cancellation
// ---------------------------------------------------------------------------

/// Advisory cancellation flag attached to a command.
///
/// Cloneable; the front end keeps one handle and the queued command carries
/// the other. Setting it after the executor has dequeued the command has no
/// effect -- cancellation is best-effort by contract. A skipped command
/// never gets a result; its pending entry is collected by the reaper.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    /// Create a new, unset flag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request that the executor skip this command.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    /// Whether cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

// ---------------------------------------------------------------------------
// Command
// ---------------------------------------------------------------------------

/// One unit of work handed from a caller thread to the executor thread.
#[derive(Debug, Clone)]
pub struct Command {
    /// Correlation identifier, generated at creation.
    pub id: RequestId,
    /// The typed payload.
    pub payload: CommandPayload,
    /// Advisory cancellation flag.
    pub cancel: CancelFlag,
}

impl Command {
    /// Build a command with a fresh [`RequestId`] and an unset cancel flag.
    pub fn new(payload: CommandPayload) -> Self {
        Self {
            id: RequestId::new(),
            payload,
            cancel: CancelFlag::new(),
        }
    }

    /// The discriminant of this command's payload.
    pub const fn kind(&self) -> CommandKind {
        self.payload.kind()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_parsing_is_case_insensitive() {
        assert_eq!(ColonyEvent::from_wire("RAID"), Some(ColonyEvent::Raid));
        assert_eq!(
            ColonyEvent::from_wire("  cold_snap "),
            Some(ColonyEvent::ColdSnap)
        );
        assert_eq!(ColonyEvent::from_wire("meteor"), None);
        assert_eq!(ColonyEvent::from_wire(""), None);
    }

    #[test]
    fn unknown_style_falls_back_to_info() {
        assert_eq!(MessageStyle::from_wire("dramatic"), MessageStyle::Dramatic);
        assert_eq!(MessageStyle::from_wire("shouting"), MessageStyle::Info);
        assert_eq!(MessageStyle::from_wire(""), MessageStyle::Info);
    }

    #[test]
    fn cancel_flag_is_shared_between_clones() {
        let cmd = Command::new(CommandPayload::Health { uptime_seconds: 0 });
        let handle = cmd.cancel.clone();
        assert!(!cmd.cancel.is_cancelled());
        handle.cancel();
        assert!(cmd.cancel.is_cancelled());
    }

    #[test]
    fn commands_get_distinct_request_ids() {
        let a = Command::new(CommandPayload::Health { uptime_seconds: 1 });
        let b = Command::new(CommandPayload::Health { uptime_seconds: 1 });
        assert_ne!(a.id, b.id);
        assert_eq!(a.kind(), CommandKind::Health);
    }
}
