//! Type-safe identifier wrappers around [`Uuid`].
//!
//! Requests and triggered events each get a strongly-typed ID so the two can
//! never be mixed up at a call site. IDs use UUID v7 (time-ordered), which
//! keeps log output roughly chronological when sorted.
//!
//! A fresh [`RequestId`] is generated when a command is built at the
//! admission boundary; a collision would be a programmer error, and the
//! bridge's pending table guards against silent overwrites.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Generates a newtype wrapper around [`Uuid`] with standard derives.
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(pub Uuid);

        impl $name {
            /// Create a new identifier using UUID v7 (time-ordered).
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            /// Return the inner [`Uuid`] value.
            pub const fn into_inner(self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<Uuid> for $name {
            fn from(id: Uuid) -> Self {
                Self(id)
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_id! {
    /// Correlates one admitted request with the result the executor
    /// publishes for it.
    RequestId
}

define_id! {
    /// Identifies one triggered colony event, echoed back in the wire
    /// response so callers can reference it.
    EventId
}
