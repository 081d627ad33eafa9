//! Per-key minimum-interval gate for abuse-prone actions.
//!
//! Where the rate limiter bounds overall traffic, the cooldown gate stops
//! rapid repeats of the *same* high-impact action (triggering the same
//! colony event twice in quick succession) even when overall traffic is
//! low. One table shared across all keys; keys are derived from normalized
//! event names by the front end.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

/// Per-key last-admission tracker.
#[derive(Debug, Default)]
pub struct CooldownGate {
    last_by_key: Mutex<HashMap<String, Instant>>,
}

impl CooldownGate {
    /// Create a gate with no admission history.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Instant>> {
        self.last_by_key
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Try to admit `key` under a minimum spacing of `cooldown`.
    ///
    /// Admits (recording the admission time) when the key has never been
    /// admitted or at least `cooldown` has elapsed since it last was. An
    /// empty key always admits. On rejection returns the remaining wait in
    /// whole seconds, ceilinged and never below 1 so callers always report
    /// a usable retry-after.
    pub fn try_enter(&self, key: &str, cooldown: Duration) -> Result<(), u64> {
        self.try_enter_at(key, cooldown, Instant::now())
    }

    fn try_enter_at(&self, key: &str, cooldown: Duration, now: Instant) -> Result<(), u64> {
        if key.is_empty() {
            return Ok(());
        }

        let mut last_by_key = self.lock();
        if let Some(last) = last_by_key.get(key) {
            let elapsed = now.saturating_duration_since(*last);
            if elapsed < cooldown {
                let remaining = cooldown.saturating_sub(elapsed);
                return Err(ceil_secs(remaining).max(1));
            }
        }

        last_by_key.insert(key.to_owned(), now);
        Ok(())
    }
}

/// Whole seconds in `d`, rounded up.
fn ceil_secs(d: Duration) -> u64 {
    let secs = d.as_secs();
    if d.subsec_nanos() > 0 {
        secs.saturating_add(1)
    } else {
        secs
    }
}
