//! Sliding-window admission counter.
//!
//! Per key, a time-ordered queue of hit timestamps inside a trailing
//! 60-second window, trimmed lazily on each check. The limiter protects the
//! bridge from abusive callers; it sits entirely in the front end and its
//! lock is independent of the bridge's.

use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

/// The trailing window admissions are counted over.
pub const WINDOW: Duration = Duration::from_secs(60);

/// Key used when callers pass an empty key.
const GLOBAL_KEY: &str = "global";

/// Per-key sliding-window rate limiter.
#[derive(Debug, Default)]
pub struct RateLimiter {
    hits: Mutex<HashMap<String, VecDeque<Instant>>>,
}

impl RateLimiter {
    /// Create a limiter with no recorded hits.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, VecDeque<Instant>>> {
        self.hits.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Try to admit one hit for `key` under a `max_per_minute` budget.
    ///
    /// Evicts timestamps older than the window, admits iff fewer than
    /// `max_per_minute` remain, and records the hit on admission. A limit
    /// of zero means unlimited -- an explicit policy, not an oversight
    /// (the config loader floors configured limits at 10, so zero only
    /// arises when a caller opts out deliberately).
    pub fn try_enter(&self, key: &str, max_per_minute: u32) -> bool {
        self.try_enter_at(key, max_per_minute, Instant::now())
    }

    fn try_enter_at(&self, key: &str, max_per_minute: u32, now: Instant) -> bool {
        if max_per_minute == 0 {
            return true;
        }

        let key = if key.is_empty() { GLOBAL_KEY } else { key };
        let mut hits = self.lock();
        let bucket = hits.entry(key.to_owned()).or_default();

        while bucket
            .front()
            .is_some_and(|hit| now.saturating_duration_since(*hit) > WINDOW)
        {
            bucket.pop_front();
        }

        if bucket.len() >= max_per_minute as usize {
            return false;
        }

        bucket.push_back(now);
        true
    }
}
