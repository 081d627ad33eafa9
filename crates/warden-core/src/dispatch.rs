//! The cross-thread command bridge: a thread-safe FIFO queue plus a
//! pending-result registry with bounded waits and staleness reaping.
//!
//! Producers are arbitrary caller tasks; the consumer is exactly one
//! executor thread. One mutex covers both the queue and the pending table --
//! throughput is not the bottleneck here, correctness of result correlation
//! is. Result publication wakes waiters through a [`Notify`], replacing the
//! classic sleep-poll loop while keeping the same external contract: bounded
//! wait, single consumption, no result observed more than once.
//!
//! The queue is unbounded by design; the admission pipeline upstream (rate
//! limit, cooldown, body caps) is what bounds inflow, and the executor's
//! per-tick drain cap is what bounds outflow.

use std::collections::hash_map::Entry;
use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use tokio::sync::Notify;
use tracing::{debug, warn};

use warden_types::{Command, CommandResult, RequestId};

/// Why the bridge refused to accept a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum BridgeError {
    /// The bridge has been closed for shutdown; nothing further is accepted.
    #[error("command bridge is closed")]
    Closed,
    /// A command with this `RequestId` is already pending. IDs are generated
    /// per command, so this is a programmer error, never a runtime
    /// condition; the existing entry is left untouched.
    #[error("duplicate request id")]
    DuplicateRequestId,
}

/// Bridge bookkeeping for one enqueued command.
///
/// Exists from the moment `enqueue` returns until the result is collected
/// or the entry is reaped. At most one entry per [`RequestId`].
#[derive(Debug)]
struct PendingEntry {
    /// When the command was enqueued.
    created: Instant,
    /// When the result was published, if it has been.
    completed: Option<Instant>,
    /// The published result, awaiting collection.
    result: Option<CommandResult>,
}

#[derive(Debug, Default)]
struct Inner {
    queue: VecDeque<Command>,
    pending: HashMap<RequestId, PendingEntry>,
    closed: bool,
}

/// Thread-safe command queue + result registry.
///
/// Safe under unbounded concurrent producers and a single consumer thread.
/// Constructed once at startup and injected into both the front end and the
/// executor; there is no ambient global instance.
#[derive(Debug, Default)]
pub struct CommandDispatcher {
    inner: Mutex<Inner>,
    /// Signalled after every result publication (and on close) so bounded
    /// waiters re-check without sleeping on a fixed poll interval.
    publish: Notify,
}

impl CommandDispatcher {
    /// Create an empty, open bridge.
    pub fn new() -> Self {
        Self::default()
    }

    /// A poisoned lock means a panic elsewhere while holding it; the
    /// bookkeeping is still structurally valid, so recover the guard.
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append a command to the FIFO queue and register a pending entry for
    /// its result.
    ///
    /// Returns the command's [`RequestId`] for correlation. Fails only when
    /// the bridge is closed (shutdown) -- a full queue is not a failure
    /// mode; admission controls upstream bound the inflow.
    pub fn enqueue(&self, command: Command) -> Result<RequestId, BridgeError> {
        let id = command.id;
        let mut inner = self.lock();
        if inner.closed {
            return Err(BridgeError::Closed);
        }
        match inner.pending.entry(id) {
            Entry::Occupied(_) => {
                debug_assert!(false, "request id collision on enqueue");
                warn!(request_id = %id, "refusing to overwrite pending entry");
                return Err(BridgeError::DuplicateRequestId);
            }
            Entry::Vacant(slot) => {
                slot.insert(PendingEntry {
                    created: Instant::now(),
                    completed: None,
                    result: None,
                });
            }
        }
        inner.queue.push_back(command);
        Ok(id)
    }

    /// Pop the oldest queued command, if any. Never blocks; this runs on
    /// the executor thread inside its real-time tick budget.
    pub fn try_dequeue(&self) -> Option<Command> {
        self.lock().queue.pop_front()
    }

    /// Attach a result to a pending entry and wake all bounded waiters.
    ///
    /// A no-op when the entry is gone (already collected, or reaped after
    /// the requester gave up). Publishing twice for one id overwrites, but
    /// the executor produces exactly one result per command.
    pub fn set_result(&self, id: RequestId, result: CommandResult) {
        {
            let mut inner = self.lock();
            let Some(entry) = inner.pending.get_mut(&id) else {
                debug!(request_id = %id, "dropping result for reaped entry");
                return;
            };
            if entry.result.is_some() {
                warn!(request_id = %id, "overwriting previously published result");
            }
            entry.result = Some(result);
            entry.completed = Some(Instant::now());
        }
        self.publish.notify_waiters();
    }

    /// Collect a published result, removing its pending entry.
    ///
    /// Single consumption: a given result is returned to at most one
    /// caller; the next call for the same id returns `None`. Also `None`
    /// when the entry is absent or the result has not been published yet.
    pub fn try_get_result(&self, id: RequestId) -> Option<CommandResult> {
        let mut inner = self.lock();
        match inner.pending.entry(id) {
            Entry::Occupied(entry) if entry.get().result.is_some() => entry.remove().result,
            _ => None,
        }
    }

    /// Wait up to `timeout` for the result of `id`, collecting it on
    /// arrival.
    ///
    /// Wakes on every publication and re-checks; a final check after the
    /// deadline catches a publication that raced the timeout. `None` means
    /// the wait elapsed with nothing to collect -- the entry stays pending
    /// until the executor's reaper gets to it.
    pub async fn wait_for_result(&self, id: RequestId, timeout: Duration) -> Option<CommandResult> {
        let deadline = tokio::time::Instant::now().checked_add(timeout)?;
        loop {
            let notified = self.publish.notified();
            tokio::pin!(notified);
            // Register for the next notification *before* checking, so a
            // publication between the check and the await is not missed.
            notified.as_mut().enable();

            if let Some(result) = self.try_get_result(id) {
                return Some(result);
            }
            if tokio::time::timeout_at(deadline, notified).await.is_err() {
                return self.try_get_result(id);
            }
        }
    }

    /// Reap abandoned pending entries, returning how many were removed.
    ///
    /// Two cases qualify: entries still awaiting a result whose age exceeds
    /// `max_age` (the executor never got to them, or the command was
    /// cancelled), and entries whose published result has sat uncollected
    /// for `max_age` (the requester timed out and disconnected). A freshly
    /// published result is never reaped, however old its entry.
    ///
    /// Called periodically by the executor -- it is the only party with a
    /// reliable heartbeat.
    pub fn cleanup_stale(&self, max_age: Duration) -> usize {
        let now = Instant::now();
        let mut inner = self.lock();
        let before = inner.pending.len();
        inner.pending.retain(|id, entry| {
            let reference = entry.completed.unwrap_or(entry.created);
            let keep = now.saturating_duration_since(reference) <= max_age;
            if !keep {
                debug!(
                    request_id = %id,
                    resulted = entry.result.is_some(),
                    "reaping stale pending entry"
                );
            }
            keep
        });
        before.saturating_sub(inner.pending.len())
    }

    /// Number of commands enqueued but not yet dequeued. Exposed for the
    /// health report and tests; not load-bearing.
    pub fn queue_depth(&self) -> usize {
        self.lock().queue.len()
    }

    /// Number of pending entries (results in flight or awaiting collection).
    pub fn pending_len(&self) -> usize {
        self.lock().pending.len()
    }

    /// Close the bridge for shutdown: further enqueues fail and all bounded
    /// waiters are woken so they can observe the timeout path promptly.
    pub fn close(&self) {
        self.lock().closed = true;
        self.publish.notify_waiters();
    }

    /// Whether [`close`](Self::close) has been called.
    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use warden_types::CommandPayload;

    fn health_command() -> Command {
        Command::new(CommandPayload::Health { uptime_seconds: 0 })
    }

    fn must_enqueue(bridge: &CommandDispatcher) -> RequestId {
        match bridge.enqueue(health_command()) {
            Ok(id) => id,
            Err(e) => panic!("enqueue failed: {e}"),
        }
    }

    #[test]
    fn dequeue_preserves_fifo_order() {
        let bridge = CommandDispatcher::new();
        let first = bridge.enqueue(health_command()).ok();
        let second = bridge.enqueue(health_command()).ok();
        assert_eq!(bridge.queue_depth(), 2);

        assert_eq!(bridge.try_dequeue().map(|c| c.id), first);
        assert_eq!(bridge.try_dequeue().map(|c| c.id), second);
        assert!(bridge.try_dequeue().is_none());
    }

    #[test]
    fn results_are_consumed_exactly_once() {
        let bridge = CommandDispatcher::new();
        let id = must_enqueue(&bridge);
        assert!(bridge.try_get_result(id).is_none());

        bridge.set_result(id, Ok(json!({"ok": true})));
        assert!(bridge.try_get_result(id).is_some());
        assert!(bridge.try_get_result(id).is_none());
        assert_eq!(bridge.pending_len(), 0);
    }

    #[test]
    fn result_for_unknown_id_is_dropped() {
        let bridge = CommandDispatcher::new();
        bridge.set_result(RequestId::new(), Ok(json!({})));
        assert_eq!(bridge.pending_len(), 0);
    }

    #[test]
    fn enqueue_fails_after_close() {
        let bridge = CommandDispatcher::new();
        bridge.close();
        assert!(matches!(
            bridge.enqueue(health_command()),
            Err(BridgeError::Closed)
        ));
        assert!(bridge.is_closed());
    }

    #[test]
    fn reaper_removes_entries_that_never_resulted() {
        let bridge = CommandDispatcher::new();
        let _ = bridge.enqueue(health_command());
        assert_eq!(bridge.cleanup_stale(Duration::from_secs(30)), 0);

        std::thread::sleep(Duration::from_millis(20));
        assert_eq!(bridge.cleanup_stale(Duration::from_millis(5)), 1);
        assert_eq!(bridge.pending_len(), 0);
    }

    #[test]
    fn fresh_result_survives_reaping_of_old_entries() {
        let bridge = CommandDispatcher::new();
        let id = must_enqueue(&bridge);

        // Let the entry age past the reap threshold, then publish.
        std::thread::sleep(Duration::from_millis(30));
        bridge.set_result(id, Ok(json!({})));

        // Age is measured from publication once a result exists.
        assert_eq!(bridge.cleanup_stale(Duration::from_millis(20)), 0);
        assert_eq!(bridge.pending_len(), 1);

        // An uncollected result is eventually absorbed too.
        std::thread::sleep(Duration::from_millis(30));
        assert_eq!(bridge.cleanup_stale(Duration::from_millis(20)), 1);
        assert!(bridge.try_get_result(id).is_none());
    }

    #[tokio::test]
    async fn wait_collects_result_published_from_another_thread() {
        let bridge = std::sync::Arc::new(CommandDispatcher::new());
        let id = must_enqueue(&bridge);

        let publisher = std::sync::Arc::clone(&bridge);
        let handle = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(20));
            publisher.set_result(id, Ok(json!({"answer": 42})));
        });

        let result = bridge.wait_for_result(id, Duration::from_secs(2)).await;
        assert_eq!(result, Some(Ok(json!({"answer": 42}))));
        assert!(handle.join().is_ok());

        // Single consumption holds across the wait path too.
        assert!(bridge.try_get_result(id).is_none());
    }

    #[tokio::test]
    async fn wait_times_out_when_nothing_is_published() {
        let bridge = CommandDispatcher::new();
        let id = must_enqueue(&bridge);

        let started = Instant::now();
        let result = bridge.wait_for_result(id, Duration::from_millis(50)).await;
        assert!(result.is_none());
        assert!(started.elapsed() >= Duration::from_millis(50));

        // The entry stays pending for the reaper, not the waiter.
        assert_eq!(bridge.pending_len(), 1);
    }
}
