//! Readiness gate between loading and resolving.
//!
//! Loading rule sources may finish after the first question arrives. Every
//! document handed to the loader is first *requested* on the gate and later
//! *settled* (loaded or failed). The gate is open whenever every requested
//! document has settled.
//!
//! ```text
//! load_files([a, b])   request(2) ── read a ── settle ── read b ── settle
//! resolve("hi")            └─ wait_ready: notified / retry_delay ─┘  -> scan
//! ```
//!
//! A waiting resolve re-checks on every settle notification and at least
//! every `retry_delay`; after `max_retries` re-checks it gives up with
//! `LoadTimeout`. Dropping the future cancels the wait.

use crate::api::RetryPolicy;
use crate::{Error, Result};
use parking_lot::Mutex;
use tokio::sync::Notify;

/// Identifies one load epoch. [`ReadinessGate::reset`] starts a new one and
/// every document requested in an older epoch is ignored from then on.
pub(crate) type Generation = u64;

#[derive(Debug, Default)]
struct Counters {
    generation: Generation,
    requested: usize,
    settled: usize,
    loaded: usize,
}

#[derive(Debug, Default)]
pub(crate) struct ReadinessGate {
    counters: Mutex<Counters>,
    notify: Notify,
}

impl ReadinessGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `count` documents that are about to be loaded, returning the
    /// generation they must be settled against.
    pub fn request(&self, count: usize) -> Generation {
        let mut counters = self.counters.lock();
        counters.requested += count;
        counters.generation
    }

    pub fn generation(&self) -> Generation {
        self.counters.lock().generation
    }

    /// Mark one requested document as done, successfully or not.
    ///
    /// Returns `false`, and changes nothing, when the gate was reset since
    /// the document was requested.
    pub fn settle(&self, generation: Generation, loaded: bool) -> bool {
        {
            let mut counters = self.counters.lock();
            if counters.generation != generation {
                return false;
            }
            counters.settled += 1;
            if loaded {
                counters.loaded += 1;
            }
        }
        self.notify.notify_waiters();
        true
    }

    /// Settle `count` documents that will never be loaded. Stale generations
    /// are ignored like in [`settle`](Self::settle).
    pub fn abandon(&self, generation: Generation, count: usize) {
        if count == 0 {
            return;
        }
        {
            let mut counters = self.counters.lock();
            if counters.generation != generation {
                return;
            }
            counters.settled += count;
        }
        self.notify.notify_waiters();
    }

    pub fn is_ready(&self) -> bool {
        let counters = self.counters.lock();
        counters.settled >= counters.requested
    }

    /// `(requested, loaded)`.
    pub fn progress(&self) -> (usize, usize) {
        let counters = self.counters.lock();
        (counters.requested, counters.loaded)
    }

    /// Forget every request, as if nothing had ever been loaded, and start a
    /// new generation so loads still in flight cannot settle against it.
    pub fn reset(&self) {
        {
            let mut counters = self.counters.lock();
            let generation = counters.generation.wrapping_add(1);
            *counters = Counters { generation, ..Counters::default() };
        }
        self.notify.notify_waiters();
    }

    pub async fn wait_ready(&self, policy: &RetryPolicy) -> Result<()> {
        let mut attempts = 0;
        loop {
            // Register interest before checking so a settle in between is not lost.
            let notified = self.notify.notified();
            if self.is_ready() {
                return Ok(());
            }
            if attempts >= policy.max_retries {
                return Err(Error::LoadTimeout { attempts });
            }
            attempts += 1;
            tracing::debug!(target: "aimlite::source", attempts, progress = ?self.progress(), "waiting for rule sources");
            let _ = tokio::time::timeout(policy.delay, notified).await;
        }
    }
}
