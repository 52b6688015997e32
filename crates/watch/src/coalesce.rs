//! Coalescing of rapid successive writes.
//!
//! Many programs write a file in several operations (truncate, write,
//! rename into place), each of which surfaces as a separate filesystem
//! event. The coalescer holds each path until its quiet window elapses, so
//! one logical save reaches the monitor as one change.
//!
//! This is a pure structure: callers pass `Instant`s in, which makes the
//! timing fully deterministic in tests. The watcher thread feeds it from
//! raw events and periodically drains it.

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::{Duration, Instant};

/// Default quiet window in milliseconds.
pub const DEFAULT_COALESCE_MS: u64 = 100;

/// Holds changed paths until their quiet window elapses.
///
/// Observing a path that is already held restarts its window, so a burst
/// of writes is delivered once, after the burst ends.
pub struct WriteCoalescer {
    held: HashMap<PathBuf, Instant>,
    window: Duration,
}

impl WriteCoalescer {
    /// Creates a coalescer with the given quiet window.
    pub fn new(window: Duration) -> Self {
        Self {
            held: HashMap::new(),
            window,
        }
    }

    /// Creates a coalescer with the default window.
    pub fn with_default() -> Self {
        Self::new(Duration::from_millis(DEFAULT_COALESCE_MS))
    }

    /// Records a raw change event for `path` at time `now`.
    ///
    /// Restarts the quiet window if the path is already held.
    pub fn observe(&mut self, path: PathBuf, now: Instant) {
        self.held.insert(path, now);
    }

    /// Releases every path whose quiet window has elapsed by `now`.
    ///
    /// Released paths are removed; paths still inside their window stay
    /// held for a later drain.
    pub fn drain_due(&mut self, now: Instant) -> Vec<PathBuf> {
        let window = self.window;
        let mut due = Vec::new();
        self.held.retain(|path, last| {
            if now.duration_since(*last) >= window {
                due.push(path.clone());
                false
            } else {
                true
            }
        });
        due
    }

    /// Returns the number of held paths.
    pub fn held_count(&self) -> usize {
        self.held.len()
    }

    /// Returns true when nothing is held.
    pub fn is_empty(&self) -> bool {
        self.held.is_empty()
    }
}

impl Default for WriteCoalescer {
    fn default() -> Self {
        Self::with_default()
    }
}
