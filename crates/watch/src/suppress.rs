//! Suppression of our own writes.
//!
//! Saving a document changes its file, and the filesystem watch reports
//! that change like any other. Without suppression every save would ask
//! the user whether to reload the file they just saved. Before writing,
//! the caller arms the guard for the path; the next change event for that
//! path is absorbed.
//!
//! Entries are one-shot and expire after a TTL, so a stale arm (a save
//! whose event never arrived) cannot mask a real external edit later.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// Default arm TTL in milliseconds.
///
/// Generous enough for slow filesystems to deliver the save's own event,
/// short enough not to swallow an external edit made right after a save.
pub const DEFAULT_SELF_WRITE_TTL_MS: u64 = 1000;

/// One-shot, TTL-bounded suppression of change events for paths we are
/// about to write ourselves.
pub struct SelfWriteGuard {
    /// Armed paths and their expiry times.
    armed: HashMap<PathBuf, Instant>,
    ttl: Duration,
}

impl SelfWriteGuard {
    /// Creates a guard with the default TTL.
    pub fn new() -> Self {
        Self::with_ttl(DEFAULT_SELF_WRITE_TTL_MS)
    }

    /// Creates a guard with a custom TTL in milliseconds.
    pub fn with_ttl(ttl_ms: u64) -> Self {
        Self {
            armed: HashMap::new(),
            ttl: Duration::from_millis(ttl_ms),
        }
    }

    /// Arms suppression for `path`. Call immediately before writing.
    ///
    /// Re-arming an already armed path restarts its TTL.
    pub fn arm(&mut self, path: PathBuf) {
        let expiry = Instant::now() + self.ttl;
        self.armed.insert(path, expiry);
    }

    /// Consumes the arm for `path` if present and unexpired.
    ///
    /// Returns true when the change event should be absorbed (it was our
    /// own write). The arm is consumed either way; expired entries are
    /// cleaned up opportunistically.
    pub fn absorb(&mut self, path: &Path) -> bool {
        let now = Instant::now();
        self.armed.retain(|_, expiry| now < *expiry);
        self.armed.remove(path).is_some()
    }

    /// Returns the number of unexpired armed paths.
    pub fn armed_count(&self) -> usize {
        let now = Instant::now();
        self.armed.values().filter(|&&exp| now < exp).count()
    }
}

impl Default for SelfWriteGuard {
    fn default() -> Self {
        Self::new()
    }
}
