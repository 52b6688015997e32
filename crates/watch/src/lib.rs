//! plume-watch: arbitration of external file changes for open documents.
//!
//! When a document's backing file changes on disk, the user should be asked
//! whether to reload it, but never while they are typing in another
//! window, and never twice for the same change. [`ChangeWatchMonitor`] is
//! the per-document state machine that implements this policy; it consumes
//! filesystem events and focus events and produces at most one
//! [`ReloadRequest`] per external change.
//!
//! # Architecture
//!
//! The monitor is pure state. Its collaborators are trait seams bundled in
//! a [`WatchContext`]:
//! - [`PathWatch`]: filesystem watch registration (idempotent both ways)
//! - [`ReloadPrompt`]: the blocking yes/no interaction
//! - [`FocusQuery`]: whether the editor currently has focus
//!
//! [`FsPathWatch`] is the production [`PathWatch`]: a `notify`-backed
//! watcher that observes each file's parent directory, filters to bound
//! files, and coalesces rapid writes before delivering. [`WriteCoalescer`]
//! and [`SelfWriteGuard`] are the pure timing structures behind it; the
//! guard keeps our own saves from round-tripping into a reload prompt.

mod coalesce;
mod error;
mod fs_watch;
mod monitor;
mod suppress;

pub use coalesce::{WriteCoalescer, DEFAULT_COALESCE_MS};
pub use error::WatchError;
pub use fs_watch::{ChangeCallback, FsPathWatch};
pub use monitor::{
    ChangeWatchMonitor, FocusQuery, PathWatch, ReloadChoice, ReloadPrompt, ReloadRequest,
    WatchContext, WatchState,
};
pub use suppress::{SelfWriteGuard, DEFAULT_SELF_WRITE_TTL_MS};
