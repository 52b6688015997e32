//! Filesystem-backed path watching via `notify`.
//!
//! # Architecture
//!
//! `FsPathWatch` implements [`PathWatch`] on top of real filesystem
//! notifications:
//!
//! - The parent directory is watched rather than the file itself, for
//!   reliability across platforms (FSEvents on macOS prefers directories).
//! - Directory watchers are shared: files with the same parent share one
//!   `notify` watcher and one worker thread.
//! - Events are filtered to content modifications of registered files.
//! - Rapid successive writes are folded through a [`WriteCoalescer`] so an
//!   editor saving in multiple syscalls produces one callback.
//!
//! The callback fires on a worker thread. Embedders typically forward it
//! into their event loop and hand the path to
//! [`ChangeWatchMonitor::on_fs_event`](crate::ChangeWatchMonitor::on_fs_event)
//! there.

use notify::event::ModifyKind;
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use log::warn;

use crate::coalesce::WriteCoalescer;
use crate::error::WatchError;
use crate::monitor::PathWatch;

/// Invoked on a worker thread when a registered file changes on disk.
pub type ChangeCallback = Box<dyn Fn(PathBuf) + Send + Sync>;

/// One watched parent directory and the files tracked inside it.
struct DirWatch {
    /// The watcher instance (kept alive).
    _watcher: RecommendedWatcher,
    /// Registered files inside this directory; shared with the worker.
    targets: Arc<Mutex<HashSet<PathBuf>>>,
    stop_tx: Sender<()>,
    thread: Option<JoinHandle<()>>,
}

impl Drop for DirWatch {
    // Signal the worker and wait for it, so no callback can fire after
    // the last file in this directory is unwatched.
    fn drop(&mut self) {
        let _ = self.stop_tx.send(());
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

/// `notify`-backed implementation of [`PathWatch`].
pub struct FsPathWatch {
    /// Map from watched parent directory to its watcher.
    dirs: HashMap<PathBuf, DirWatch>,
    /// Map from registered file to its parent directory.
    file_to_dir: HashMap<PathBuf, PathBuf>,
    on_change: Arc<ChangeCallback>,
}

impl FsPathWatch {
    /// Creates a watch that invokes `callback` for each coalesced change.
    pub fn new(callback: ChangeCallback) -> Self {
        Self {
            dirs: HashMap::new(),
            file_to_dir: HashMap::new(),
            on_change: Arc::new(callback),
        }
    }

    /// Number of distinct directories being watched.
    pub fn dir_count(&self) -> usize {
        self.dirs.len()
    }

    /// Number of registered files.
    pub fn file_count(&self) -> usize {
        self.file_to_dir.len()
    }

    fn canonical(path: &Path) -> PathBuf {
        path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
    }
}

impl PathWatch for FsPathWatch {
    fn watch(&mut self, path: &Path) -> Result<(), WatchError> {
        if !path.exists() {
            return Err(WatchError::PathMissing(path.to_path_buf()));
        }
        let canonical = Self::canonical(path);
        if self.file_to_dir.contains_key(&canonical) {
            return Ok(());
        }

        let dir = canonical
            .parent()
            .map(|p| p.to_path_buf())
            .unwrap_or_else(|| canonical.clone());

        // Files sharing a parent share the directory watcher
        if let Some(entry) = self.dirs.get_mut(&dir) {
            entry.targets.lock().unwrap().insert(canonical.clone());
            self.file_to_dir.insert(canonical, dir);
            return Ok(());
        }

        let targets = Arc::new(Mutex::new(HashSet::new()));
        targets.lock().unwrap().insert(canonical.clone());

        let (event_tx, event_rx) = mpsc::channel::<Result<Event, notify::Error>>();
        let (stop_tx, stop_rx) = mpsc::channel::<()>();

        let mut watcher = RecommendedWatcher::new(
            move |res: Result<Event, notify::Error>| {
                let _ = event_tx.send(res);
            },
            Config::default(),
        )?;
        watcher.watch(&dir, RecursiveMode::NonRecursive)?;

        let thread = spawn_event_thread(targets.clone(), self.on_change.clone(), event_rx, stop_rx);

        self.dirs.insert(
            dir.clone(),
            DirWatch {
                _watcher: watcher,
                targets,
                stop_tx,
                thread: Some(thread),
            },
        );
        self.file_to_dir.insert(canonical, dir);
        Ok(())
    }

    fn unwatch(&mut self, path: &Path) {
        let canonical = Self::canonical(path);
        let Some(dir) = self.file_to_dir.remove(&canonical) else {
            return;
        };

        let now_empty = if let Some(entry) = self.dirs.get_mut(&dir) {
            let mut targets = entry.targets.lock().unwrap();
            targets.remove(&canonical);
            targets.is_empty()
        } else {
            false
        };

        if now_empty {
            // DirWatch::drop stops and joins the worker
            self.dirs.remove(&dir);
        }
    }

    fn is_watching(&self, path: &Path) -> bool {
        self.file_to_dir.contains_key(&Self::canonical(path))
    }
}

/// Worker loop: filter raw events to tracked files, coalesce, then fire.
fn spawn_event_thread(
    targets: Arc<Mutex<HashSet<PathBuf>>>,
    on_change: Arc<ChangeCallback>,
    event_rx: Receiver<Result<Event, notify::Error>>,
    stop_rx: Receiver<()>,
) -> JoinHandle<()> {
    thread::spawn(move || {
        let mut coalescer = WriteCoalescer::with_default();
        // The receive timeout is also the coalescer flush tick
        let tick = Duration::from_millis(50);

        loop {
            match stop_rx.try_recv() {
                Ok(()) | Err(mpsc::TryRecvError::Disconnected) => break,
                Err(mpsc::TryRecvError::Empty) => {}
            }

            match event_rx.recv_timeout(tick) {
                Ok(Ok(event)) => note_data_changes(&event, &targets, &mut coalescer),
                Ok(Err(e)) => warn!("filesystem watcher error: {}", e),
                Err(mpsc::RecvTimeoutError::Timeout) => {}
                Err(mpsc::RecvTimeoutError::Disconnected) => break,
            }

            for path in coalescer.drain_due(Instant::now()) {
                on_change(path);
            }
        }
    })
}

/// Records data modifications of tracked files in the coalescer.
fn note_data_changes(
    event: &Event,
    targets: &Mutex<HashSet<PathBuf>>,
    coalescer: &mut WriteCoalescer,
) {
    if !matches!(event.kind, EventKind::Modify(ModifyKind::Data(_))) {
        return;
    }
    let tracked = targets.lock().unwrap();
    for path in &event.paths {
        let canonical = path.canonicalize().unwrap_or_else(|_| path.clone());
        if tracked.contains(&canonical) {
            coalescer.observe(canonical, Instant::now());
        }
    }
}
