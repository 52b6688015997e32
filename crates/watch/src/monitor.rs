//! The per-document change arbitration state machine.
//!
//! One monitor per open document. Filesystem events and focus events feed
//! in; at most one reload prompt comes out per external change, and never
//! while the document is unfocused.

use std::path::{Path, PathBuf};

use log::{debug, warn};

use crate::error::WatchError;
use crate::suppress::SelfWriteGuard;

/// Filesystem watch registration seam.
///
/// Both operations are idempotent: watching an already watched path and
/// unwatching a path that was never watched are no-ops, not errors. This
/// lets the monitor rebind defensively without bookkeeping races.
pub trait PathWatch {
    /// Registers `path` for change notifications.
    fn watch(&mut self, path: &Path) -> Result<(), WatchError>;

    /// Unregisters `path`. No-op when not registered.
    fn unwatch(&mut self, path: &Path);

    /// Returns true if `path` is currently registered.
    fn is_watching(&self, path: &Path) -> bool;
}

/// The user's answer to a reload prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReloadChoice {
    /// Reload the buffer from disk.
    Reload,
    /// Keep the in-memory content.
    Keep,
}

/// Blocking yes/no interaction seam.
///
/// `confirm_reload` does not return until the user has decided; no other
/// monitor event is processed during the wait (strict serialization on the
/// event-loop thread).
pub trait ReloadPrompt {
    /// Asks whether the document at `path` should be reloaded from disk.
    fn confirm_reload(&mut self, path: &Path) -> ReloadChoice;
}

/// Focus state seam.
pub trait FocusQuery {
    /// Returns true when the editor widget currently has focus.
    fn editor_has_focus(&self) -> bool;
}

/// Mutable access to the monitor's collaborators for one event.
pub struct WatchContext<'a> {
    /// Filesystem watch registration.
    pub watcher: &'a mut dyn PathWatch,
    /// The blocking reload prompt.
    pub prompt: &'a mut dyn ReloadPrompt,
    /// Current focus state.
    pub focus: &'a dyn FocusQuery,
}

/// Request to reload a document from disk.
///
/// The monitor only issues the request; the embedding framework performs
/// the actual reload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReloadRequest {
    /// The path to reload from.
    pub path: PathBuf,
}

/// Monitor state, one prompt cycle per external change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WatchState {
    /// No unhandled external change.
    #[default]
    Idle,
    /// A change was detected while the document was unfocused; the prompt
    /// is deferred until focus returns.
    PendingNotification,
    /// The blocking prompt is on screen.
    PromptingUser,
}

/// The document's association with the single path it monitors.
#[derive(Debug, Clone)]
struct WatchBinding {
    path: PathBuf,
    /// False when registration failed; the binding stays inactive until
    /// the next successful path change.
    active: bool,
}

/// Per-document external change arbitration.
///
/// Lives for the lifetime of its document. The binding is rebound on every
/// path change (save-as, reload) and torn down with `on_disable`.
pub struct ChangeWatchMonitor {
    binding: Option<WatchBinding>,
    state: WatchState,
    enabled: bool,
    self_writes: SelfWriteGuard,
}

impl ChangeWatchMonitor {
    /// Creates a monitor with no binding, disabled.
    pub fn new() -> Self {
        Self {
            binding: None,
            state: WatchState::Idle,
            enabled: false,
            self_writes: SelfWriteGuard::new(),
        }
    }

    /// Returns the current state. Useful for tests and diagnostics.
    pub fn state(&self) -> WatchState {
        self.state
    }

    /// Returns the bound path, if any.
    pub fn bound_path(&self) -> Option<&Path> {
        self.binding.as_ref().map(|b| b.path.as_path())
    }

    /// Returns true if the binding is registered with the watch.
    pub fn is_active(&self) -> bool {
        self.binding.as_ref().map_or(false, |b| b.active)
    }

    /// Activates the monitor, registering the bound path if one exists.
    ///
    /// A registration failure (e.g. the file does not exist yet) leaves
    /// the binding inactive and is surfaced to the caller; the monitor
    /// itself stays usable.
    pub fn on_enable(&mut self, ctx: &mut WatchContext<'_>) -> Result<(), WatchError> {
        self.enabled = true;
        if let Some(binding) = &mut self.binding {
            if !binding.active {
                match ctx.watcher.watch(&binding.path) {
                    Ok(()) => binding.active = true,
                    Err(e) => {
                        warn!("could not watch {:?}: {}", binding.path, e);
                        return Err(e);
                    }
                }
            }
        }
        Ok(())
    }

    /// Deactivates the monitor from any state.
    ///
    /// Unregisters the bound path (a no-op if it was never registered) and
    /// discards any pending change.
    pub fn on_disable(&mut self, ctx: &mut WatchContext<'_>) {
        if let Some(binding) = &mut self.binding {
            ctx.watcher.unwatch(&binding.path);
            binding.active = false;
        }
        self.state = WatchState::Idle;
        self.enabled = false;
    }

    /// Rebinds the monitor to a new path, on save, save-as, or reload.
    ///
    /// Defensive: rebinding to the already bound path is a no-op, the old
    /// path is unregistered exactly once, and the new path registered
    /// exactly once. A pending change for the old path is discarded, since
    /// it no longer describes the document.
    pub fn on_path_changed(
        &mut self,
        new_path: &Path,
        ctx: &mut WatchContext<'_>,
    ) -> Result<(), WatchError> {
        if let Some(binding) = &self.binding {
            if binding.path == new_path && binding.active {
                return Ok(());
            }
            if binding.path != new_path {
                ctx.watcher.unwatch(&binding.path);
                self.state = WatchState::Idle;
            }
        }

        let active = if self.enabled {
            match ctx.watcher.watch(new_path) {
                Ok(()) => true,
                Err(e) => {
                    warn!("could not watch {:?}: {}", new_path, e);
                    self.binding = Some(WatchBinding {
                        path: new_path.to_path_buf(),
                        active: false,
                    });
                    return Err(e);
                }
            }
        } else {
            false
        };

        self.binding = Some(WatchBinding {
            path: new_path.to_path_buf(),
            active,
        });
        Ok(())
    }

    /// Notes that the editor itself is saving the bound path.
    ///
    /// Arms self-write suppression so the save's own change event does not
    /// prompt, and re-registers the path afterwards (some backends drop a
    /// watch when the file is replaced on save).
    pub fn on_saved(&mut self, ctx: &mut WatchContext<'_>) -> Result<(), WatchError> {
        let Some(binding) = &mut self.binding else {
            return Ok(());
        };
        self.self_writes.arm(binding.path.clone());
        if self.enabled {
            match ctx.watcher.watch(&binding.path) {
                Ok(()) => binding.active = true,
                Err(e) => {
                    binding.active = false;
                    return Err(e);
                }
            }
        }
        Ok(())
    }

    /// Handles a filesystem change notification.
    ///
    /// Events for other paths and events caused by our own saves are
    /// ignored, as are events arriving while the monitor is disabled
    /// (watcher backends deliver through worker threads, so a stale event
    /// can land after teardown). A first event moves to
    /// `PendingNotification`; the prompt fires immediately when the editor
    /// is focused, otherwise it is deferred to the next focus gain. Repeat
    /// events while a change is already pending (or being prompted) never
    /// queue a second prompt.
    pub fn on_fs_event(
        &mut self,
        path: &Path,
        ctx: &mut WatchContext<'_>,
    ) -> Option<ReloadRequest> {
        if !self.enabled {
            return None;
        }
        let bound = self.binding.as_ref().map(|b| b.path.as_path());
        if bound != Some(path) {
            return None;
        }
        if self.self_writes.absorb(path) {
            debug!("absorbed self-write for {:?}", path);
            return None;
        }

        match self.state {
            WatchState::Idle => {
                self.state = WatchState::PendingNotification;
                if ctx.focus.editor_has_focus() {
                    self.prompt(ctx)
                } else {
                    None
                }
            }
            // At most one prompt per pending change
            WatchState::PendingNotification | WatchState::PromptingUser => None,
        }
    }

    /// Handles the editor regaining focus, surfacing a deferred prompt.
    pub fn on_focus_gained(&mut self, ctx: &mut WatchContext<'_>) -> Option<ReloadRequest> {
        if !self.enabled {
            return None;
        }
        match self.state {
            WatchState::PendingNotification => self.prompt(ctx),
            WatchState::Idle | WatchState::PromptingUser => None,
        }
    }

    /// Runs the blocking prompt cycle.
    ///
    /// The pending change is cleared whether the user accepts or declines;
    /// declining leaves the buffer untouched.
    fn prompt(&mut self, ctx: &mut WatchContext<'_>) -> Option<ReloadRequest> {
        let path = self.binding.as_ref()?.path.clone();
        self.state = WatchState::PromptingUser;
        let choice = ctx.prompt.confirm_reload(&path);
        self.state = WatchState::Idle;
        match choice {
            ReloadChoice::Reload => Some(ReloadRequest { path }),
            ReloadChoice::Keep => None,
        }
    }
}

impl Default for ChangeWatchMonitor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    /// PathWatch double that records every call.
    #[derive(Default)]
    struct MockWatch {
        watching: HashSet<PathBuf>,
        watch_calls: Vec<PathBuf>,
        unwatch_calls: Vec<PathBuf>,
        fail_next: bool,
    }

    impl PathWatch for MockWatch {
        fn watch(&mut self, path: &Path) -> Result<(), WatchError> {
            self.watch_calls.push(path.to_path_buf());
            if self.fail_next {
                self.fail_next = false;
                return Err(WatchError::PathMissing(path.to_path_buf()));
            }
            self.watching.insert(path.to_path_buf());
            Ok(())
        }

        fn unwatch(&mut self, path: &Path) {
            self.unwatch_calls.push(path.to_path_buf());
            self.watching.remove(path);
        }

        fn is_watching(&self, path: &Path) -> bool {
            self.watching.contains(path)
        }
    }

    /// ReloadPrompt double with a scripted answer and a call counter.
    struct ScriptedPrompt {
        choice: ReloadChoice,
        prompts: usize,
    }

    impl ScriptedPrompt {
        fn answering(choice: ReloadChoice) -> Self {
            Self { choice, prompts: 0 }
        }
    }

    impl ReloadPrompt for ScriptedPrompt {
        fn confirm_reload(&mut self, _path: &Path) -> ReloadChoice {
            self.prompts += 1;
            self.choice
        }
    }

    struct FixedFocus(bool);

    impl FocusQuery for FixedFocus {
        fn editor_has_focus(&self) -> bool {
            self.0
        }
    }

    fn doc_path() -> PathBuf {
        PathBuf::from("/home/user/doc.txt")
    }

    /// Monitor enabled and bound to `doc_path`, with the given focus.
    fn bound_monitor(
        watch: &mut MockWatch,
        prompt: &mut ScriptedPrompt,
        focus: &FixedFocus,
    ) -> ChangeWatchMonitor {
        let mut monitor = ChangeWatchMonitor::new();
        let mut ctx = WatchContext {
            watcher: watch,
            prompt,
            focus,
        };
        monitor.on_enable(&mut ctx).unwrap();
        monitor.on_path_changed(&doc_path(), &mut ctx).unwrap();
        monitor
    }

    macro_rules! ctx {
        ($watch:expr, $prompt:expr, $focus:expr) => {
            &mut WatchContext {
                watcher: &mut $watch,
                prompt: &mut $prompt,
                focus: &$focus,
            }
        };
    }

    #[test]
    fn test_enable_and_bind_registers_path() {
        let mut watch = MockWatch::default();
        let mut prompt = ScriptedPrompt::answering(ReloadChoice::Keep);
        let focus = FixedFocus(true);
        let monitor = bound_monitor(&mut watch, &mut prompt, &focus);

        assert!(watch.is_watching(&doc_path()));
        assert!(monitor.is_active());
        assert_eq!(monitor.bound_path(), Some(doc_path().as_path()));
        assert_eq!(monitor.state(), WatchState::Idle);
    }

    #[test]
    fn test_focused_change_prompts_immediately() {
        let mut watch = MockWatch::default();
        let mut prompt = ScriptedPrompt::answering(ReloadChoice::Reload);
        let focus = FixedFocus(true);
        let mut monitor = bound_monitor(&mut watch, &mut prompt, &focus);

        let request = monitor.on_fs_event(&doc_path(), ctx!(watch, prompt, focus));

        assert_eq!(request, Some(ReloadRequest { path: doc_path() }));
        assert_eq!(prompt.prompts, 1);
        assert_eq!(monitor.state(), WatchState::Idle);
    }

    #[test]
    fn test_unfocused_change_defers_prompt() {
        let mut watch = MockWatch::default();
        let mut prompt = ScriptedPrompt::answering(ReloadChoice::Reload);
        let focus = FixedFocus(false);
        let mut monitor = bound_monitor(&mut watch, &mut prompt, &focus);

        let request = monitor.on_fs_event(&doc_path(), ctx!(watch, prompt, focus));

        // No dialog while the user is elsewhere
        assert_eq!(request, None);
        assert_eq!(prompt.prompts, 0);
        assert_eq!(monitor.state(), WatchState::PendingNotification);

        // Focus returns: exactly one prompt surfaces
        let request = monitor.on_focus_gained(ctx!(watch, prompt, focus));
        assert_eq!(request, Some(ReloadRequest { path: doc_path() }));
        assert_eq!(prompt.prompts, 1);
        assert_eq!(monitor.state(), WatchState::Idle);
    }

    #[test]
    fn test_repeat_events_produce_one_prompt() {
        let mut watch = MockWatch::default();
        let mut prompt = ScriptedPrompt::answering(ReloadChoice::Reload);
        let focus = FixedFocus(false);
        let mut monitor = bound_monitor(&mut watch, &mut prompt, &focus);

        assert!(monitor.on_fs_event(&doc_path(), ctx!(watch, prompt, focus)).is_none());
        assert!(monitor.on_fs_event(&doc_path(), ctx!(watch, prompt, focus)).is_none());
        assert_eq!(monitor.state(), WatchState::PendingNotification);

        monitor.on_focus_gained(ctx!(watch, prompt, focus));
        assert_eq!(prompt.prompts, 1);

        // The pending change was consumed; another focus gain is quiet
        assert!(monitor.on_focus_gained(ctx!(watch, prompt, focus)).is_none());
        assert_eq!(prompt.prompts, 1);
    }

    #[test]
    fn test_decline_clears_pending_without_reload() {
        let mut watch = MockWatch::default();
        let mut prompt = ScriptedPrompt::answering(ReloadChoice::Keep);
        let focus = FixedFocus(true);
        let mut monitor = bound_monitor(&mut watch, &mut prompt, &focus);

        let request = monitor.on_fs_event(&doc_path(), ctx!(watch, prompt, focus));

        assert_eq!(request, None);
        assert_eq!(prompt.prompts, 1);
        assert_eq!(monitor.state(), WatchState::Idle);
    }

    #[test]
    fn test_event_for_other_path_ignored() {
        let mut watch = MockWatch::default();
        let mut prompt = ScriptedPrompt::answering(ReloadChoice::Reload);
        let focus = FixedFocus(true);
        let mut monitor = bound_monitor(&mut watch, &mut prompt, &focus);

        let request = monitor.on_fs_event(Path::new("/elsewhere.txt"), ctx!(watch, prompt, focus));

        assert_eq!(request, None);
        assert_eq!(prompt.prompts, 0);
        assert_eq!(monitor.state(), WatchState::Idle);
    }

    #[test]
    fn test_rebind_unwatches_old_and_watches_new_once() {
        let mut watch = MockWatch::default();
        let mut prompt = ScriptedPrompt::answering(ReloadChoice::Keep);
        let focus = FixedFocus(true);
        let mut monitor = bound_monitor(&mut watch, &mut prompt, &focus);

        let new_path = PathBuf::from("/home/user/renamed.txt");
        monitor.on_path_changed(&new_path, ctx!(watch, prompt, focus)).unwrap();

        assert_eq!(watch.unwatch_calls, vec![doc_path()]);
        assert_eq!(watch.watch_calls, vec![doc_path(), new_path.clone()]);
        assert!(watch.is_watching(&new_path));
        assert!(!watch.is_watching(&doc_path()));

        // Rebinding to the same path again is a no-op
        monitor.on_path_changed(&new_path, ctx!(watch, prompt, focus)).unwrap();
        assert_eq!(watch.unwatch_calls.len(), 1);
        assert_eq!(watch.watch_calls.len(), 2);
    }

    #[test]
    fn test_rebind_discards_pending_change() {
        let mut watch = MockWatch::default();
        let mut prompt = ScriptedPrompt::answering(ReloadChoice::Reload);
        let focus = FixedFocus(false);
        let mut monitor = bound_monitor(&mut watch, &mut prompt, &focus);

        monitor.on_fs_event(&doc_path(), ctx!(watch, prompt, focus));
        assert_eq!(monitor.state(), WatchState::PendingNotification);

        let new_path = PathBuf::from("/home/user/other.txt");
        monitor.on_path_changed(&new_path, ctx!(watch, prompt, focus)).unwrap();

        // The pending change described the old path
        assert_eq!(monitor.state(), WatchState::Idle);
        assert!(monitor.on_focus_gained(ctx!(watch, prompt, focus)).is_none());
        assert_eq!(prompt.prompts, 0);
    }

    #[test]
    fn test_disable_unwatches_and_resets() {
        let mut watch = MockWatch::default();
        let mut prompt = ScriptedPrompt::answering(ReloadChoice::Reload);
        let focus = FixedFocus(false);
        let mut monitor = bound_monitor(&mut watch, &mut prompt, &focus);

        monitor.on_fs_event(&doc_path(), ctx!(watch, prompt, focus));
        monitor.on_disable(ctx!(watch, prompt, focus));

        assert!(!watch.is_watching(&doc_path()));
        assert!(!monitor.is_active());
        assert_eq!(monitor.state(), WatchState::Idle);

        // Double disable is safe; unwatch is idempotent on the mock too
        monitor.on_disable(ctx!(watch, prompt, focus));
        assert_eq!(monitor.state(), WatchState::Idle);
    }

    #[test]
    fn test_disabled_monitor_ignores_stale_events() {
        let mut watch = MockWatch::default();
        let mut prompt = ScriptedPrompt::answering(ReloadChoice::Reload);
        let focus = FixedFocus(true);
        let mut monitor = bound_monitor(&mut watch, &mut prompt, &focus);

        monitor.on_disable(ctx!(watch, prompt, focus));

        // A worker thread can still deliver an event after teardown
        let request = monitor.on_fs_event(&doc_path(), ctx!(watch, prompt, focus));
        assert_eq!(request, None);
        assert_eq!(monitor.state(), WatchState::Idle);

        assert!(monitor.on_focus_gained(ctx!(watch, prompt, focus)).is_none());
        assert_eq!(prompt.prompts, 0);

        // Re-enabling restores normal delivery
        monitor.on_enable(ctx!(watch, prompt, focus)).unwrap();
        let request = monitor.on_fs_event(&doc_path(), ctx!(watch, prompt, focus));
        assert!(request.is_some());
        assert_eq!(prompt.prompts, 1);
    }

    #[test]
    fn test_failed_registration_leaves_binding_inactive() {
        let mut watch = MockWatch::default();
        let mut prompt = ScriptedPrompt::answering(ReloadChoice::Reload);
        let focus = FixedFocus(true);
        let mut monitor = ChangeWatchMonitor::new();

        monitor.on_enable(ctx!(watch, prompt, focus)).unwrap();
        watch.fail_next = true;
        let result = monitor.on_path_changed(&doc_path(), ctx!(watch, prompt, focus));

        assert!(matches!(result, Err(WatchError::PathMissing(_))));
        assert!(!monitor.is_active());
        assert_eq!(monitor.bound_path(), Some(doc_path().as_path()));

        // The next successful path change recovers
        monitor.on_path_changed(&doc_path(), ctx!(watch, prompt, focus)).unwrap();
        assert!(monitor.is_active());
    }

    #[test]
    fn test_save_is_absorbed_not_prompted() {
        let mut watch = MockWatch::default();
        let mut prompt = ScriptedPrompt::answering(ReloadChoice::Reload);
        let focus = FixedFocus(true);
        let mut monitor = bound_monitor(&mut watch, &mut prompt, &focus);

        monitor.on_saved(ctx!(watch, prompt, focus)).unwrap();
        // The save's own change event arrives
        let request = monitor.on_fs_event(&doc_path(), ctx!(watch, prompt, focus));

        assert_eq!(request, None);
        assert_eq!(prompt.prompts, 0);
        assert_eq!(monitor.state(), WatchState::Idle);

        // A later external change still prompts
        let request = monitor.on_fs_event(&doc_path(), ctx!(watch, prompt, focus));
        assert!(request.is_some());
        assert_eq!(prompt.prompts, 1);
    }

    #[test]
    fn test_binding_before_enable_registers_on_enable() {
        let mut watch = MockWatch::default();
        let mut prompt = ScriptedPrompt::answering(ReloadChoice::Keep);
        let focus = FixedFocus(true);
        let mut monitor = ChangeWatchMonitor::new();

        // Path known before the mode is enabled
        monitor.on_path_changed(&doc_path(), ctx!(watch, prompt, focus)).unwrap();
        assert!(!monitor.is_active());
        assert!(watch.watch_calls.is_empty());

        monitor.on_enable(ctx!(watch, prompt, focus)).unwrap();
        assert!(monitor.is_active());
        assert!(watch.is_watching(&doc_path()));
    }
}
