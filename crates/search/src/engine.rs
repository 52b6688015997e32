//! The search engine: query state, navigation, and replacement.
//!
//! Every public operation funnels buffer/query changes into one
//! clear-decorations / rescan / redraw pass. The pass is gated two ways:
//!
//! - A `(query, document revision)` cache makes the pass idempotent for an
//!   unchanged query+buffer pair, so edits the engine itself performed do
//!   not recompute a second time when the event loop echoes them back.
//! - An explicit [`EnginePhase`] guard rejects nested recomputation. The
//!   borrow checker already rules out most re-entry, but the phase keeps
//!   the "no nested recompute" invariant observable and absorbs recompute
//!   requests an embedder delivers synchronously from inside a pass.

use std::ops::Range;

use log::debug;
use plume_buffer::Document;

use crate::highlight::{DecorationHandle, HighlightSurface};
use crate::matches::MatchSet;
use crate::query::SearchQuery;

/// Mutable access to the engine's collaborators for one operation.
///
/// The embedding editor constructs this per event, borrowing its document
/// and rendering surface for the duration of the call.
pub struct SearchContext<'a> {
    /// The document being searched and edited.
    pub document: &'a mut Document,
    /// The decoration surface highlights are drawn on.
    pub highlights: &'a mut dyn HighlightSurface,
}

/// Internal recomputation state.
///
/// `Recomputing` is only ever observed by code called from inside a
/// recompute pass; any public entry point seeing it bails out instead of
/// nesting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EnginePhase {
    Idle,
    Recomputing,
}

/// Incremental search-and-replace engine for one open document.
///
/// Owns the query snapshot, the match set, and the decoration handles for
/// the current matches. Decorations are released in full before every
/// recomputation and recreated from the fresh match set.
pub struct SearchEngine {
    query: SearchQuery,
    matches: MatchSet,
    decorations: Vec<DecorationHandle>,
    /// The (query, revision) pair the current match set was computed from.
    /// `None` until the first recompute and after `clear`.
    computed_for: Option<(SearchQuery, u64)>,
    phase: EnginePhase,
    /// Fired when the match count changes, with the new count.
    on_match_count_changed: Option<Box<dyn FnMut(usize)>>,
    last_reported_count: usize,
}

impl SearchEngine {
    /// Creates an engine with an empty query and no matches.
    pub fn new() -> Self {
        Self {
            query: SearchQuery::default(),
            matches: MatchSet::default(),
            decorations: Vec::new(),
            computed_for: None,
            phase: EnginePhase::Idle,
            on_match_count_changed: None,
            last_reported_count: 0,
        }
    }

    /// Sets the callback fired when the match count changes.
    ///
    /// The callback receives the new count. It is invoked only on actual
    /// changes, not on every recomputation.
    pub fn set_match_count_callback(&mut self, callback: Box<dyn FnMut(usize)>) {
        self.on_match_count_changed = Some(callback);
    }

    /// Returns the current query snapshot.
    pub fn query(&self) -> &SearchQuery {
        &self.query
    }

    /// Returns the number of matches for the current query.
    pub fn match_count(&self) -> usize {
        self.matches.len()
    }

    /// Returns the match ranges in start order.
    pub fn matches(&self) -> &[Range<usize>] {
        self.matches.ranges()
    }

    /// Installs a new query snapshot and recomputes the match set.
    ///
    /// Idempotent for an unchanged query+buffer pair: the pass is skipped
    /// entirely, so there is no decoration flicker at all in that case.
    pub fn set_query(&mut self, query: SearchQuery, ctx: &mut SearchContext<'_>) {
        self.query = query;
        self.recompute(ctx);
    }

    /// Reacts to an external buffer mutation.
    pub fn buffer_changed(&mut self, ctx: &mut SearchContext<'_>) {
        self.recompute(ctx);
    }

    /// Reacts to an external cursor move.
    ///
    /// Funnels into the same recomputation path as buffer changes; since a
    /// cursor move leaves the revision untouched, the pass reduces to the
    /// idempotence check.
    pub fn cursor_moved(&mut self, ctx: &mut SearchContext<'_>) {
        self.recompute(ctx);
    }

    /// Moves to the nearest match after the caret, wrapping to the buffer
    /// start when none remains. No-op when the match set is empty.
    pub fn find_next(&mut self, ctx: &mut SearchContext<'_>) {
        self.recompute(ctx);
        if self.matches.is_empty() {
            return;
        }
        let from = ctx.document.caret();
        let target = self
            .matches
            .first_at_or_after(from)
            .or_else(|| self.matches.first());
        if let Some(range) = target {
            ctx.document.select(range);
        }
    }

    /// Moves to the nearest match before the current position, wrapping to
    /// the buffer end when none remains. No-op when the match set is empty.
    ///
    /// With an active selection the search continues backward from the
    /// selection start, so repeated calls walk match by match.
    pub fn find_previous(&mut self, ctx: &mut SearchContext<'_>) {
        self.recompute(ctx);
        if self.matches.is_empty() {
            return;
        }
        let from = ctx
            .document
            .selection()
            .map(|r| r.start)
            .unwrap_or_else(|| ctx.document.caret());
        let target = self
            .matches
            .last_starting_before(from)
            .or_else(|| self.matches.last());
        if let Some(range) = target {
            ctx.document.select(range);
        }
    }

    /// Replaces the currently selected match and selects the next one.
    ///
    /// Requires the selection to sit exactly on a match (the state
    /// `find_next`/`find_previous` leave behind); otherwise this is a
    /// no-op. After the splice the match set is recomputed and the next
    /// match from the caret is selected, leaving the buffer ready for a
    /// subsequent replace.
    pub fn replace_one(&mut self, replacement: &str, ctx: &mut SearchContext<'_>) {
        self.recompute(ctx);
        let Some(selected) = ctx.document.selection() else {
            return;
        };
        if !self.matches.contains(&selected) {
            return;
        }

        ctx.document.replace_range(selected, replacement);
        self.recompute(ctx);

        let from = ctx.document.caret();
        let next = self
            .matches
            .first_at_or_after(from)
            .or_else(|| self.matches.first());
        if let Some(range) = next {
            ctx.document.select(range);
        }
    }

    /// Replaces every match in document order.
    ///
    /// Guard: when the replacement cannot reduce the match count (it equals
    /// the pattern under the active comparison), the operation is a no-op
    /// rather than a loop. The sweep resumes scanning after each inserted
    /// replacement, so one sweep always terminates even when the
    /// replacement re-creates occurrences of the pattern.
    pub fn replace_all(&mut self, replacement: &str, ctx: &mut SearchContext<'_>) {
        if self.query.pattern.is_empty() || self.replacement_is_stationary(replacement) {
            return;
        }

        self.recompute(ctx);
        let mut from = 0;
        while let Some(range) = self.matches.first_at_or_after(from) {
            ctx.document.replace_range(range.clone(), replacement);
            from = range.start + replacement.len();
            self.recompute(ctx);
        }
    }

    /// Discards all search state: releases decorations, drops the query
    /// and match set, and resets the count. Called when the search panel
    /// is hidden; nothing is persisted across panel sessions.
    pub fn clear(&mut self, ctx: &mut SearchContext<'_>) {
        self.release_decorations(ctx);
        self.query = SearchQuery::default();
        self.matches = MatchSet::default();
        self.computed_for = None;
        self.report_count();
    }

    /// The clear-decorations / rescan / redraw pass.
    fn recompute(&mut self, ctx: &mut SearchContext<'_>) {
        if self.phase == EnginePhase::Recomputing {
            debug_assert!(false, "nested recomputation rejected");
            return;
        }
        let key = (self.query.clone(), ctx.document.revision());
        if self.computed_for.as_ref() == Some(&key) {
            return;
        }
        self.phase = EnginePhase::Recomputing;

        self.release_decorations(ctx);
        self.matches = MatchSet::scan(ctx.document.text(), &self.query);
        for range in self.matches.ranges() {
            self.decorations.push(ctx.highlights.add_highlight(range.clone()));
        }
        self.computed_for = Some(key);
        debug!(
            "recomputed matches: pattern={:?} count={}",
            self.query.pattern,
            self.matches.len()
        );

        self.phase = EnginePhase::Idle;
        self.report_count();
    }

    fn release_decorations(&mut self, ctx: &mut SearchContext<'_>) {
        for handle in self.decorations.drain(..) {
            ctx.highlights.remove_highlight(handle);
        }
    }

    fn report_count(&mut self) {
        let count = self.matches.len();
        if count != self.last_reported_count {
            self.last_reported_count = count;
            if let Some(cb) = self.on_match_count_changed.as_mut() {
                cb(count);
            }
        }
    }

    /// True when replacing a match with `replacement` cannot change the
    /// match set: the replacement equals the pattern under the active
    /// comparison. Replacing would then re-create the match just removed
    /// and `replace_all` would never make progress.
    fn replacement_is_stationary(&self, replacement: &str) -> bool {
        if self.query.case_sensitive {
            replacement == self.query.pattern
        } else {
            fold_eq(replacement, &self.query.pattern)
        }
    }
}

impl Default for SearchEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// Case-folded string equality, per-character lowercase comparison.
fn fold_eq(a: &str, b: &str) -> bool {
    a.chars()
        .flat_map(char::to_lowercase)
        .eq(b.chars().flat_map(char::to_lowercase))
}
