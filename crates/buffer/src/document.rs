//! Document is the buffer/cursor surface consumed by the core components.
//!
//! Offsets are byte offsets into UTF-8 text. Every offset accepted from a
//! caller is clamped to the document and snapped to a grapheme cluster
//! boundary, so no operation can slice inside a cluster.

use std::ops::Range;

use unicode_segmentation::UnicodeSegmentation;

/// Record of a single range replacement.
///
/// Mutations return this instead of firing callbacks; the embedding event
/// loop forwards it to components that need to react (search recompute,
/// rendering, ...).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edit {
    /// The byte range that was removed (before the edit).
    pub range: Range<usize>,
    /// Byte length of the text inserted in its place.
    pub inserted_len: usize,
}

/// A text document with a byte-offset caret and an anchor/caret selection.
///
/// The caret and the selection anchor are always on grapheme cluster
/// boundaries. The revision counter increments on every content mutation,
/// letting consumers cheaply detect "same buffer snapshot".
#[derive(Debug, Clone)]
pub struct Document {
    text: String,
    caret: usize,
    /// Selection anchor. When `Some` and different from the caret, the
    /// selection spans between the two (either order).
    selection_anchor: Option<usize>,
    revision: u64,
}

impl Document {
    /// Creates an empty document.
    pub fn new() -> Self {
        Self {
            text: String::new(),
            caret: 0,
            selection_anchor: None,
            revision: 0,
        }
    }

    /// Creates a document initialized with the given content.
    ///
    /// The caret starts at offset 0 with no selection.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Self {
        Self {
            text: content.to_string(),
            caret: 0,
            selection_anchor: None,
            revision: 0,
        }
    }

    // ==================== Accessors ====================

    /// Returns the full document text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Returns the document length in bytes.
    pub fn len(&self) -> usize {
        self.text.len()
    }

    /// Returns true if the document is empty.
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Returns the revision counter.
    ///
    /// Increments on every content mutation. Cursor and selection changes
    /// do not affect it.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Returns the caret byte offset.
    pub fn caret(&self) -> usize {
        self.caret
    }

    // ==================== Caret ====================

    /// Moves the caret to `offset`, clamped and snapped to a grapheme
    /// boundary. Clears the selection.
    pub fn set_caret(&mut self, offset: usize) {
        self.caret = self.snap(offset);
        self.selection_anchor = None;
    }

    /// Moves the caret to the start of the document. Clears the selection.
    pub fn move_to_start(&mut self) {
        self.set_caret(0);
    }

    /// Moves the caret to the end of the document. Clears the selection.
    pub fn move_to_end(&mut self) {
        self.set_caret(self.text.len());
    }

    // ==================== Selection ====================

    /// Selects the given byte range.
    ///
    /// The anchor is placed at the range start and the caret at the range
    /// end, so navigation continues from the end of the selection. Both
    /// endpoints are clamped and snapped.
    pub fn select(&mut self, range: Range<usize>) {
        let start = self.snap(range.start);
        let end = self.snap(range.end.max(range.start));
        self.selection_anchor = Some(start);
        self.caret = end;
    }

    /// Returns the selection as an ordered byte range, or `None` when the
    /// anchor is unset or coincides with the caret.
    pub fn selection(&self) -> Option<Range<usize>> {
        let anchor = self.selection_anchor?;
        if anchor == self.caret {
            return None;
        }
        if anchor < self.caret {
            Some(anchor..self.caret)
        } else {
            Some(self.caret..anchor)
        }
    }

    /// Returns true if there is an active selection.
    pub fn has_selection(&self) -> bool {
        self.selection().is_some()
    }

    /// Returns the selected text, or `None` when nothing is selected.
    pub fn selected_text(&self) -> Option<&str> {
        let range = self.selection()?;
        Some(&self.text[range])
    }

    /// Clears the selection, leaving the caret in place.
    pub fn clear_selection(&mut self) {
        self.selection_anchor = None;
    }

    // ==================== Mutation ====================

    /// Replaces the given byte range with `replacement`.
    ///
    /// The range is clamped and snapped to grapheme boundaries. After the
    /// edit the caret sits at the end of the inserted text and the
    /// selection is cleared. An empty range is a pure insertion.
    ///
    /// # Returns
    ///
    /// An [`Edit`] record describing the snapped range that was removed and
    /// the length of the inserted text.
    pub fn replace_range(&mut self, range: Range<usize>, replacement: &str) -> Edit {
        let start = self.snap(range.start);
        let end = self.snap(range.end.max(range.start));

        self.text.replace_range(start..end, replacement);
        self.caret = start + replacement.len();
        self.selection_anchor = None;
        self.revision += 1;

        Edit {
            range: start..end,
            inserted_len: replacement.len(),
        }
    }

    /// Inserts text at the caret position.
    ///
    /// Replaces the selection when one is active, matching how typing
    /// behaves in the editor widget.
    pub fn insert(&mut self, s: &str) -> Edit {
        let range = self.selection().unwrap_or(self.caret..self.caret);
        self.replace_range(range, s)
    }

    /// Snaps an offset to the nearest grapheme cluster boundary at or
    /// before it, clamping to the document length.
    fn snap(&self, offset: usize) -> usize {
        if offset >= self.text.len() {
            return self.text.len();
        }
        let mut last_start = 0;
        for (start, _) in self.text.grapheme_indices(true) {
            if start == offset {
                return offset;
            }
            if start > offset {
                break;
            }
            last_start = start;
        }
        last_start
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}
