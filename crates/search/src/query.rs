//! Search query snapshot.

/// An immutable snapshot of the search panel's input state.
///
/// A new snapshot is taken whenever any field changes; the engine compares
/// snapshots to decide whether a recomputation is needed.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SearchQuery {
    /// The literal pattern to search for. Empty patterns are valid and
    /// match nothing.
    pub pattern: String,
    /// Exact comparison when true, per-character case folding when false.
    pub case_sensitive: bool,
    /// Require non-word characters (or buffer edges) adjacent to both ends
    /// of a match.
    pub whole_word: bool,
}

impl SearchQuery {
    /// Creates a query with both options off.
    pub fn new(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            case_sensitive: false,
            whole_word: false,
        }
    }

    /// Builder-style toggle for case-sensitive matching.
    pub fn case_sensitive(mut self, on: bool) -> Self {
        self.case_sensitive = on;
        self
    }

    /// Builder-style toggle for whole-word matching.
    pub fn whole_word(mut self, on: bool) -> Self {
        self.whole_word = on;
        self
    }
}
