//! Match set computation.
//!
//! A single forward scan over the document text produces the complete,
//! sorted, non-overlapping set of occurrences for one (query, snapshot)
//! pair. Case-insensitive comparison folds character by character instead
//! of lowercasing the whole haystack up front: lowercase forms can have a
//! different UTF-8 length, which would shift every byte offset after them.

use std::ops::Range;

use plume_buffer::is_word_char;

use crate::query::SearchQuery;

/// Ordered, non-overlapping match ranges for one query against one buffer
/// snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchSet {
    ranges: Vec<Range<usize>>,
}

impl MatchSet {
    /// Computes the match set for `query` against `text`.
    ///
    /// An empty pattern yields an empty set; that is a valid input, not an
    /// error. Occurrences never overlap: scanning resumes after the end of
    /// each match.
    pub fn scan(text: &str, query: &SearchQuery) -> Self {
        let mut ranges = Vec::new();
        if query.pattern.is_empty() {
            return Self { ranges };
        }

        let mut at = 0;
        while at < text.len() {
            match match_len_at(text, at, query) {
                Some(len) if word_bounded(text, at, at + len, query) => {
                    ranges.push(at..at + len);
                    at += len;
                }
                _ => {
                    // Advance past one character; `at` is always on a char
                    // boundary here.
                    at += text[at..].chars().next().map_or(1, char::len_utf8);
                }
            }
        }

        Self { ranges }
    }

    /// Returns the number of matches.
    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    /// Returns true if there are no matches.
    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// Returns the match ranges in start order.
    pub fn ranges(&self) -> &[Range<usize>] {
        &self.ranges
    }

    /// Returns the first match starting at or after `offset`.
    pub fn first_at_or_after(&self, offset: usize) -> Option<Range<usize>> {
        self.ranges.iter().find(|r| r.start >= offset).cloned()
    }

    /// Returns the last match starting before `offset`.
    pub fn last_starting_before(&self, offset: usize) -> Option<Range<usize>> {
        self.ranges.iter().rev().find(|r| r.start < offset).cloned()
    }

    /// Returns the first match, if any.
    pub fn first(&self) -> Option<Range<usize>> {
        self.ranges.first().cloned()
    }

    /// Returns the last match, if any.
    pub fn last(&self) -> Option<Range<usize>> {
        self.ranges.last().cloned()
    }

    /// Returns true if `range` is exactly one of the matches.
    pub fn contains(&self, range: &Range<usize>) -> bool {
        // Ranges are sorted by start, so a binary search would do, but the
        // set is small (one open document).
        self.ranges.iter().any(|r| r == range)
    }
}

/// Returns the byte length of a match of `query.pattern` at `at`, or `None`
/// if the text does not match there.
///
/// The returned length is measured in haystack bytes, which can differ from
/// the pattern length under case folding.
fn match_len_at(text: &str, at: usize, query: &SearchQuery) -> Option<usize> {
    let mut hay = text[at..].chars();
    let mut consumed = 0;
    for pc in query.pattern.chars() {
        let hc = hay.next()?;
        let eq = if query.case_sensitive {
            hc == pc
        } else {
            hc.to_lowercase().eq(pc.to_lowercase())
        };
        if !eq {
            return None;
        }
        consumed += hc.len_utf8();
    }
    Some(consumed)
}

/// Checks the whole-word constraint for a candidate match.
fn word_bounded(text: &str, start: usize, end: usize, query: &SearchQuery) -> bool {
    if !query.whole_word {
        return true;
    }
    let start_ok = start == 0
        || !text[..start].chars().next_back().map_or(false, is_word_char);
    let end_ok = end >= text.len()
        || !text[end..].chars().next().map_or(false, is_word_char);
    start_ok && end_ok
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scan(text: &str, query: &SearchQuery) -> Vec<Range<usize>> {
        MatchSet::scan(text, query).ranges().to_vec()
    }

    #[test]
    fn test_empty_pattern_matches_nothing() {
        let set = MatchSet::scan("hello", &SearchQuery::new(""));
        assert!(set.is_empty());
        assert_eq!(set.len(), 0);
    }

    #[test]
    fn test_basic_occurrences() {
        let q = SearchQuery::new("foo");
        assert_eq!(scan("foo bar foo", &q), vec![0..3, 8..11]);
    }

    #[test]
    fn test_case_insensitive_by_default() {
        let q = SearchQuery::new("hello");
        assert_eq!(scan("Hello HELLO hello", &q).len(), 3);
    }

    #[test]
    fn test_case_sensitive() {
        let q = SearchQuery::new("Hello").case_sensitive(true);
        assert_eq!(scan("Hello HELLO hello", &q), vec![0..5]);
    }

    #[test]
    fn test_whole_word() {
        let q = SearchQuery::new("test").whole_word(true);
        // "testing" and "tested" must not match
        assert_eq!(scan("test testing tested test", &q), vec![0..4, 20..24]);
    }

    #[test]
    fn test_whole_word_underscore_is_word_char() {
        let q = SearchQuery::new("test").whole_word(true);
        assert_eq!(scan("test test_case _test", &q), vec![0..4]);
    }

    #[test]
    fn test_whole_word_at_buffer_edges() {
        let q = SearchQuery::new("ab").whole_word(true);
        assert_eq!(scan("ab", &q), vec![0..2]);
        assert_eq!(scan("ab ab", &q), vec![0..2, 3..5]);
    }

    #[test]
    fn test_whole_word_punctuation_boundary() {
        let q = SearchQuery::new("foo").whole_word(true);
        assert_eq!(scan("(foo) foo.bar", &q), vec![1..4, 6..9]);
    }

    #[test]
    fn test_occurrences_do_not_overlap() {
        let q = SearchQuery::new("aa");
        assert_eq!(scan("aaaa", &q), vec![0..2, 2..4]);
        assert_eq!(scan("aaa", &q), vec![0..2]);
    }

    #[test]
    fn test_unicode_pattern() {
        let q = SearchQuery::new("日本");
        assert_eq!(scan("日本語 日本", &q), vec![0..6, 10..16]);
    }

    #[test]
    fn test_case_insensitive_non_ascii() {
        let q = SearchQuery::new("é");
        assert_eq!(scan("É e é", &q).len(), 2);
    }

    #[test]
    fn test_pattern_longer_than_text() {
        let q = SearchQuery::new("abcdef");
        assert!(scan("abc", &q).is_empty());
    }

    #[test]
    fn test_first_at_or_after_and_wrap_helpers() {
        let set = MatchSet::scan("foo bar foo", &SearchQuery::new("foo"));
        assert_eq!(set.first_at_or_after(0), Some(0..3));
        assert_eq!(set.first_at_or_after(1), Some(8..11));
        assert_eq!(set.first_at_or_after(9), None);
        assert_eq!(set.last_starting_before(8), Some(0..3));
        assert_eq!(set.last_starting_before(0), None);
        assert_eq!(set.first(), Some(0..3));
        assert_eq!(set.last(), Some(8..11));
    }

    #[test]
    fn test_contains_exact_ranges_only() {
        let set = MatchSet::scan("foo bar foo", &SearchQuery::new("foo"));
        assert!(set.contains(&(0..3)));
        assert!(set.contains(&(8..11)));
        assert!(!set.contains(&(0..2)));
        assert!(!set.contains(&(4..7)));
    }
}
