//! Word-character classification shared by the document and the search
//! engine's whole-word matching.
//!
//! The classification must be a single source of truth: whole-word search
//! boundaries have to agree with whatever the text model considers a word,
//! or "whole word" matches drift from word-wise cursor movement.

/// Returns true if `c` belongs to a word.
///
/// Words are runs of alphanumeric characters and underscores, the usual
/// identifier-shaped definition. Everything else (whitespace, punctuation,
/// symbols) is a word boundary.
pub fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}
