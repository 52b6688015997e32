//! plume-buffer: the text document the plume core components operate on.
//!
//! The surrounding editor framework owns the real widget; this crate is the
//! buffer/cursor surface it exposes to the core. The main type is
//! [`Document`], which provides:
//! - Full-text access with a monotonic revision counter
//! - A byte-offset caret, snapped to grapheme cluster boundaries
//! - An anchor/caret selection model
//! - Range replacement that reports what changed
//!
//! # Edit Reporting
//!
//! Mutations do not fire ambient callbacks. Each mutating operation returns
//! an [`Edit`] record, and the embedding event loop routes it to whichever
//! components care (the search engine's recompute path, rendering, etc.).
//! This keeps all core components single-threaded and free of stored
//! closures.
//!
//! # Example
//!
//! ```
//! use plume_buffer::Document;
//!
//! let mut doc = Document::from_str("foo bar foo");
//! doc.select(4..7);
//! assert_eq!(doc.selected_text(), Some("bar"));
//!
//! let edit = doc.replace_range(4..7, "baz");
//! assert_eq!(edit.inserted_len, 3);
//! assert_eq!(doc.text(), "foo baz foo");
//! assert_eq!(doc.caret(), 7); // caret sits after the inserted text
//! ```

mod document;
mod word;

pub use document::{Document, Edit};
pub use word::is_word_char;
