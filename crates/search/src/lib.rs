//! plume-search: incremental search-and-replace for a single open document.
//!
//! The engine locates, counts, highlights, and replaces occurrences of a
//! pattern in a [`plume_buffer::Document`], staying consistent with edits
//! made while the search panel is open.
//!
//! # Architecture
//!
//! [`SearchEngine`] owns the query snapshot, the computed match set, and
//! the decoration handles for the current matches. It never touches
//! rendering: highlights go through the caller-supplied
//! [`HighlightSurface`], which hands back opaque [`DecorationHandle`]s.
//!
//! The match set is recomputed wholesale whenever the query or the buffer
//! changes. Match counts are small (one open document), and full
//! recomputation is trivially correct under arbitrary concurrent edits,
//! where incremental patching would not be.
//!
//! All operations receive a [`SearchContext`] bundling mutable access to
//! the document and the highlight surface, the same shape the editor uses
//! for its event-handler contexts.

mod engine;
mod highlight;
mod matches;
mod query;

pub use engine::{SearchContext, SearchEngine};
pub use highlight::{DecorationHandle, HighlightSurface};
pub use matches::MatchSet;
pub use query::SearchQuery;
