//! plume: editing core for a widget-embedded code editor.
//!
//! This crate re-exports the three component crates that together provide
//! incremental search-and-replace and external file-change arbitration for
//! an editor widget:
//!
//! - [`buffer`]: an offset-based [`Document`](buffer::Document) with caret
//!   and selection, reporting every mutation as an [`Edit`](buffer::Edit)
//! - [`search`]: the [`SearchEngine`](search::SearchEngine) that keeps a
//!   highlighted match set current across edits and drives find/replace
//! - [`watch`]: the [`ChangeWatchMonitor`](watch::ChangeWatchMonitor)
//!   state machine that decides when an on-disk change becomes a reload
//!   prompt
//!
//! # Example
//!
//! ```
//! use plume::buffer::Document;
//! use plume::search::{DecorationHandle, HighlightSurface, SearchContext, SearchEngine, SearchQuery};
//!
//! struct NoHighlights;
//!
//! impl HighlightSurface for NoHighlights {
//!     fn add_highlight(&mut self, _range: std::ops::Range<usize>) -> DecorationHandle {
//!         DecorationHandle(0)
//!     }
//!     fn remove_highlight(&mut self, _handle: DecorationHandle) {}
//! }
//!
//! let mut document = Document::from_str("alpha beta alpha");
//! let mut highlights = NoHighlights;
//! let mut engine = SearchEngine::new();
//!
//! let mut ctx = SearchContext {
//!     document: &mut document,
//!     highlights: &mut highlights,
//! };
//! engine.set_query(SearchQuery::new("alpha"), &mut ctx);
//! assert_eq!(engine.match_count(), 2);
//!
//! engine.find_next(&mut ctx);
//! assert_eq!(ctx.document.selection(), Some(0..5));
//! ```

pub use plume_buffer as buffer;
pub use plume_search as search;
pub use plume_watch as watch;
