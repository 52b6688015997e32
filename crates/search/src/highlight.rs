//! Decoration surface seam.
//!
//! The rendering collaborator owns the actual visual overlays; the engine
//! only tracks opaque handles so it can release every decoration before
//! each recomputation (create-on-recompute, release-on-clear).

use std::ops::Range;

/// Opaque handle to one visual highlight, minted by the surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DecorationHandle(pub u64);

/// A display surface that can highlight byte ranges of the document.
///
/// Implemented by the embedding editor's rendering layer. Both methods are
/// infallible: a surface may ignore requests (e.g. while hidden), but the
/// engine's handle bookkeeping must never fail.
pub trait HighlightSurface {
    /// Adds a highlight over the given byte range and returns its handle.
    fn add_highlight(&mut self, range: Range<usize>) -> DecorationHandle;

    /// Removes a previously added highlight.
    ///
    /// Removing a handle that is already gone is a no-op.
    fn remove_highlight(&mut self, handle: DecorationHandle);
}
