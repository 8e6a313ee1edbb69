//! Implements support for [`Span`]s that mark locations in source code.

use std::fmt;

/// A location in source code.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Span {
    /// The start offset of the location, inclusive.
    pub start: usize,
    /// The end offset of the location, exclusive.
    pub end: usize,
}

impl Span {
    /// Returns the text covered by the span.
    pub fn text(self, src: &str) -> &str {
        &src[self.start..self.end]
    }
}

impl fmt::Debug for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

impl From<std::ops::Range<usize>> for Span {
    fn from(range: std::ops::Range<usize>) -> Self {
        Span {
            start: range.start,
            end: range.end,
        }
    }
}
