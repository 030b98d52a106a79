//! Text spans and page ranges locating a clause in its source document.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::foundation::ValidationError;

/// Half-open byte range `[start, end)` into a text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TextSpan {
    start: usize,
    end: usize,
}

impl TextSpan {
    /// Creates a span, rejecting `end < start`.
    pub fn new(start: usize, end: usize) -> Result<Self, ValidationError> {
        if end < start {
            return Err(ValidationError::invalid_format(
                "span",
                format!("end {} precedes start {}", end, start),
            ));
        }
        Ok(Self { start, end })
    }

    /// Span covering the whole of `text`.
    pub fn covering(text: &str) -> Self {
        Self {
            start: 0,
            end: text.len(),
        }
    }

    pub fn start(&self) -> usize {
        self.start
    }

    pub fn end(&self) -> usize {
        self.end
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Moves the span forward by `offset` bytes.
    pub fn shifted(&self, offset: usize) -> Self {
        Self {
            start: self.start + offset,
            end: self.end + offset,
        }
    }

    /// Returns true if the two spans share at least one byte.
    pub fn overlaps(&self, other: &TextSpan) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// Slices `text` by this span, `None` if out of bounds or not on a char boundary.
    pub fn slice<'a>(&self, text: &'a str) -> Option<&'a str> {
        text.get(self.start..self.end)
    }
}

impl fmt::Display for TextSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

/// Inclusive page range of a clause, as reported by layout parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRange {
    first: u32,
    last: u32,
}

impl PageRange {
    pub fn new(first: u32, last: u32) -> Result<Self, ValidationError> {
        if first == 0 || last < first {
            return Err(ValidationError::invalid_format(
                "pages",
                format!("invalid page range {}-{}", first, last),
            ));
        }
        Ok(Self { first, last })
    }

    pub fn first(&self) -> u32 {
        self.first
    }

    pub fn last(&self) -> u32 {
        self.last
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn span_rejects_reversed_bounds() {
        assert!(TextSpan::new(5, 3).is_err());
        assert!(TextSpan::new(3, 3).unwrap().is_empty());
    }

    #[test]
    fn span_slice_respects_bounds() {
        let span = TextSpan::new(4, 9).unwrap();
        assert_eq!(span.slice("the tenant pays"), Some("tenan"));
        assert_eq!(TextSpan::new(10, 40).unwrap().slice("short"), None);
    }

    #[test]
    fn span_slice_rejects_non_char_boundary() {
        let span = TextSpan::new(0, 1).unwrap();
        assert_eq!(span.slice("é"), None);
    }

    #[test]
    fn shifted_and_overlaps() {
        let a = TextSpan::new(0, 5).unwrap().shifted(10);
        assert_eq!((a.start(), a.end()), (10, 15));
        assert!(a.overlaps(&TextSpan::new(14, 20).unwrap()));
        assert!(!a.overlaps(&TextSpan::new(15, 20).unwrap()));
    }

    #[test]
    fn page_range_validates() {
        assert!(PageRange::new(0, 1).is_err());
        assert!(PageRange::new(3, 2).is_err());
        assert_eq!(PageRange::new(2, 4).unwrap().last(), 4);
    }
}
