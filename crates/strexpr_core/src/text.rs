//! Byte spans into the expression source.

use std::fmt;
use std::ops::Range;

/// A byte offset into the expression source.
pub type TextPos = u32;

/// `length` bytes of source starting at `start`. Tokens, tree nodes and
/// diagnostics all carry one.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Default)]
pub struct TextSpan {
    pub start: TextPos,
    pub length: TextPos,
}

impl TextSpan {
    #[inline]
    pub fn new(start: TextPos, length: TextPos) -> Self {
        Self { start, length }
    }

    /// The span from `start` up to, not including, `end`.
    #[inline]
    pub fn between(start: TextPos, end: TextPos) -> Self {
        debug_assert!(end >= start);
        Self::new(start, end - start)
    }

    /// A zero-length span, used for the End sentinel and synthesized nodes.
    #[inline]
    pub fn empty(pos: TextPos) -> Self {
        Self::new(pos, 0)
    }

    #[inline]
    pub fn end(&self) -> TextPos {
        self.start + self.length
    }

    /// The smallest span covering both, e.g. an operator node spanning its
    /// two operands.
    pub fn union(&self, other: &TextSpan) -> TextSpan {
        TextSpan::between(self.start.min(other.start), self.end().max(other.end()))
    }

    #[inline]
    pub fn to_range(&self) -> Range<usize> {
        self.start as usize..self.end() as usize
    }

    /// The covered text, or `None` when the span is not on char boundaries of
    /// `source`.
    pub fn snippet<'s>(&self, source: &'s str) -> Option<&'s str> {
        source.get(self.to_range())
    }
}

impl fmt::Debug for TextSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_union_covers_both_operands() {
        let left = TextSpan::new(0, 1);
        let right = TextSpan::between(4, 6);
        let whole = left.union(&right);
        assert_eq!(whole, TextSpan::new(0, 6));
        assert_eq!(right.union(&left), whole);
        assert_eq!(format!("{:?}", whole), "0..6");
    }

    #[test]
    fn test_snippet() {
        let source = "x => x + 1";
        assert_eq!(TextSpan::new(5, 5).snippet(source), Some("x + 1"));
        assert_eq!(TextSpan::empty(10).snippet(source), Some(""));
        assert_eq!(TextSpan::new(8, 9).snippet(source), None);
        assert_eq!(TextSpan::new(1, 1).snippet("é"), None);
    }
}
