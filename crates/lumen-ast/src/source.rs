//! Source locations.

use std::fmt;

/// A 1-based line/column position in source text.
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub struct Location {
    pub line: u32,
    pub column: u32,
}

impl Location {
    pub const fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

impl Default for Location {
    fn default() -> Self {
        Self { line: 1, column: 1 }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// The half-open source range `[begin, end)` a node was parsed from.
///
/// Nodes synthesized by transforms carry [`Span::default`] or the span of
/// the node they replace.
#[derive(Clone, Copy, Debug, Default, Hash, Eq, PartialEq)]
pub struct Span {
    pub begin: Location,
    pub end: Location,
}

impl Span {
    pub const fn new(begin: Location, end: Location) -> Self {
        Self { begin, end }
    }

    /// Smallest span covering both `self` and `other`.
    pub fn join(self, other: Span) -> Span {
        Span {
            begin: self.begin.min(other.begin),
            end: self.end.max(other.end),
        }
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.begin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_covers_both() {
        let a = Span::new(Location::new(1, 5), Location::new(1, 9));
        let b = Span::new(Location::new(2, 1), Location::new(2, 4));
        let j = a.join(b);
        assert_eq!(j.begin, Location::new(1, 5));
        assert_eq!(j.end, Location::new(2, 4));
        assert_eq!(j.to_string(), "1:5");
    }
}
