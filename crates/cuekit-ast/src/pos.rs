//! Source positions

use std::fmt;

use serde::{Deserialize, Serialize};

/// A position in a source document
///
/// `line` and `column` are 1-indexed; a zero line marks a position that is
/// not available (e.g. values synthesized by the engine).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Pos {
    /// Byte offset from the start of the document
    pub offset: usize,
    /// Line number (1-indexed)
    pub line: usize,
    /// Column number (1-indexed, in characters)
    pub column: usize,
}

impl Pos {
    /// Create a new position
    pub fn new(offset: usize, line: usize, column: usize) -> Self {
        Self {
            offset,
            line,
            column,
        }
    }

    /// Whether this position points into a real document
    pub fn is_valid(&self) -> bool {
        self.line > 0
    }
}

impl fmt::Display for Pos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_pos_is_invalid() {
        assert!(!Pos::default().is_valid());
        assert!(Pos::new(0, 1, 1).is_valid());
    }

    #[test]
    fn test_pos_display() {
        assert_eq!(Pos::new(12, 3, 7).to_string(), "3:7");
    }
}
