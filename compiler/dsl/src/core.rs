//! Common items useful for working with Java-- source elements.
use core::fmt;

use serde::{Deserialize, Serialize};

/// Line and column of a syntax element in the source file.
///
/// Both values are 1-indexed. A position of `0:0` means that the parser did
/// not supply a location.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourcePosition {
    pub line: u32,
    pub column: u32,
}

impl SourcePosition {
    pub fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }

    /// Returns true when the parser supplied this position.
    pub fn is_known(&self) -> bool {
        self.line != 0
    }
}

impl fmt::Display for SourcePosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}
