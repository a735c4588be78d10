//! Reader diagnostics.

use std::fmt;

use thiserror::Error;

/// A single problem found while reading JSON, located by 1-based line and
/// column.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Line {line}, Column {column}: {message}")]
pub struct Diagnostic {
    pub message: String,
    pub line: usize,
    pub column: usize,
}

/// All problems found in one document. The reader recovers by skipping to
/// the enclosing close bracket, so several independent diagnostics can be
/// collected from a single run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseErrors {
    pub diagnostics: Vec<Diagnostic>,
}

impl ParseErrors {
    /// Line of the first diagnostic, for tools that show a single location.
    pub fn first_line(&self) -> Option<usize> {
        self.diagnostics.first().map(|d| d.line)
    }
}

impl fmt::Display for ParseErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, diagnostic) in self.diagnostics.iter().enumerate() {
            if index > 0 {
                writeln!(f)?;
            }
            write!(f, "* {}", diagnostic)?;
        }
        Ok(())
    }
}

impl std::error::Error for ParseErrors {}
