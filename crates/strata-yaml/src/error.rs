//! Error type shared by the reader, scanner, parser and loader.

use std::fmt;

use crate::mark::Mark;

/// Result type alias for strata-yaml operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Which stage of the pipeline reported the error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed or over-long byte input.
    Reader,
    /// Token-level problem: bad indentation, escapes, directives, ...
    Scanner,
    /// Grammar-level problem: unexpected token for the current state.
    Parser,
    /// Event-to-value problem: unknown alias, bad merge key, ...
    Loader,
}

/// A single diagnostic. Each pipeline run surfaces at most one error and
/// halts; there is no recovery inside the YAML pipeline.
#[derive(Debug, Clone)]
pub struct Error {
    pub kind: ErrorKind,
    /// What went wrong, e.g. `could not find expected ':'`.
    pub problem: String,
    pub problem_mark: Mark,
    /// What the scanner/parser was in the middle of, e.g.
    /// `while scanning a block scalar`.
    pub context: Option<&'static str>,
    pub context_mark: Option<Mark>,
    /// Byte offset of the problem, for reader errors.
    pub offset: Option<usize>,
    /// The offending byte or code unit, for reader errors.
    pub value: Option<u32>,
}

impl Error {
    pub(crate) fn reader(problem: impl Into<String>, offset: usize, value: Option<u32>) -> Error {
        Error {
            kind: ErrorKind::Reader,
            problem: problem.into(),
            problem_mark: Mark::default(),
            context: None,
            context_mark: None,
            offset: Some(offset),
            value,
        }
    }

    pub(crate) fn scanner(
        context: Option<&'static str>,
        context_mark: Mark,
        problem: impl Into<String>,
        problem_mark: Mark,
    ) -> Error {
        Error {
            kind: ErrorKind::Scanner,
            problem: problem.into(),
            problem_mark,
            context,
            context_mark: context.map(|_| context_mark),
            offset: None,
            value: None,
        }
    }

    pub(crate) fn parser(problem: impl Into<String>, problem_mark: Mark) -> Error {
        Error {
            kind: ErrorKind::Parser,
            problem: problem.into(),
            problem_mark,
            context: None,
            context_mark: None,
            offset: None,
            value: None,
        }
    }

    pub(crate) fn parser_context(
        context: &'static str,
        context_mark: Mark,
        problem: impl Into<String>,
        problem_mark: Mark,
    ) -> Error {
        Error {
            kind: ErrorKind::Parser,
            problem: problem.into(),
            problem_mark,
            context: Some(context),
            context_mark: Some(context_mark),
            offset: None,
            value: None,
        }
    }

    pub(crate) fn loader(problem: impl Into<String>, problem_mark: Mark) -> Error {
        Error {
            kind: ErrorKind::Loader,
            problem: problem.into(),
            problem_mark,
            context: None,
            context_mark: None,
            offset: None,
            value: None,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(context) = self.context {
            write!(f, "{}", context)?;
            if let Some(mark) = self.context_mark {
                write!(f, " at {}", mark)?;
            }
            write!(f, ": ")?;
        }

        write!(f, "{}", self.problem)?;

        if let Some(offset) = self.offset {
            write!(f, " at byte {}", offset)?;
            if let Some(value) = self.value {
                write!(f, " (#{:X})", value)?;
            }
        } else {
            write!(f, " at {}", self.problem_mark)?;
        }

        Ok(())
    }
}

impl std::error::Error for Error {}
