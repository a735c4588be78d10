//! Composer error types.

use std::fmt;

use thiserror::Error;

use strata_value::Value;

/// Composition failed, wholly or partly.
///
/// Errors accumulate with file-path context as composition proceeds, and
/// the best-effort result survives in `partial` — when only one of several
/// imports is missing, everything else has still been merged.
#[derive(Debug, Clone)]
pub struct ComposeError {
    pub errors: Vec<String>,
    /// What composition produced despite the errors.
    pub partial: Value,
}

impl fmt::Display for ComposeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, error) in self.errors.iter().enumerate() {
            if index > 0 {
                writeln!(f)?;
            }
            write!(f, "{}", error)?;
        }
        Ok(())
    }
}

impl std::error::Error for ComposeError {}

/// Errors from applying command-line settings.
#[derive(Debug, Clone, Error)]
pub enum SettingsError {
    /// The value part of `key=value` failed to parse as JSON.
    #[error("Parse error in value for '{setting}': {message}")]
    BadValue { setting: String, message: String },
}
