//! Parser Types
//!
//! Errors reported to callers of `parse`.

use std::fmt;
use thiserror::Error;

use crate::io::BashError;

/// A parse failure with the position of the token that caused it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub struct SyntaxError {
    pub kind: BashError,
    pub line: usize,
    pub column: usize,
    /// Text of the offending token, when there was one
    pub token: Option<String>,
}

impl fmt::Display for SyntaxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.token {
            Some(token) => write!(
                f,
                "{} `{}' at {}:{}",
                self.kind,
                token.escape_debug(),
                self.line,
                self.column
            ),
            None => write!(f, "{} at {}:{}", self.kind, self.line, self.column),
        }
    }
}

impl SyntaxError {
    pub fn new(kind: BashError, line: usize, column: usize) -> Self {
        Self {
            kind,
            line,
            column,
            token: None,
        }
    }

    pub fn with_token(kind: BashError, line: usize, column: usize, token: impl Into<String>) -> Self {
        Self {
            kind,
            line,
            column,
            token: Some(token.into()),
        }
    }
}
