//! Stream Types
//!
//! The error taxonomy shared by streams, the lexer and the parser, and the
//! reader/writer capabilities handed to commands.

use async_trait::async_trait;
use thiserror::Error;

/// Errors surfaced by streams, the lexer and the parser.
///
/// `Eof` and `Closed` are expected termination signals; the boundary that
/// expects them filters them out.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum BashError {
    #[error("end of stream")]
    Eof,

    #[error("stream closed")]
    Closed,

    #[error("unexpected end of input")]
    UnexpectedEof,

    #[error("unexpected token")]
    UnexpectedToken,

    #[error("unknown error")]
    UnknownError,

    #[error("unknown token")]
    UnknownToken,

    #[error("operation cancelled")]
    Cancelled,
}

impl BashError {
    /// True for the errors that mean "no more input".
    pub fn is_end(&self) -> bool {
        matches!(self, BashError::Eof | BashError::Closed)
    }
}

/// Read side of a stream.
#[async_trait(?Send)]
pub trait Reader {
    /// Drain everything currently buffered, suspending while empty.
    async fn read(&self) -> Result<String, BashError>;

    /// Consume the next character.
    async fn read_char(&self) -> Result<char, BashError>;

    /// Inspect the next character without consuming it.
    async fn peek(&self) -> Result<char, BashError>;
}

/// Write side of a stream.
pub trait Writer {
    fn write(&self, s: &str) -> Result<(), BashError>;
}
