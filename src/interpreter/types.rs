//! Interpreter Types
//!
//! The capabilities a script runs against: a `Host` that executes argv and
//! resolves environment variables, a `FileAccess` that hands out virtual
//! files, and the three standard streams.

use async_trait::async_trait;

use crate::io::{FileStream, Reader, Writer};

/// Borrowed standard streams for one node execution.
#[derive(Clone, Copy)]
pub struct Stdio<'a> {
    pub stdin: &'a dyn Reader,
    pub stdout: &'a dyn Writer,
    pub stderr: &'a dyn Writer,
}

impl<'a> Stdio<'a> {
    pub fn new(stdin: &'a dyn Reader, stdout: &'a dyn Writer, stderr: &'a dyn Writer) -> Self {
        Self {
            stdin,
            stdout,
            stderr,
        }
    }

    pub fn with_stdin(self, stdin: &'a dyn Reader) -> Self {
        Self { stdin, ..self }
    }

    pub fn with_stdout(self, stdout: &'a dyn Writer) -> Self {
        Self { stdout, ..self }
    }
}

/// Executes commands on behalf of the interpreter.
#[async_trait(?Send)]
pub trait Host {
    /// Run `argv` (never empty) and return its exit status.
    async fn exec(&self, argv: &[String], stdio: Stdio<'_>) -> i32;

    /// Value of an environment variable; unset reads as empty.
    fn env(&self, name: &str) -> String;
}

/// Resolves names used in redirections to virtual files.
pub trait FileAccess {
    fn get_file(&self, name: &str) -> FileStream;
}
