// src/commands/types.rs
use std::collections::HashMap;

use async_trait::async_trait;

use crate::fs::MemoryFiles;
use crate::interpreter::Stdio;
use crate::io::{BashError, Reader};

/// Buffered output of a command. Commands that stream write to
/// `ctx.stdio` directly and leave these empty.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommandResult {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
}

impl CommandResult {
    pub fn success(stdout: String) -> Self {
        Self { stdout, stderr: String::new(), exit_code: 0 }
    }

    pub fn error(stderr: String) -> Self {
        Self { stdout: String::new(), stderr, exit_code: 1 }
    }

    pub fn with_exit_code(stdout: String, stderr: String, exit_code: i32) -> Self {
        Self { stdout, stderr, exit_code }
    }
}

/// What a command sees while it runs.
pub struct CommandContext<'a> {
    pub args: Vec<String>,
    pub stdio: Stdio<'a>,
    pub env: &'a HashMap<String, String>,
    pub files: &'a MemoryFiles,
}

impl CommandContext<'_> {
    /// Read stdin until the writer closes it.
    pub async fn read_stdin(&self) -> Result<String, BashError> {
        let mut input = String::new();
        loop {
            match self.stdio.stdin.read().await {
                Ok(chunk) => input.push_str(&chunk),
                Err(e) if e.is_end() => return Ok(input),
                Err(e) => return Err(e),
            }
        }
    }

    /// Contents of the named inputs, with `-` meaning stdin. Reads stdin
    /// alone when no names are given.
    pub async fn read_inputs(&self, name: &str, inputs: &[String]) -> Result<String, String> {
        if inputs.is_empty() {
            return self.read_stdin().await.map_err(|e| format!("{}: {}\n", name, e));
        }
        let mut content = String::new();
        for input in inputs {
            if input == "-" {
                let stdin = self.read_stdin().await.map_err(|e| format!("{}: {}\n", name, e))?;
                content.push_str(&stdin);
            } else {
                match self.files.read(input) {
                    Some(text) => content.push_str(&text),
                    None => return Err(format!("{}: {}: No such file or directory\n", name, input)),
                }
            }
        }
        Ok(content)
    }
}

/// A built-in command of the bundled host.
#[async_trait(?Send)]
pub trait Command {
    fn name(&self) -> &'static str;
    async fn execute(&self, ctx: CommandContext<'_>) -> CommandResult;
}
