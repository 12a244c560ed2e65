//! Bash Environment
//!
//! Main entry point for embedders. Ties together the parser, the
//! interpreter, the bundled commands and the in-memory files, and acts as
//! the interpreter's `Host`.

use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::commands::{create_builtin_registry, Command, CommandContext, CommandRegistry};
use crate::fs::MemoryFiles;
use crate::interpreter::{Host, Interpreter, Stdio};
use crate::io::{Stream, Writer};

/// Exit status for a command the registry does not know.
pub const COMMAND_NOT_FOUND: i32 = 127;

/// Exit status for a script that does not parse.
pub const SYNTAX_ERROR: i32 = 2;

/// Options for creating a Bash environment.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct BashOptions {
    /// Environment variables
    pub env: HashMap<String, String>,
    /// Initial virtual files, by name
    pub files: HashMap<String, String>,
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

impl BashOptions {
    /// Parse options from TOML:
    ///
    /// ```toml
    /// [env]
    /// HOME = "/home/user"
    ///
    /// [files]
    /// "greeting.txt" = "hello\n"
    /// ```
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Read options from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml(&text)
    }
}

/// Collected output of one `exec`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecResult {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
}

impl ExecResult {
    pub fn new(stdout: String, stderr: String, exit_code: i32) -> Self {
        Self { stdout, stderr, exit_code }
    }

    pub fn ok() -> Self {
        Self::default()
    }
}

/// The main Bash shell environment.
pub struct Bash {
    env: HashMap<String, String>,
    files: MemoryFiles,
    registry: CommandRegistry,
    cancel: Option<CancellationToken>,
}

impl Bash {
    /// Create a new Bash environment.
    pub fn new(options: BashOptions) -> Self {
        let mut env = HashMap::new();
        env.insert("HOME".to_string(), "/home/user".to_string());
        env.insert("PATH".to_string(), "/usr/bin:/bin".to_string());
        env.extend(options.env);

        Self {
            env,
            files: MemoryFiles::with_files(options.files),
            registry: create_builtin_registry(),
            cancel: None,
        }
    }

    /// Stop starting commands, and give up pending reads, once `token` fires.
    pub fn with_cancel(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Add or replace a command.
    pub fn register(&mut self, cmd: Box<dyn Command>) {
        self.registry.register(cmd);
    }

    /// Execute a script with empty stdin.
    pub async fn exec(&self, script: &str) -> ExecResult {
        self.exec_with_input(script, "").await
    }

    /// Execute a script. The reported status is that of the last statement;
    /// a script that does not parse reports `SYNTAX_ERROR`.
    pub async fn exec_with_input(&self, script: &str, input: &str) -> ExecResult {
        if script.trim().is_empty() {
            return ExecResult::ok();
        }

        let parsed = match crate::parser::parse(script).await {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::debug!(error = %e, "parse failed");
                return ExecResult::new(
                    String::new(),
                    format!("bashlet: syntax error: {}\n", e),
                    SYNTAX_ERROR,
                );
            }
        };

        let stdin = Stream::from_text(input);
        let stdout = Stream::new();
        let stderr = Stream::new();
        let mut interpreter = Interpreter::new(parsed.ast(), self, &self.files);
        if let Some(token) = &self.cancel {
            interpreter = interpreter.with_cancel(token.clone());
        }
        let exit_code = interpreter
            .run_all(Stdio::new(&stdin, &stdout, &stderr))
            .await;

        ExecResult::new(
            stdout.read_sync().unwrap_or_default(),
            stderr.read_sync().unwrap_or_default(),
            exit_code,
        )
    }

    pub fn files(&self) -> &MemoryFiles {
        &self.files
    }

    /// Read a virtual file.
    pub fn read_file(&self, name: &str) -> Option<String> {
        self.files.read(name)
    }

    /// Write a virtual file.
    pub fn write_file(&self, name: &str, content: &str) {
        self.files.write(name, content);
    }

    /// Get environment variables.
    pub fn get_env(&self) -> &HashMap<String, String> {
        &self.env
    }

    pub fn set_env(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.env.insert(name.into(), value.into());
    }
}

#[async_trait(?Send)]
impl Host for Bash {
    async fn exec(&self, argv: &[String], stdio: Stdio<'_>) -> i32 {
        let Some(cmd) = self.registry.get(&argv[0]) else {
            let _ = stdio
                .stderr
                .write(&format!("bashlet: {}: command not found\n", argv[0]));
            return COMMAND_NOT_FOUND;
        };

        let ctx = CommandContext {
            args: argv[1..].to_vec(),
            stdio,
            env: &self.env,
            files: &self.files,
        };
        let result = cmd.execute(ctx).await;
        if !result.stdout.is_empty() {
            let _ = stdio.stdout.write(&result.stdout);
        }
        if !result.stderr.is_empty() {
            let _ = stdio.stderr.write(&result.stderr);
        }
        result.exit_code
    }

    fn env(&self, name: &str) -> String {
        self.env.get(name).cloned().unwrap_or_default()
    }
}
