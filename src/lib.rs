//! bashlet - a small shell-script front end
//!
//! Scripts are scanned, tokenized and parsed into an AST, then executed
//! against an embedder-supplied `Host` (runs argv, resolves variables) and
//! `FileAccess` (hands out virtual files). `Bash` bundles both with a set of
//! built-in commands and in-memory files.
//!
//! ```no_run
//! # async fn demo() {
//! use bashlet::{Bash, BashOptions};
//!
//! let bash = Bash::new(BashOptions::default());
//! let result = bash.exec("echo hello | rev > out.txt; cat out.txt").await;
//! assert_eq!(result.stdout, "olleh\n");
//! # }
//! ```

pub mod ast;
pub mod bash;
pub mod commands;
pub mod fs;
pub mod interpreter;
pub mod io;
pub mod parser;

pub use ast::{Ast, NodeId, NodeKind, Script};
pub use bash::{Bash, BashOptions, ExecResult};
pub use fs::MemoryFiles;
pub use interpreter::{FileAccess, Host, Interpreter, Stdio};
pub use io::{BashError, FileStream, Reader, Stream, Writer};
pub use parser::{parse, Parser, SyntaxError};
