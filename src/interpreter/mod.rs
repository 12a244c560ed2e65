//! Interpreter module
//!
//! Executes a parsed `Script` against embedder-supplied capabilities.

pub mod interpreter;
pub mod types;
pub mod word_split;

pub use interpreter::{Interpreter, CANCELLED_STATUS};
pub use types::{FileAccess, Host, Stdio};
pub use word_split::{join_words, split_words, WordSegment};
