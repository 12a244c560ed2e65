//! Parser module for shell scripts
//!
//! Characters flow Scanner → Lexer → Parser; the result is a `Script`.

pub mod types;
pub mod scanner;
pub mod lexer;
pub mod parser;

// Re-exports
pub use types::SyntaxError;
pub use scanner::Scanner;
pub use lexer::{Lexer, Token, TokenKind};
pub use parser::{parse, parse_token, Parser};
