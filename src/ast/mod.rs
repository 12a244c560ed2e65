//! Abstract Syntax Tree (AST)
//!
//! Architecture:
//!   Input → Stream → Scanner → Lexer → Parser → AST → Interpreter → exit status

pub mod types;

pub use types::{Ast, JoinOp, Node, NodeId, NodeKind, Script, SubStyle, WordClass};
