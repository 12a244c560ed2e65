//! Stream Module
//!
//! The cooperative text channels that connect the lexer to its input and
//! commands to each other.

pub mod types;
pub mod stream;
pub mod file_stream;

pub use types::{BashError, Reader, Writer};
pub use stream::Stream;
pub use file_stream::{ChangeHook, FileStream};
