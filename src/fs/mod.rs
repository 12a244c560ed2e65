//! File System Module
//!
//! Virtual files backing redirections and file-reading commands.

pub mod memory_files;

pub use memory_files::MemoryFiles;
