// src/commands/mod.rs
pub mod cat;
pub mod echo;
pub mod escapes;
pub mod env;
pub mod printf;
pub mod registry;
pub mod rev_cmd;
pub mod tr;
pub mod true_cmd;
pub mod types;
pub mod wc;

pub use registry::{create_builtin_registry, CommandRegistry};
pub use types::{Command, CommandContext, CommandResult};
