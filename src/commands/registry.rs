// src/commands/registry.rs
use std::collections::HashMap;

use super::types::Command;

pub struct CommandRegistry {
    commands: HashMap<String, Box<dyn Command>>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self {
            commands: HashMap::new(),
        }
    }

    pub fn register(&mut self, cmd: Box<dyn Command>) {
        self.commands.insert(cmd.name().to_string(), cmd);
    }

    pub fn get(&self, name: &str) -> Option<&dyn Command> {
        self.commands.get(name).map(|c| c.as_ref())
    }

    /// Registered command names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.commands.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }

    pub fn contains(&self, name: &str) -> bool {
        self.commands.contains_key(name)
    }
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::new()
    }
}

use super::cat::CatCommand;
use super::echo::EchoCommand;
use super::env::EnvCommand;
use super::printf::PrintfCommand;
use super::rev_cmd::RevCommand;
use super::tr::TrCommand;
use super::true_cmd::{FalseCommand, TrueCommand};
use super::wc::WcCommand;

/// Register every bundled command.
pub fn register_builtins(registry: &mut CommandRegistry) {
    registry.register(Box::new(CatCommand));
    registry.register(Box::new(EchoCommand));
    registry.register(Box::new(EnvCommand));
    registry.register(Box::new(FalseCommand));
    registry.register(Box::new(PrintfCommand));
    registry.register(Box::new(RevCommand));
    registry.register(Box::new(TrCommand));
    registry.register(Box::new(TrueCommand));
    registry.register(Box::new(WcCommand));
}

/// A registry holding every bundled command.
pub fn create_builtin_registry() -> CommandRegistry {
    let mut registry = CommandRegistry::new();
    register_builtins(&mut registry);
    registry
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_names() {
        let registry = create_builtin_registry();
        assert_eq!(
            registry.names(),
            vec!["cat", "echo", "env", "false", "printf", "rev", "tr", "true", "wc"]
        );
        assert!(registry.contains("cat"));
        assert!(registry.get("ls").is_none());
    }
}
