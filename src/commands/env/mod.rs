// src/commands/env/mod.rs
use std::collections::BTreeMap;

use async_trait::async_trait;

use crate::commands::{Command, CommandContext, CommandResult};

pub struct EnvCommand;

#[async_trait(?Send)]
impl Command for EnvCommand {
    fn name(&self) -> &'static str {
        "env"
    }

    async fn execute(&self, ctx: CommandContext<'_>) -> CommandResult {
        let args = &ctx.args;
        let mut ignore_env = false;
        let mut unset_vars: Vec<&str> = Vec::new();
        let mut set_vars: Vec<(&str, &str)> = Vec::new();

        let mut i = 0;
        while i < args.len() {
            let arg = args[i].as_str();
            if arg == "-i" || arg == "--ignore-environment" {
                ignore_env = true;
            } else if arg == "-u" {
                i += 1;
                match args.get(i) {
                    Some(name) => unset_vars.push(name),
                    None => return CommandResult::error("env: option requires an argument -- 'u'\n".to_string()),
                }
            } else if let Some(name) = arg.strip_prefix("--unset=") {
                unset_vars.push(name);
            } else if let Some((name, value)) = arg.split_once('=') {
                set_vars.push((name, value));
            } else if arg.starts_with('-') {
                return CommandResult::error(format!("env: invalid option '{}'\n", arg));
            } else {
                // Running a program needs a real process; only listing is supported.
                return CommandResult::with_exit_code(
                    String::new(),
                    format!("env: '{}': cannot run commands\n", arg),
                    126,
                );
            }
            i += 1;
        }

        // Sorted for stable output.
        let mut new_env: BTreeMap<&str, &str> = if ignore_env {
            BTreeMap::new()
        } else {
            ctx.env.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect()
        };
        for name in &unset_vars {
            new_env.remove(name);
        }
        for (name, value) in set_vars {
            new_env.insert(name, value);
        }

        let output: String = new_env
            .iter()
            .map(|(key, value)| format!("{}={}\n", key, value))
            .collect();
        CommandResult::success(output)
    }
}
