// src/commands/echo/mod.rs
use async_trait::async_trait;

use crate::commands::escapes::unescape;
use crate::commands::{Command, CommandContext, CommandResult};

pub struct EchoCommand;

#[async_trait(?Send)]
impl Command for EchoCommand {
    fn name(&self) -> &'static str {
        "echo"
    }

    async fn execute(&self, ctx: CommandContext<'_>) -> CommandResult {
        let args = &ctx.args;
        let mut no_newline = false;
        let mut interpret_escapes = false;
        let mut start_index = 0;

        // Leading flag words; the first non-flag ends option parsing.
        while let Some(arg) = args.get(start_index) {
            let flags = match arg.strip_prefix('-') {
                Some(f) if !f.is_empty() && f.chars().all(|c| matches!(c, 'n' | 'e' | 'E')) => f,
                _ => break,
            };
            for flag in flags.chars() {
                match flag {
                    'n' => no_newline = true,
                    'e' => interpret_escapes = true,
                    _ => interpret_escapes = false,
                }
            }
            start_index += 1;
        }

        let mut output = args[start_index..].join(" ");

        if interpret_escapes {
            let result = unescape(&output);
            if result.stop {
                return CommandResult::success(result.output);
            }
            output = result.output;
        }

        if !no_newline {
            output.push('\n');
        }

        CommandResult::success(output)
    }
}
