use async_trait::async_trait;

use crate::commands::{Command, CommandContext, CommandResult};

pub struct TrueCommand;

#[async_trait(?Send)]
impl Command for TrueCommand {
    fn name(&self) -> &'static str {
        "true"
    }

    async fn execute(&self, _ctx: CommandContext<'_>) -> CommandResult {
        CommandResult::success(String::new())
    }
}

pub struct FalseCommand;

#[async_trait(?Send)]
impl Command for FalseCommand {
    fn name(&self) -> &'static str {
        "false"
    }

    async fn execute(&self, _ctx: CommandContext<'_>) -> CommandResult {
        CommandResult::with_exit_code(String::new(), String::new(), 1)
    }
}
