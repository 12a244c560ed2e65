use async_trait::async_trait;

use crate::commands::{Command, CommandContext, CommandResult};

pub struct RevCommand;

fn reverse_string(s: &str) -> String {
    s.chars().rev().collect()
}

/// Reverse each line, keeping a trailing newline if there was one.
fn process_content(content: &str) -> String {
    let (body, trailing) = match content.strip_suffix('\n') {
        Some(body) => (body, "\n"),
        None => (content, ""),
    };
    if body.is_empty() && trailing.is_empty() {
        return String::new();
    }
    let reversed: Vec<String> = body.split('\n').map(reverse_string).collect();
    format!("{}{}", reversed.join("\n"), trailing)
}

#[async_trait(?Send)]
impl Command for RevCommand {
    fn name(&self) -> &'static str {
        "rev"
    }

    async fn execute(&self, ctx: CommandContext<'_>) -> CommandResult {
        let mut files = Vec::new();
        let mut after_dashdash = false;

        for arg in &ctx.args {
            if after_dashdash {
                files.push(arg.clone());
            } else if arg == "--" {
                after_dashdash = true;
            } else if arg.starts_with('-') && arg != "-" {
                return CommandResult::error(format!("rev: invalid option -- '{}'\n", &arg[1..]));
            } else {
                files.push(arg.clone());
            }
        }

        match ctx.read_inputs("rev", &files).await {
            Ok(content) => CommandResult::success(process_content(&content)),
            Err(message) => CommandResult::error(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::{run, Harness};

    #[tokio::test]
    async fn test_rev_stdin() {
        let result = run(&RevCommand, &[], "hello\nworld\n").await;
        assert_eq!(result.exit_code, 0);
        assert_eq!(result.stdout, "olleh\ndlrow\n");
    }

    #[tokio::test]
    async fn test_rev_no_trailing_newline() {
        let result = run(&RevCommand, &[], "abc").await;
        assert_eq!(result.stdout, "cba");
    }

    #[tokio::test]
    async fn test_rev_file() {
        let harness = Harness::new("");
        harness.files.write("f", "ab\n");
        let result = harness.run(&RevCommand, &["f"]).await;
        assert_eq!(result.stdout, "ba\n");

        let result = harness.run(&RevCommand, &["--", "missing"]).await;
        assert_eq!(result.exit_code, 1);
    }
}
