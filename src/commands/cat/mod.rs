// src/commands/cat/mod.rs
use async_trait::async_trait;

use crate::commands::{Command, CommandContext, CommandResult};
use crate::io::{BashError, Reader, Writer};

pub struct CatCommand;

#[async_trait(?Send)]
impl Command for CatCommand {
    fn name(&self) -> &'static str {
        "cat"
    }

    async fn execute(&self, ctx: CommandContext<'_>) -> CommandResult {
        let mut show_line_numbers = false;
        let mut files: Vec<String> = Vec::new();

        for arg in &ctx.args {
            match arg.as_str() {
                "-n" | "--number" => show_line_numbers = true,
                _ if !arg.starts_with('-') || arg == "-" => files.push(arg.clone()),
                _ => {
                    return CommandResult::error(format!("cat: invalid option -- '{}'\n", &arg[1..]));
                }
            }
        }

        if files.is_empty() {
            files.push("-".to_string());
        }

        let mut stdout = String::new();
        let mut stderr = String::new();
        let mut exit_code = 0;
        let mut line_number = 1;

        for file in &files {
            let content = if file == "-" {
                if !show_line_numbers {
                    // Pass stdin through chunk by chunk.
                    if let Err(e) = copy_stdin(&ctx).await {
                        stderr.push_str(&format!("cat: -: {}\n", e));
                        exit_code = 1;
                    }
                    continue;
                }
                match ctx.read_stdin().await {
                    Ok(c) => c,
                    Err(e) => {
                        stderr.push_str(&format!("cat: -: {}\n", e));
                        exit_code = 1;
                        continue;
                    }
                }
            } else {
                match ctx.files.read(file) {
                    Some(c) => c,
                    None => {
                        stderr.push_str(&format!("cat: {}: No such file or directory\n", file));
                        exit_code = 1;
                        continue;
                    }
                }
            };

            if show_line_numbers {
                let (numbered, next_line) = add_line_numbers(&content, line_number);
                stdout.push_str(&numbered);
                line_number = next_line;
            } else {
                let _ = ctx.stdio.stdout.write(&content);
            }
        }

        CommandResult::with_exit_code(stdout, stderr, exit_code)
    }
}

async fn copy_stdin(ctx: &CommandContext<'_>) -> Result<(), BashError> {
    loop {
        match ctx.stdio.stdin.read().await {
            Ok(chunk) => {
                if ctx.stdio.stdout.write(&chunk).is_err() {
                    // Reader side of the pipe is gone.
                    return Ok(());
                }
            }
            Err(e) if e.is_end() => return Ok(()),
            Err(e) => return Err(e),
        }
    }
}

fn add_line_numbers(content: &str, start_line: usize) -> (String, usize) {
    let lines: Vec<&str> = content.split('\n').collect();
    let has_trailing_newline = content.ends_with('\n');
    let lines_to_number = if has_trailing_newline {
        &lines[..lines.len() - 1]
    } else {
        &lines[..]
    };

    let numbered: Vec<String> = lines_to_number
        .iter()
        .enumerate()
        .map(|(i, line)| format!("{:>6}\t{}", start_line + i, line))
        .collect();

    let result = if has_trailing_newline {
        format!("{}\n", numbered.join("\n"))
    } else {
        numbered.join("\n")
    };

    (result, start_line + lines_to_number.len())
}
