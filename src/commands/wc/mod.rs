// src/commands/wc/mod.rs
use async_trait::async_trait;

use crate::commands::{Command, CommandContext, CommandResult};

pub struct WcCommand;

#[derive(Default)]
struct Stats {
    lines: usize,
    words: usize,
    bytes: usize,
}

fn count_stats(content: &str) -> Stats {
    Stats {
        lines: content.matches('\n').count(),
        words: content.split_whitespace().count(),
        bytes: content.len(),
    }
}

struct Columns {
    lines: bool,
    words: bool,
    bytes: bool,
}

impl Columns {
    fn render(&self, stats: &Stats, width: usize) -> String {
        let mut parts: Vec<String> = Vec::new();
        if self.lines {
            parts.push(format!("{:>width$}", stats.lines, width = width));
        }
        if self.words {
            parts.push(format!("{:>width$}", stats.words, width = width));
        }
        if self.bytes {
            parts.push(format!("{:>width$}", stats.bytes, width = width));
        }
        parts.join(" ")
    }
}

#[async_trait(?Send)]
impl Command for WcCommand {
    fn name(&self) -> &'static str {
        "wc"
    }

    async fn execute(&self, ctx: CommandContext<'_>) -> CommandResult {
        let mut columns = Columns { lines: false, words: false, bytes: false };
        let mut files: Vec<String> = Vec::new();

        for arg in &ctx.args {
            match arg.as_str() {
                "-l" | "--lines" => columns.lines = true,
                "-w" | "--words" => columns.words = true,
                "-c" | "--bytes" => columns.bytes = true,
                _ if !arg.starts_with('-') || arg == "-" => files.push(arg.clone()),
                _ => return CommandResult::error(format!("wc: invalid option -- '{}'\n", &arg[1..])),
            }
        }

        if !columns.lines && !columns.words && !columns.bytes {
            columns = Columns { lines: true, words: true, bytes: true };
        }

        if files.is_empty() {
            files.push("-".to_string());
        }

        let mut all_stats: Vec<(Stats, Option<&str>)> = Vec::new();
        let mut stderr = String::new();
        let mut exit_code = 0;

        for file in &files {
            let content = if file == "-" {
                match ctx.read_stdin().await {
                    Ok(c) => c,
                    Err(e) => {
                        stderr.push_str(&format!("wc: -: {}\n", e));
                        exit_code = 1;
                        continue;
                    }
                }
            } else {
                match ctx.files.read(file) {
                    Some(c) => c,
                    None => {
                        stderr.push_str(&format!("wc: {}: No such file or directory\n", file));
                        exit_code = 1;
                        continue;
                    }
                }
            };
            let name = if file == "-" { None } else { Some(file.as_str()) };
            all_stats.push((count_stats(&content), name));
        }

        let mut total = Stats::default();
        for (stats, _) in &all_stats {
            total.lines += stats.lines;
            total.words += stats.words;
            total.bytes += stats.bytes;
        }

        // Columns line up on the widest count; totals bound every column.
        let width = if all_stats.len() > 1 { 7 } else { 0 };
        let width = width
            .max(total.lines.to_string().len())
            .max(total.words.to_string().len())
            .max(total.bytes.to_string().len());
        let width = if all_stats.len() == 1 && count_selected(&columns) == 1 { 0 } else { width };

        let mut stdout = String::new();
        for (stats, name) in &all_stats {
            let counts = columns.render(stats, width);
            match name {
                Some(name) => stdout.push_str(&format!("{} {}\n", counts, name)),
                None => stdout.push_str(&format!("{}\n", counts)),
            }
        }
        if all_stats.len() > 1 {
            stdout.push_str(&format!("{} total\n", columns.render(&total, width)));
        }

        CommandResult::with_exit_code(stdout, stderr, exit_code)
    }
}

fn count_selected(columns: &Columns) -> usize {
    [columns.lines, columns.words, columns.bytes].iter().filter(|&&on| on).count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::{run, Harness};

    #[tokio::test]
    async fn test_wc_lines() {
        let result = run(&WcCommand, &["-l"], "a\nb\nc\n").await;
        assert_eq!(result.stdout, "3\n");
    }

    #[tokio::test]
    async fn test_wc_all_counts() {
        let result = run(&WcCommand, &[], "hello world\nbye\n").await;
        assert_eq!(result.stdout, " 2  3 16\n");
    }

    #[tokio::test]
    async fn test_wc_words_unicode_bytes() {
        let result = run(&WcCommand, &["-w", "-c"], "héllo  there").await;
        assert_eq!(result.stdout, " 2 13\n");
    }

    #[tokio::test]
    async fn test_wc_files_with_total() {
        let harness = Harness::new("");
        harness.files.write("a", "one\n");
        harness.files.write("b", "two\nthree\n");
        let result = harness.run(&WcCommand, &["-l", "a", "b"]).await;
        assert_eq!(
            result.stdout,
            "      1 a\n      2 b\n      3 total\n"
        );
    }

    #[tokio::test]
    async fn test_wc_missing_file() {
        let result = run(&WcCommand, &["missing"], "").await;
        assert_eq!(result.exit_code, 1);
        assert!(result.stderr.contains("missing: No such file"));
    }
}
