// src/commands/tr/mod.rs
use std::collections::HashSet;

use async_trait::async_trait;

use crate::commands::{Command, CommandContext, CommandResult};

pub struct TrCommand;

/// Parse a SET string into a list of characters.
/// Supports literal characters, ranges (a-z), and escape sequences (\n, \t).
fn parse_set(set: &str) -> Vec<char> {
    let mut chars: Vec<char> = Vec::new();
    let raw: Vec<char> = set.chars().collect();
    let mut i = 0;
    while i < raw.len() {
        if raw[i] == '\\' && i + 1 < raw.len() {
            match raw[i + 1] {
                'n' => chars.push('\n'),
                't' => chars.push('\t'),
                'r' => chars.push('\r'),
                '\\' => chars.push('\\'),
                other => chars.push(other),
            }
            i += 2;
        } else if i + 2 < raw.len() && raw[i + 1] == '-' {
            let (start, end) = (raw[i], raw[i + 2]);
            if start <= end {
                chars.extend(start..=end);
            } else {
                chars.extend([start, '-', end]);
            }
            i += 3;
        } else {
            chars.push(raw[i]);
            i += 1;
        }
    }
    chars
}

/// Map every character of SET1 to the character at the same position in
/// SET2; a shorter SET2 repeats its last character.
fn translate(input: &str, set1: &[char], set2: &[char]) -> String {
    input
        .chars()
        .map(|c| match set1.iter().rposition(|&s| s == c) {
            Some(i) => set2.get(i).or(set2.last()).copied().unwrap_or(c),
            None => c,
        })
        .collect()
}

#[async_trait(?Send)]
impl Command for TrCommand {
    fn name(&self) -> &'static str {
        "tr"
    }

    async fn execute(&self, ctx: CommandContext<'_>) -> CommandResult {
        let mut delete = false;
        let mut sets: Vec<&str> = Vec::new();

        for arg in &ctx.args {
            match arg.as_str() {
                "-d" | "--delete" => delete = true,
                _ if !arg.starts_with('-') || arg.len() == 1 => sets.push(arg),
                _ => return CommandResult::error(format!("tr: invalid option -- '{}'\n", &arg[1..])),
            }
        }

        if sets.is_empty() {
            return CommandResult::error("tr: missing operand\n".to_string());
        }
        if sets.len() < 2 && !delete {
            return CommandResult::error("tr: missing operand after the first SET\n".to_string());
        }

        let input = match ctx.read_stdin().await {
            Ok(input) => input,
            Err(e) => return CommandResult::error(format!("tr: {}\n", e)),
        };
        let set1 = parse_set(sets[0]);

        if delete {
            let doomed: HashSet<char> = set1.into_iter().collect();
            let output: String = input.chars().filter(|c| !doomed.contains(c)).collect();
            return CommandResult::success(output);
        }

        let set2 = parse_set(sets[1]);
        CommandResult::success(translate(&input, &set1, &set2))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::run;

    #[test]
    fn test_parse_set_ranges_and_escapes() {
        assert_eq!(parse_set("a-d"), vec!['a', 'b', 'c', 'd']);
        assert_eq!(parse_set("\\n-"), vec!['\n', '-']);
        assert_eq!(parse_set("z-a"), vec!['z', '-', 'a']);
    }

    #[tokio::test]
    async fn test_tr_uppercase() {
        let result = run(&TrCommand, &["a-z", "A-Z"], "hello, world\n").await;
        assert_eq!(result.stdout, "HELLO, WORLD\n");
    }

    #[tokio::test]
    async fn test_tr_short_second_set() {
        let result = run(&TrCommand, &["abc", "x"], "aabbcc d").await;
        assert_eq!(result.stdout, "xxxxxx d");
    }

    #[tokio::test]
    async fn test_tr_delete() {
        let result = run(&TrCommand, &["-d", "aeiou"], "education").await;
        assert_eq!(result.stdout, "dctn");
    }

    #[tokio::test]
    async fn test_tr_missing_operands() {
        assert_eq!(run(&TrCommand, &[], "").await.exit_code, 1);
        let result = run(&TrCommand, &["abc"], "").await;
        assert!(result.stderr.contains("after the first SET"));
    }
}
