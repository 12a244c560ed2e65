// src/commands/printf/mod.rs
use async_trait::async_trait;

use crate::commands::escapes::unescape;
use crate::commands::{Command, CommandContext, CommandResult};

pub struct PrintfCommand;

#[async_trait(?Send)]
impl Command for PrintfCommand {
    fn name(&self) -> &'static str { "printf" }

    async fn execute(&self, ctx: CommandContext<'_>) -> CommandResult {
        let args = &ctx.args;
        if args.is_empty() {
            return CommandResult::with_exit_code("".into(), "printf: usage: printf format [arguments]\n".into(), 2);
        }

        let chars: Vec<char> = args[0].chars().collect();
        let arguments: Vec<&str> = args[1..].iter().map(|s| s.as_str()).collect();
        let mut output = String::new();
        let mut stderr = String::new();
        let mut exit_code = 0;
        let mut arg_idx = 0;

        // The format is reused while arguments remain.
        loop {
            let start_arg_idx = arg_idx;
            let mut i = 0;
            let mut literal = String::new();

            while i < chars.len() {
                if chars[i] != '%' {
                    literal.push(chars[i]);
                    i += 1;
                    continue;
                }
                let escaped = unescape(&std::mem::take(&mut literal));
                output.push_str(&escaped.output);
                if escaped.stop {
                    return CommandResult::with_exit_code(output, stderr, exit_code);
                }

                let spec = parse_spec(&chars, i);
                i += spec.len;
                if spec.width > MAX_WIDTH {
                    stderr.push_str(&format!("printf: {}: invalid field width\n", spec.text));
                    return CommandResult::with_exit_code(output, stderr, 1);
                }
                let arg = arguments.get(arg_idx).copied().unwrap_or("");
                match spec.conversion {
                    '%' => output.push('%'),
                    's' => {
                        output.push_str(&pad(arg, &spec));
                        arg_idx += 1;
                    }
                    'b' => {
                        output.push_str(&pad(&unescape(arg).output, &spec));
                        arg_idx += 1;
                    }
                    'c' => {
                        let first: String = arg.chars().take(1).collect();
                        output.push_str(&pad(&first, &spec));
                        arg_idx += 1;
                    }
                    'd' | 'i' => {
                        let value = match parse_int_arg(arg) {
                            Ok(v) => v,
                            Err(msg) => {
                                stderr.push_str(&msg);
                                exit_code = 1;
                                0
                            }
                        };
                        output.push_str(&pad(&value.to_string(), &spec));
                        arg_idx += 1;
                    }
                    _ => output.push_str(&spec.text),
                }
            }
            let escaped = unescape(&literal);
            output.push_str(&escaped.output);
            if escaped.stop {
                break;
            }

            if arg_idx <= start_arg_idx || arg_idx >= arguments.len() { break; }
        }

        CommandResult::with_exit_code(output, stderr, exit_code)
    }
}

/// Widest field printf will pad to.
const MAX_WIDTH: usize = 1 << 20;

/// A parsed `%[-0][width]conv` directive.
struct Spec {
    text: String,
    len: usize,
    left: bool,
    zero: bool,
    width: usize,
    conversion: char,
}

fn parse_spec(chars: &[char], pos: usize) -> Spec {
    let mut i = pos + 1;
    let (mut left, mut zero) = (false, false);
    while let Some(&c) = chars.get(i) {
        match c {
            '-' => left = true,
            '0' => zero = true,
            _ => break,
        }
        i += 1;
    }
    let mut width: usize = 0;
    while let Some(d) = chars.get(i).and_then(|c| c.to_digit(10)) {
        width = width.saturating_mul(10).saturating_add(d as usize);
        i += 1;
    }
    // A dangling `%` prints as itself.
    let conversion = chars.get(i).copied().unwrap_or('%');
    let end = (i + 1).min(chars.len());
    Spec {
        text: chars[pos..end].iter().collect(),
        len: end - pos,
        left,
        zero,
        width,
        conversion,
    }
}

fn pad(value: &str, spec: &Spec) -> String {
    let len = value.chars().count();
    if len >= spec.width {
        return value.to_string();
    }
    let fill = spec.width - len;
    if spec.left {
        format!("{}{}", value, " ".repeat(fill))
    } else if spec.zero && matches!(spec.conversion, 'd' | 'i') {
        match value.strip_prefix('-') {
            Some(digits) => format!("-{}{}", "0".repeat(fill), digits),
            None => format!("{}{}", "0".repeat(fill), value),
        }
    } else {
        format!("{}{}", " ".repeat(fill), value)
    }
}

fn parse_int_arg(s: &str) -> Result<i64, String> {
    let s = s.trim();
    if s.is_empty() {
        return Ok(0);
    }
    // 'c yields the character code
    if let Some(rest) = s.strip_prefix('\'').or_else(|| s.strip_prefix('"')) {
        return Ok(rest.chars().next().map_or(0, |c| c as i64));
    }
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        return i64::from_str_radix(hex, 16).map_err(|_| format!("printf: '{}': invalid number\n", s));
    }
    s.parse::<i64>().map_err(|_| format!("printf: '{}': invalid number\n", s))
}
