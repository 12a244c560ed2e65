//! Backslash escapes shared by `echo -e` and `printf`.

/// Text with escapes applied. `stop` is set when `\c` cut the output short.
pub struct Unescaped {
    pub output: String,
    pub stop: bool,
}

/// Numeric escape: up to `max` digits of `radix` starting at `chars[at]`.
fn numeric(chars: &[char], at: usize, max: usize, radix: u32) -> Option<(char, usize)> {
    let digits: String = chars[at..]
        .iter()
        .take(max)
        .take_while(|c| c.is_digit(radix))
        .collect();
    if digits.is_empty() {
        return None;
    }
    let code = u32::from_str_radix(&digits, radix).ok()?;
    let code = if radix == 8 { code % 256 } else { code };
    char::from_u32(code).map(|c| (c, digits.len()))
}

pub fn unescape(input: &str) -> Unescaped {
    let chars: Vec<char> = input.chars().collect();
    let mut output = String::new();
    let mut i = 0;

    while i < chars.len() {
        if chars[i] != '\\' {
            output.push(chars[i]);
            i += 1;
            continue;
        }
        let Some(&next) = chars.get(i + 1) else {
            output.push('\\');
            break;
        };
        i += 2;
        let simple = match next {
            '\\' => Some('\\'),
            'n' => Some('\n'),
            't' => Some('\t'),
            'r' => Some('\r'),
            'a' => Some('\x07'),
            'b' => Some('\x08'),
            'f' => Some('\x0c'),
            'v' => Some('\x0b'),
            'e' | 'E' => Some('\x1b'),
            _ => None,
        };
        if let Some(c) = simple {
            output.push(c);
            continue;
        }
        match next {
            'c' => return Unescaped { output, stop: true },
            '0' => match numeric(&chars, i, 3, 8) {
                Some((c, used)) => {
                    output.push(c);
                    i += used;
                }
                None => output.push('\0'),
            },
            'x' => match numeric(&chars, i, 2, 16) {
                Some((c, used)) => {
                    output.push(c);
                    i += used;
                }
                None => output.push_str("\\x"),
            },
            'u' => match numeric(&chars, i, 4, 16) {
                Some((c, used)) => {
                    output.push(c);
                    i += used;
                }
                None => output.push_str("\\u"),
            },
            other => {
                // Unknown escapes stay as written.
                output.push('\\');
                output.push(other);
            }
        }
    }

    Unescaped { output, stop: false }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_escapes() {
        assert_eq!(unescape("a\\tb\\nc\\\\").output, "a\tb\nc\\");
    }

    #[test]
    fn test_numeric_escapes() {
        assert_eq!(unescape("\\0101\\x42\\u00e9").output, "ABé");
        assert_eq!(unescape("\\xzz").output, "\\xzz");
    }

    #[test]
    fn test_stop_and_unknown() {
        let result = unescape("keep\\cdrop");
        assert_eq!(result.output, "keep");
        assert!(result.stop);
        assert_eq!(unescape("\\q\\").output, "\\q\\");
    }
}
