//! Character Scanner
//!
//! Wraps a `Reader` and exposes single-character `peek`/`read` plus a
//! predicate-driven `scan`. Tracks the line and column of the next
//! character for error reporting.

use crate::io::{BashError, Reader};

/// Character classes used by the lexer.
pub mod test {
    pub fn ident(c: char) -> bool {
        c.is_ascii_alphanumeric() || c == '_'
    }

    pub fn whitespace(c: char) -> bool {
        matches!(c, ' ' | '\t' | '\x0b')
    }

    pub fn not_quote(c: char) -> bool {
        c != '\''
    }
}

pub struct Scanner<R> {
    reader: R,
    line: usize,
    column: usize,
}

impl<R: Reader> Scanner<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line: 1,
            column: 1,
        }
    }

    pub async fn peek(&self) -> Result<char, BashError> {
        self.reader.peek().await
    }

    pub async fn read(&mut self) -> Result<char, BashError> {
        let c = self.reader.read_char().await?;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Ok(c)
    }

    /// Consume characters while `test` holds. Returns what was gathered and
    /// the error that stopped the scan, if any; end of input is reported as
    /// `Eof` and is usually not fatal.
    pub async fn scan(&mut self, test: fn(char) -> bool) -> (String, Option<BashError>) {
        let mut s = String::new();
        loop {
            match self.peek().await {
                Ok(c) if test(c) => {}
                Ok(_) => return (s, None),
                Err(e) => return (s, Some(e)),
            }
            match self.read().await {
                Ok(c) => s.push(c),
                Err(e) => return (s, Some(e)),
            }
        }
    }

    /// Line and column of the next character.
    pub fn position(&self) -> (usize, usize) {
        (self.line, self.column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::Stream;

    #[tokio::test]
    async fn test_scan_stops_at_predicate() {
        let mut scanner = Scanner::new(Stream::from_text("abc_1 rest"));
        let (s, err) = scanner.scan(test::ident).await;
        assert_eq!(s, "abc_1");
        assert_eq!(err, None);
        assert_eq!(scanner.read().await.unwrap(), ' ');
    }

    #[tokio::test]
    async fn test_scan_reports_eof() {
        let mut scanner = Scanner::new(Stream::from_text("  \t"));
        let (s, err) = scanner.scan(test::whitespace).await;
        assert_eq!(s, "  \t");
        assert_eq!(err, Some(BashError::Eof));
    }

    #[tokio::test]
    async fn test_position_tracking() {
        let mut scanner = Scanner::new(Stream::from_text("ab\ncd"));
        assert_eq!(scanner.position(), (1, 1));
        scanner.scan(test::ident).await;
        assert_eq!(scanner.position(), (1, 3));
        scanner.read().await.unwrap();
        assert_eq!(scanner.position(), (2, 1));
    }
}
