//! Lexer for Shell Scripts
//!
//! Groups scanner characters into tokens. Operators live in a prefix trie
//! and are matched longest-first; everything else is either a whitespace
//! run or an identifier run. `next()` merges adjacent raw units the way a
//! shell word is built: escaped characters and line continuations glue onto
//! the surrounding identifier.

use std::collections::HashMap;

use crate::io::{BashError, Reader};
use crate::parser::scanner::{test, Scanner};

/// Token kinds produced by the lexer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Whitespace,
    Identifier,
    Newline,
    /// Line continuation (backslash-newline)
    Backslash,
    Quote,
    DblQuote,
    Backtick,
    Hash,
    Dollar,
    LParen,
    RParen,
    Semicolon,
    Amp,

    // Operators
    Pipe,     // |
    PipePipe, // ||
    AmpAmp,   // &&
    Lt,       // <
    LtLt,     // <<
    LtLtLt,   // <<<
    Gt,       // >
    GtGt,     // >>
    DollarParen, // $(
}

impl TokenKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Whitespace => "WHITESPACE",
            Self::Identifier => "IDENTIFIER",
            Self::Newline => "NEWLINE",
            Self::Backslash => "\\",
            Self::Quote => "'",
            Self::DblQuote => "\"",
            Self::Backtick => "`",
            Self::Hash => "#",
            Self::Dollar => "$",
            Self::LParen => "(",
            Self::RParen => ")",
            Self::Semicolon => ";",
            Self::Amp => "&",
            Self::Pipe => "|",
            Self::PipePipe => "||",
            Self::AmpAmp => "&&",
            Self::Lt => "<",
            Self::LtLt => "<<",
            Self::LtLtLt => "<<<",
            Self::Gt => ">",
            Self::GtGt => ">>",
            Self::DollarParen => "$(",
        }
    }
}

/// A token produced by the lexer
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub value: String,
    pub line: usize,
    pub column: usize,
}

impl Token {
    pub fn new(kind: TokenKind, value: impl Into<String>, line: usize, column: usize) -> Self {
        Self {
            kind,
            value: value.into(),
            line,
            column,
        }
    }
}

/// A trie node: either a finished operator or a table of longer keys.
/// Each table also maps its own prefix to the operator it denotes.
enum Operator {
    Token(TokenKind),
    Table(HashMap<&'static str, Operator>),
}

type OperatorTable = HashMap<&'static str, Operator>;

lazy_static::lazy_static! {
    static ref OPERATORS: OperatorTable = {
        use Operator::{Table, Token};
        let mut m = HashMap::new();
        m.insert("(", Token(TokenKind::LParen));
        m.insert(")", Token(TokenKind::RParen));
        m.insert("|", Table(HashMap::from([
            ("|", Token(TokenKind::Pipe)),
            ("||", Token(TokenKind::PipePipe)),
        ])));
        m.insert("&", Table(HashMap::from([
            ("&", Token(TokenKind::Amp)),
            ("&&", Token(TokenKind::AmpAmp)),
        ])));
        m.insert("<", Table(HashMap::from([
            ("<", Token(TokenKind::Lt)),
            ("<<", Table(HashMap::from([
                ("<<", Token(TokenKind::LtLt)),
                ("<<<", Token(TokenKind::LtLtLt)),
            ]))),
        ])));
        m.insert(">", Table(HashMap::from([
            (">", Token(TokenKind::Gt)),
            (">>", Token(TokenKind::GtGt)),
        ])));
        m.insert("#", Token(TokenKind::Hash));
        m.insert("$", Table(HashMap::from([
            ("$", Token(TokenKind::Dollar)),
            ("$(", Token(TokenKind::DollarParen)),
        ])));
        m.insert(";", Token(TokenKind::Semicolon));
        m.insert("\n", Token(TokenKind::Newline));
        m.insert("\\", Token(TokenKind::Backslash));
        m.insert("'", Token(TokenKind::Quote));
        m.insert("\"", Token(TokenKind::DblQuote));
        m.insert("`", Token(TokenKind::Backtick));
        m
    };
}

/// Check if a character starts an operator
pub fn is_operator_start(c: char) -> bool {
    let mut buf = [0u8; 4];
    OPERATORS.contains_key(&*c.encode_utf8(&mut buf))
}

/// Identifier characters: anything that is neither whitespace nor an
/// operator start.
fn non_operator_ident(c: char) -> bool {
    !test::whitespace(c) && !is_operator_start(c)
}

fn token_in(table: &OperatorTable, matched: &str) -> Result<TokenKind, BashError> {
    match table.get(matched) {
        Some(Operator::Token(kind)) => Ok(*kind),
        _ => Err(BashError::UnknownToken),
    }
}

pub struct Lexer<R> {
    scanner: Scanner<R>,
    scan_override: Option<fn(char) -> bool>,
}

impl<R: Reader> Lexer<R> {
    pub fn new(scanner: Scanner<R>) -> Self {
        Self {
            scanner,
            scan_override: None,
        }
    }

    /// Scan the next token raw with `test`, bypassing operator recognition.
    /// The character that ends the scan is consumed.
    pub fn set_scan_override(&mut self, test: fn(char) -> bool) {
        self.scan_override = Some(test);
    }

    pub fn position(&self) -> (usize, usize) {
        self.scanner.position()
    }

    /// Read one raw lexical unit.
    async fn read(&mut self) -> Result<Token, BashError> {
        let c = self.scanner.peek().await?;
        let (line, column) = self.scanner.position();

        if !is_operator_start(c) {
            let (kind, test): (TokenKind, fn(char) -> bool) = if test::whitespace(c) {
                (TokenKind::Whitespace, test::whitespace)
            } else {
                (TokenKind::Identifier, non_operator_ident)
            };
            let (s, err) = self.scanner.scan(test).await;
            match err {
                // End of input surfaces on the next call instead.
                Some(e) if !e.is_end() => return Err(e),
                _ => return Ok(Token::new(kind, s, line, column)),
            }
        }

        let first = self.scanner.read().await?;
        let mut matched = first.to_string();
        let table: &'static OperatorTable = &OPERATORS;
        let mut kind = match table.get(matched.as_str()) {
            Some(Operator::Token(kind)) => *kind,
            Some(Operator::Table(inner)) => self.longest_match(inner, &mut matched).await?,
            None => return Err(BashError::UnknownToken),
        };

        if kind == TokenKind::Backslash {
            let escaped = match self.scanner.read().await {
                Ok(c) => c,
                Err(e) if e.is_end() => return Err(BashError::UnexpectedEof),
                Err(e) => return Err(e),
            };
            if escaped != '\n' {
                kind = TokenKind::Identifier;
            }
            matched = escaped.to_string();
        }

        Ok(Token::new(kind, matched, line, column))
    }

    /// Walk the operator trie, extending `matched` while a longer key exists.
    async fn longest_match(
        &mut self,
        mut table: &'static OperatorTable,
        matched: &mut String,
    ) -> Result<TokenKind, BashError> {
        loop {
            let ch = match self.scanner.peek().await {
                Ok(ch) => ch,
                Err(e) if e.is_end() => return token_in(table, matched),
                Err(e) => return Err(e),
            };
            let candidate = format!("{}{}", matched, ch);
            let Some(next) = table.get(candidate.as_str()) else {
                return token_in(table, matched);
            };
            self.scanner.read().await?;
            *matched = candidate;
            match next {
                Operator::Table(inner) => table = inner,
                Operator::Token(kind) => return Ok(*kind),
            }
        }
    }

    /// Produce the next merged token.
    pub async fn next(&mut self) -> Result<Token, BashError> {
        if let Some(test) = self.scan_override.take() {
            let (line, column) = self.scanner.position();
            let (s, err) = self.scanner.scan(test).await;
            if let Some(e) = err {
                return Err(if e.is_end() { BashError::UnexpectedEof } else { e });
            }
            self.scanner.read().await?;
            return Ok(Token::new(TokenKind::Identifier, s, line, column));
        }

        let mut value = String::new();
        let mut kind: Option<TokenKind> = None;
        let mut start = self.scanner.position();
        loop {
            let token = self.read().await?;
            if token.kind != TokenKind::Backslash {
                if kind.is_none() {
                    start = (token.line, token.column);
                }
                value.push_str(&token.value);
                kind = Some(token.kind);
            }
            let continues: fn(char) -> bool = match kind {
                None => continue,
                Some(TokenKind::Identifier) => |c: char| c == '\\' || non_operator_ident(c),
                Some(TokenKind::Whitespace) => test::whitespace,
                Some(_) => break,
            };
            match self.scanner.peek().await {
                Ok(c) if continues(c) => continue,
                Ok(_) => break,
                Err(e) if e.is_end() => break,
                Err(e) => return Err(e),
            }
        }

        let kind = kind.ok_or(BashError::UnknownError)?;
        tracing::trace!(kind = kind.as_str(), value = %value, "token");
        Ok(Token::new(kind, value, start.0, start.1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::Stream;

    fn lexer(input: &str) -> Lexer<Stream> {
        Lexer::new(Scanner::new(Stream::from_text(input)))
    }

    async fn tokenize(input: &str) -> Result<Vec<Token>, BashError> {
        let mut lex = lexer(input);
        let mut tokens = Vec::new();
        loop {
            match lex.next().await {
                Ok(t) => tokens.push(t),
                Err(BashError::Eof) => return Ok(tokens),
                Err(e) => return Err(e),
            }
        }
    }

    async fn kinds(input: &str) -> Vec<TokenKind> {
        tokenize(input).await.unwrap().iter().map(|t| t.kind).collect()
    }

    #[tokio::test]
    async fn test_simple_command() {
        let tokens = tokenize("echo hello").await.unwrap();
        assert_eq!(tokens.len(), 3);
        assert_eq!(tokens[0].kind, TokenKind::Identifier);
        assert_eq!(tokens[0].value, "echo");
        assert_eq!(tokens[1].kind, TokenKind::Whitespace);
        assert_eq!(tokens[2].value, "hello");
    }

    #[tokio::test]
    async fn test_longest_match() {
        assert_eq!(kinds(">>").await, vec![TokenKind::GtGt]);
        assert_eq!(kinds(">").await, vec![TokenKind::Gt]);
        assert_eq!(kinds("||").await, vec![TokenKind::PipePipe]);
        assert_eq!(kinds("&&").await, vec![TokenKind::AmpAmp]);
        assert_eq!(kinds("<<<").await, vec![TokenKind::LtLtLt]);
        assert_eq!(kinds("$(").await, vec![TokenKind::DollarParen]);
    }

    #[tokio::test]
    async fn test_match_breaks_on_next_character() {
        assert_eq!(kinds("<<x").await, vec![TokenKind::LtLt, TokenKind::Identifier]);
        assert_eq!(kinds("$HOME").await, vec![TokenKind::Dollar, TokenKind::Identifier]);
        assert_eq!(
            kinds("a|b").await,
            vec![TokenKind::Identifier, TokenKind::Pipe, TokenKind::Identifier]
        );
        assert_eq!(kinds("|||").await, vec![TokenKind::PipePipe, TokenKind::Pipe]);
    }

    #[tokio::test]
    async fn test_round_trip() {
        let input = "echo  hi|cat >>out.txt && x=$(ls -l);`date`\n# note\t(a)";
        let tokens = tokenize(input).await.unwrap();
        let rebuilt: String = tokens.iter().map(|t| t.value.as_str()).collect();
        assert_eq!(rebuilt, input);
    }

    #[tokio::test]
    async fn test_escaped_characters_join_identifier() {
        let tokens = tokenize("a\\ b\\|c d").await.unwrap();
        assert_eq!(tokens[0].kind, TokenKind::Identifier);
        assert_eq!(tokens[0].value, "a b|c");
        assert_eq!(tokens[1].kind, TokenKind::Whitespace);
        assert_eq!(tokens[2].value, "d");
    }

    #[tokio::test]
    async fn test_line_continuation() {
        let tokens = tokenize("ec\\\nho hi").await.unwrap();
        assert_eq!(tokens[0].value, "echo");
        assert_eq!(tokens.len(), 3);

        let tokens = tokenize("a \\\nb").await.unwrap();
        let values: Vec<&str> = tokens.iter().map(|t| t.value.as_str()).collect();
        assert_eq!(values, vec!["a", " ", "b"]);
    }

    #[tokio::test]
    async fn test_trailing_backslash() {
        assert_eq!(tokenize("echo \\").await, Err(BashError::UnexpectedEof));
    }

    #[tokio::test]
    async fn test_scan_override() {
        let mut lex = lexer("'a|b $c' d");
        assert_eq!(lex.next().await.unwrap().kind, TokenKind::Quote);
        lex.set_scan_override(test::not_quote);
        let quoted = lex.next().await.unwrap();
        assert_eq!(quoted.kind, TokenKind::Identifier);
        assert_eq!(quoted.value, "a|b $c");
        assert_eq!(lex.next().await.unwrap().kind, TokenKind::Whitespace);
        assert_eq!(lex.next().await.unwrap().value, "d");
    }

    #[tokio::test]
    async fn test_scan_override_unterminated() {
        let mut lex = lexer("'open");
        lex.next().await.unwrap();
        lex.set_scan_override(test::not_quote);
        assert_eq!(lex.next().await, Err(BashError::UnexpectedEof));
    }

    #[tokio::test]
    async fn test_token_positions() {
        let tokens = tokenize("a\n  b").await.unwrap();
        assert_eq!((tokens[0].line, tokens[0].column), (1, 1));
        assert_eq!((tokens[1].line, tokens[1].column), (1, 2));
        assert_eq!((tokens[3].line, tokens[3].column), (2, 3));
    }
}
