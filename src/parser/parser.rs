//! Context-Driven Parser
//!
//! The parser keeps a cursor on the AST node currently receiving tokens
//! (the "context"). Each token is handed to `parse_token`, which dispatches
//! on the context's kind and returns the next context: usually the same
//! node, its parent, or a child it just created.
//!
//! Grammar accepted:
//!   script    ::= statement ((';' | '\n') statement)*
//!   statement ::= command (op command)*        op: | || && < > >> <<<
//!   command   ::= '(' script ')' | part*
//!   part      ::= word | '$' name | '$(' script ')' | '`' script '`'
//!               | "'" text "'" | '"' (text | '$' name | substitution)* '"'
//!
//! Redirections bind tighter than `|`, which binds tighter than `&&`/`||`;
//! all of them associate to the left.

use regex_lite::Regex;

use crate::ast::{Ast, JoinOp, NodeId, NodeKind, Script, SubStyle, WordClass};
use crate::io::{BashError, Reader, Stream};
use crate::parser::lexer::{Lexer, Token, TokenKind};
use crate::parser::scanner::{test, Scanner};
use crate::parser::types::SyntaxError;

lazy_static::lazy_static! {
    static ref VARIABLE_NAME: Regex = Regex::new(r"^[0-9a-zA-Z_]+").unwrap();
}

/// Main parser struct
pub struct Parser<R> {
    lexer: Lexer<R>,
}

impl<R: Reader> Parser<R> {
    pub fn new(lexer: Lexer<R>) -> Self {
        Self { lexer }
    }

    /// Parse a script from any reader.
    pub fn from_reader(input: R) -> Self {
        Self::new(Lexer::new(Scanner::new(input)))
    }

    /// Consume tokens until end of input and return the finished tree.
    pub async fn parse(mut self) -> Result<Script, SyntaxError> {
        let mut ast = Ast::new();
        let mut context = ast.root();

        loop {
            let token = match self.lexer.next().await {
                Ok(token) => token,
                // End of input at this level is the normal way out.
                Err(e) if e.is_end() => break,
                Err(e) => {
                    let (line, column) = self.lexer.position();
                    return Err(SyntaxError::new(e, line, column));
                }
            };
            let (line, column) = (token.line, token.column);
            let text = token.value.clone();
            context = parse_token(&mut ast, context, token, &mut self.lexer)
                .map_err(|e| SyntaxError::with_token(e, line, column, text))?;
        }

        if let Err(e) = check_complete(&ast, context) {
            let (line, column) = self.lexer.position();
            return Err(SyntaxError::new(e, line, column));
        }
        tracing::debug!(nodes = ast.len(), "parsed");
        Ok(Script::new(ast))
    }
}

/// Parse a complete script held in memory.
pub async fn parse(input: &str) -> Result<Script, SyntaxError> {
    Parser::from_reader(Stream::from_text(input)).parse().await
}

/// Feed one token to the context node and return the next context.
pub fn parse_token<R: Reader>(
    ast: &mut Ast,
    context: NodeId,
    token: Token,
    lexer: &mut Lexer<R>,
) -> Result<NodeId, BashError> {
    match ast.kind(context) {
        NodeKind::Script { .. } | NodeKind::Group { closed: false, .. } | NodeKind::Sub { .. } => {
            parse_statement_list(ast, context, token, lexer)
        }
        NodeKind::Group { closed: true, .. } => parse_closed_group(ast, context, token),
        NodeKind::Command { .. } => parse_command(ast, context, token, lexer),
        NodeKind::DblQuote { .. } => parse_dbl_quote(ast, context, token),
        NodeKind::Variable { .. } => parse_variable(ast, context, token, lexer),
        NodeKind::Quote(_) => parse_quote(ast, context, token),
        NodeKind::Comment => parse_comment(ast, context, token, lexer),
        NodeKind::Join { .. } | NodeKind::Ident(_) | NodeKind::Whitespace(_) => {
            Err(BashError::UnknownError)
        }
    }
}

fn parent_of(ast: &Ast, id: NodeId) -> Result<NodeId, BashError> {
    ast.parent(id).ok_or(BashError::UnknownError)
}

fn identifier(value: impl Into<String>, like: &Token) -> Token {
    Token::new(TokenKind::Identifier, value, like.line, like.column)
}

/// `Script`, an open `Group` or a `Sub` waiting for its next statement.
fn parse_statement_list<R: Reader>(
    ast: &mut Ast,
    context: NodeId,
    token: Token,
    lexer: &mut Lexer<R>,
) -> Result<NodeId, BashError> {
    match token.kind {
        TokenKind::Whitespace | TokenKind::Newline | TokenKind::Semicolon => Ok(context),
        TokenKind::RParen => match ast.kind(context) {
            NodeKind::Group { .. } | NodeKind::Sub { style: SubStyle::Dollar, .. } => {
                close(ast, context)
            }
            _ => Err(BashError::UnexpectedToken),
        },
        TokenKind::Backtick
            if matches!(ast.kind(context), NodeKind::Sub { style: SubStyle::Backtick, .. }) =>
        {
            close(ast, context)
        }
        _ => {
            let command = ast.add_child(context, NodeKind::command(false))?;
            parse_command(ast, command, token, lexer)
        }
    }
}

fn parse_command<R: Reader>(
    ast: &mut Ast,
    context: NodeId,
    token: Token,
    lexer: &mut Lexer<R>,
) -> Result<NodeId, BashError> {
    let (empty, target) = match ast.kind(context) {
        NodeKind::Command { target, .. } => (!has_words(ast, context), *target),
        _ => return Err(BashError::UnknownError),
    };

    match token.kind {
        TokenKind::Newline => {
            // `a |` followed by a newline keeps waiting for the right side.
            let after_operator = empty
                && matches!(ast.parent(context).map(|p| ast.kind(p)), Some(NodeKind::Join { .. }));
            if after_operator {
                Ok(context)
            } else {
                end_statement(ast, context)
            }
        }
        TokenKind::Semicolon => {
            if empty {
                return Err(BashError::UnexpectedToken);
            }
            end_statement(ast, context)
        }
        TokenKind::Identifier => {
            ast.add_child(context, NodeKind::Ident(token.value))?;
            Ok(context)
        }
        TokenKind::Whitespace => {
            let after_word = ast.last(context).map_or(false, |last| {
                matches!(ast.word_class(last), WordClass::Literal | WordClass::Expansion)
            });
            if after_word {
                ast.add_child(context, NodeKind::Whitespace(token.value))?;
            }
            Ok(context)
        }
        TokenKind::LParen => {
            if !empty || target {
                return Err(BashError::UnexpectedToken);
            }
            ast.add_child(
                context,
                NodeKind::Group {
                    body: Vec::new(),
                    closed: false,
                },
            )
        }
        TokenKind::RParen => close_paren(ast, context),
        TokenKind::Dollar => ast.add_child(context, NodeKind::Variable { name: String::new() }),
        TokenKind::DollarParen => ast.add_child(context, NodeKind::sub(SubStyle::Dollar, false)),
        TokenKind::Backtick => backtick(ast, context, false),
        TokenKind::Quote => {
            let quote = ast.add_child(context, NodeKind::Quote(String::new()))?;
            lexer.set_scan_override(test::not_quote);
            Ok(quote)
        }
        TokenKind::DblQuote => ast.add_child(context, NodeKind::DblQuote { body: Vec::new() }),
        TokenKind::Hash => ast.add_child(context, NodeKind::Comment),
        kind => {
            if empty {
                return Err(BashError::UnexpectedToken);
            }
            match JoinOp::from_token(kind) {
                Some(op) => join(ast, context, op, target),
                None => Err(BashError::UnknownToken),
            }
        }
    }
}

/// A `( ... )` whose `)` has been seen: only operators, comments and
/// separators may follow.
fn parse_closed_group(ast: &mut Ast, context: NodeId, token: Token) -> Result<NodeId, BashError> {
    let holder = parent_of(ast, context)?;
    match token.kind {
        TokenKind::Whitespace => Ok(context),
        TokenKind::Newline | TokenKind::Semicolon => end_statement(ast, context),
        TokenKind::RParen => close_paren(ast, context),
        TokenKind::Hash => ast.add_child(holder, NodeKind::Comment),
        kind => match JoinOp::from_token(kind) {
            Some(op) => join(ast, holder, op, false),
            None => Err(BashError::UnexpectedToken),
        },
    }
}

fn parse_dbl_quote(ast: &mut Ast, context: NodeId, token: Token) -> Result<NodeId, BashError> {
    match token.kind {
        TokenKind::DblQuote => parent_of(ast, context),
        TokenKind::Dollar => ast.add_child(context, NodeKind::Variable { name: String::new() }),
        TokenKind::DollarParen => ast.add_child(context, NodeKind::sub(SubStyle::Dollar, true)),
        TokenKind::Backtick => backtick(ast, context, true),
        _ => {
            ast.add_child(context, NodeKind::Ident(token.value))?;
            Ok(context)
        }
    }
}

fn parse_variable<R: Reader>(
    ast: &mut Ast,
    context: NodeId,
    token: Token,
    lexer: &mut Lexer<R>,
) -> Result<NodeId, BashError> {
    let parent = parent_of(ast, context)?;

    if token.kind == TokenKind::Identifier {
        let NodeKind::Variable { name } = ast.kind_mut(context) else {
            return Err(BashError::UnknownError);
        };
        name.push_str(&token.value);
        let matched = VARIABLE_NAME.find(name).map_or(0, |m| m.end());

        if matched == 0 {
            // `$` followed by something that cannot start a name is literal.
            ast.pop(parent)?;
            let literal = identifier(format!("${}", token.value), &token);
            return parse_token(ast, parent, literal, lexer);
        }
        if matched < name.len() {
            let rest = name.split_off(matched);
            return parse_token(ast, parent, identifier(rest, &token), lexer);
        }
        return Ok(context);
    }

    let empty = matches!(ast.kind(context), NodeKind::Variable { name } if name.is_empty());
    if empty {
        ast.pop(parent)?;
        let next = parse_token(ast, parent, identifier("$", &token), lexer)?;
        return parse_token(ast, next, token, lexer);
    }
    parse_token(ast, parent, token, lexer)
}

fn parse_quote(ast: &mut Ast, context: NodeId, token: Token) -> Result<NodeId, BashError> {
    if let NodeKind::Quote(text) = ast.kind_mut(context) {
        *text = token.value;
    }
    parent_of(ast, context)
}

fn parse_comment<R: Reader>(
    ast: &mut Ast,
    context: NodeId,
    token: Token,
    lexer: &mut Lexer<R>,
) -> Result<NodeId, BashError> {
    if token.kind == TokenKind::Newline {
        let parent = parent_of(ast, context)?;
        return parse_token(ast, parent, token, lexer);
    }
    Ok(context)
}

/// Finish a `Group` or `Sub`. A closed group stays the context so that
/// operators can still follow it; a substitution hands back to its parent.
fn close(ast: &mut Ast, id: NodeId) -> Result<NodeId, BashError> {
    match ast.kind_mut(id) {
        NodeKind::Group { closed, .. } => {
            *closed = true;
            Ok(id)
        }
        NodeKind::Sub { .. } => parent_of(ast, id),
        _ => Err(BashError::UnknownError),
    }
}

/// `)`: close the nearest open group or `$(`.
fn close_paren(ast: &mut Ast, from: NodeId) -> Result<NodeId, BashError> {
    let found = ast.ancestors(from).find_map(|id| match ast.kind(id) {
        NodeKind::Group { closed: false, .. } | NodeKind::Sub { style: SubStyle::Dollar, .. } => {
            Some(Ok(id))
        }
        NodeKind::Sub { style: SubStyle::Backtick, .. } => Some(Err(BashError::UnexpectedToken)),
        _ => None,
    });
    match found {
        Some(Ok(id)) => close(ast, id),
        Some(Err(e)) => Err(e),
        None => Err(BashError::UnexpectedToken),
    }
}

/// A backtick closes the innermost substitution if it was opened by a
/// backtick, and opens a new one otherwise.
fn backtick(ast: &mut Ast, context: NodeId, quoted: bool) -> Result<NodeId, BashError> {
    let innermost = ast.ancestors(context).find_map(|id| match ast.kind(id) {
        NodeKind::Sub { style, .. } => Some((id, *style)),
        _ => None,
    });
    match innermost {
        Some((sub, SubStyle::Backtick)) => close(ast, sub),
        _ => ast.add_child(context, NodeKind::sub(SubStyle::Backtick, quoted)),
    }
}

/// Newline or `;`: return to the statement list that owns this command.
fn end_statement(ast: &Ast, from: NodeId) -> Result<NodeId, BashError> {
    ast.ancestors(from)
        .find(|&id| ast.is_statement_list(id))
        .ok_or(BashError::UnknownError)
}

/// Rebuild the tree around a binary operator: the left operand is detached
/// from its parent, wrapped in a new `Join`, and the join takes its place.
/// Returns the empty right-hand command.
fn join(ast: &mut Ast, command: NodeId, op: JoinOp, target: bool) -> Result<NodeId, BashError> {
    if target && op.is_redirect() {
        return Err(BashError::UnexpectedToken);
    }

    let mut operand = command;
    while let Some(parent) = ast.parent(operand) {
        match ast.kind(parent) {
            NodeKind::Join { op: outer, right: Some(right), .. }
                if *right == operand && outer.binds_at_least(op) =>
            {
                operand = parent;
            }
            _ => break,
        }
    }

    let parent = parent_of(ast, operand)?;
    if ast.pop(parent)? != operand {
        return Err(BashError::UnexpectedToken);
    }
    let joined = ast.add_join(op, operand);
    ast.push(parent, joined)?;
    tracing::trace!(op = op.as_str(), "join");
    ast.add_child(joined, NodeKind::command(op.is_redirect()))
}

/// At end of input, anything still open is an error.
fn check_complete(ast: &Ast, context: NodeId) -> Result<(), BashError> {
    let open = std::iter::once(context).chain(ast.ancestors(context)).any(|id| {
        matches!(
            ast.kind(id),
            NodeKind::DblQuote { .. } | NodeKind::Sub { .. } | NodeKind::Group { closed: false, .. }
        )
    });
    if open {
        return Err(BashError::UnexpectedEof);
    }

    // Input may end inside a trailing comment.
    let command = match ast.kind(context) {
        NodeKind::Comment => parent_of(ast, context)?,
        _ => context,
    };
    if let NodeKind::Command { .. } = ast.kind(command) {
        let awaiting_operand =
            matches!(ast.parent(command).map(|p| ast.kind(p)), Some(NodeKind::Join { .. }));
        if awaiting_operand && !has_words(ast, command) {
            return Err(BashError::UnexpectedEof);
        }
    }
    Ok(())
}

/// Whether a command holds anything besides comments.
fn has_words(ast: &Ast, command: NodeId) -> bool {
    ast.body(command)
        .iter()
        .any(|&part| !matches!(ast.kind(part), NodeKind::Comment))
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn sexp(input: &str) -> String {
        parse(input).await.unwrap().sexp()
    }

    async fn error(input: &str) -> BashError {
        parse(input).await.unwrap_err().kind
    }

    #[tokio::test]
    async fn test_simple_command() {
        assert_eq!(sexp("echo hi").await, r#"(script (cmd "echo" _ "hi"))"#);
    }

    #[tokio::test]
    async fn test_empty_input() {
        assert_eq!(sexp("").await, "(script)");
        assert_eq!(sexp("  \n\n ").await, "(script)");
    }

    #[tokio::test]
    async fn test_statements() {
        assert_eq!(
            sexp("a; b\nc").await,
            r#"(script (cmd "a") (cmd "b") (cmd "c"))"#
        );
    }

    #[tokio::test]
    async fn test_single_quotes_hide_operators() {
        assert_eq!(sexp("'a|b'").await, "(script (cmd 'a|b'))");
        assert_eq!(sexp("echo 'x > $y'").await, r#"(script (cmd "echo" _ 'x > $y'))"#);
    }

    #[tokio::test]
    async fn test_pipe() {
        assert_eq!(
            sexp("printf a | cat").await,
            r#"(script (pipe (cmd "printf" _ "a" _) (cmd "cat")))"#
        );
        assert_eq!(
            sexp("a|b|c").await,
            r#"(script (pipe (pipe (cmd "a") (cmd "b")) (cmd "c")))"#
        );
    }

    #[tokio::test]
    async fn test_and_or_associate_left() {
        assert_eq!(
            sexp("a&&b||c").await,
            r#"(script (or (and (cmd "a") (cmd "b")) (cmd "c")))"#
        );
        assert_eq!(
            sexp("a|b&&c").await,
            r#"(script (and (pipe (cmd "a") (cmd "b")) (cmd "c")))"#
        );
    }

    #[tokio::test]
    async fn test_redirections_bind_tightest() {
        assert_eq!(
            sexp("a | b > f").await,
            r#"(script (pipe (cmd "a" _) (write (cmd "b" _) (target "f"))))"#
        );
        assert_eq!(
            sexp("a > f | b").await,
            r#"(script (pipe (write (cmd "a" _) (target "f" _)) (cmd "b")))"#
        );
        assert_eq!(
            sexp("cat < in | wc").await,
            r#"(script (pipe (read (cmd "cat" _) (target "in" _)) (cmd "wc")))"#
        );
        assert_eq!(
            sexp("cat <<< hello").await,
            r#"(script (readstr (cmd "cat" _) (target "hello")))"#
        );
    }

    #[tokio::test]
    async fn test_variables() {
        assert_eq!(sexp("echo $X").await, r#"(script (cmd "echo" _ $X))"#);
        assert_eq!(
            sexp("echo $HOME.txt").await,
            r#"(script (cmd "echo" _ $HOME ".txt"))"#
        );
        assert_eq!(sexp("echo $ x").await, r#"(script (cmd "echo" _ "$" _ "x"))"#);
        assert_eq!(sexp("echo $-x").await, r#"(script (cmd "echo" _ "$-x"))"#);
    }

    #[tokio::test]
    async fn test_double_quotes() {
        assert_eq!(
            sexp(r#"echo "a $X b""#).await,
            r#"(script (cmd "echo" _ (dq "a" " " $X " " "b")))"#
        );
        assert_eq!(sexp(r#"echo "a|b""#).await, r#"(script (cmd "echo" _ (dq "a" "|" "b")))"#);
        assert_eq!(sexp(r#""$""#).await, r#"(script (cmd (dq "$")))"#);
    }

    #[tokio::test]
    async fn test_substitutions() {
        assert_eq!(
            sexp("echo $(date)").await,
            r#"(script (cmd "echo" _ (sub (cmd "date"))))"#
        );
        assert_eq!(
            sexp("echo `date`").await,
            r#"(script (cmd "echo" _ (sub (cmd "date"))))"#
        );
        assert_eq!(
            sexp("echo $(echo `date`)").await,
            r#"(script (cmd "echo" _ (sub (cmd "echo" _ (sub (cmd "date"))))))"#
        );
        assert_eq!(
            sexp("x $(a; b | c)").await,
            r#"(script (cmd "x" _ (sub (cmd "a") (pipe (cmd "b" _) (cmd "c")))))"#
        );
    }

    #[tokio::test]
    async fn test_group() {
        assert_eq!(
            sexp("(a; b) | c").await,
            r#"(script (pipe (cmd (group (cmd "a") (cmd "b"))) (cmd "c")))"#
        );
    }

    #[tokio::test]
    async fn test_comment() {
        assert_eq!(
            sexp("echo hi # note | x\necho bye").await,
            r##"(script (cmd "echo" _ "hi" _ #) (cmd "echo" _ "bye"))"##
        );
    }

    #[tokio::test]
    async fn test_operator_continues_on_next_line() {
        assert_eq!(
            sexp("a |\n b").await,
            r#"(script (pipe (cmd "a" _) (cmd "b")))"#
        );
        assert_eq!(
            sexp("a | # note\n b").await,
            r##"(script (pipe (cmd "a" _) (cmd # "b")))"##
        );
    }

    #[tokio::test]
    async fn test_syntax_errors() {
        assert_eq!(error(")").await, BashError::UnexpectedToken);
        assert_eq!(error("| a").await, BashError::UnexpectedToken);
        assert_eq!(error("a &").await, BashError::UnknownToken);
        assert_eq!(error("a > f > g").await, BashError::UnexpectedToken);
        assert_eq!(error("a (b)").await, BashError::UnexpectedToken);
        assert_eq!(error("(a) b").await, BashError::UnexpectedToken);
        assert_eq!(error("a | ;").await, BashError::UnexpectedToken);
    }

    #[tokio::test]
    async fn test_unexpected_eof() {
        assert_eq!(error(r#"echo "open"#).await, BashError::UnexpectedEof);
        assert_eq!(error("echo $(a").await, BashError::UnexpectedEof);
        assert_eq!(error("echo 'a").await, BashError::UnexpectedEof);
        assert_eq!(error("(a").await, BashError::UnexpectedEof);
        assert_eq!(error("a |").await, BashError::UnexpectedEof);
        assert_eq!(error("a >").await, BashError::UnexpectedEof);
        assert_eq!(error("a | # c").await, BashError::UnexpectedEof);
        assert_eq!(error("a && # c\n").await, BashError::UnexpectedEof);
    }

    #[tokio::test]
    async fn test_error_position() {
        let err = parse("echo ok\necho )").await.unwrap_err();
        assert_eq!(err.kind, BashError::UnexpectedToken);
        assert_eq!((err.line, err.column), (2, 6));
        assert_eq!(err.token.as_deref(), Some(")"));
    }
}
