//! Abstract Syntax Tree (AST) Types
//!
//! The tree lives in an arena: nodes own their children through id lists
//! and point back at their parent with a plain index. The parser reshapes
//! the tree in place (a join operator pops the last operand and re-pushes it
//! wrapped in a `Join`), so nodes are never shared, only moved.

use std::fmt::Write as _;

use crate::io::BashError;
use crate::parser::lexer::TokenKind;

/// Index of a node in its `Ast`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

/// Binary operators that combine two sub-commands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinOp {
    Pipe,    // |
    And,     // &&
    Or,      // ||
    Write,   // >
    Append,  // >>
    Read,    // <
    ReadStr, // <<<
}

impl JoinOp {
    pub fn from_token(kind: TokenKind) -> Option<Self> {
        match kind {
            TokenKind::Pipe => Some(Self::Pipe),
            TokenKind::AmpAmp => Some(Self::And),
            TokenKind::PipePipe => Some(Self::Or),
            TokenKind::Gt => Some(Self::Write),
            TokenKind::GtGt => Some(Self::Append),
            TokenKind::Lt => Some(Self::Read),
            TokenKind::LtLtLt => Some(Self::ReadStr),
            _ => None,
        }
    }

    /// Redirections take a file name (or here-string) as their right side.
    pub fn is_redirect(&self) -> bool {
        matches!(self, Self::Write | Self::Append | Self::Read | Self::ReadStr)
    }

    fn precedence(&self) -> u8 {
        match self {
            Self::And | Self::Or => 1,
            Self::Pipe => 2,
            Self::Write | Self::Append | Self::Read | Self::ReadStr => 3,
        }
    }

    /// Whether an existing `self` join is swallowed whole as the left
    /// operand of a following `next` operator.
    pub fn binds_at_least(&self, next: JoinOp) -> bool {
        self.precedence() >= next.precedence()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pipe => "pipe",
            Self::And => "and",
            Self::Or => "or",
            Self::Write => "write",
            Self::Append => "append",
            Self::Read => "read",
            Self::ReadStr => "readstr",
        }
    }
}

/// Which terminator closes a command substitution
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubStyle {
    Dollar,   // $( ... )
    Backtick, // ` ... `
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// Root statement list
    Script { body: Vec<NodeId> },
    /// Word parts of one command. `target` marks the right side of a
    /// redirection, whose words are joined instead of executed.
    Command { body: Vec<NodeId>, target: bool },
    /// `( ... )` statement list; `closed` once the `)` was seen
    Group { body: Vec<NodeId>, closed: bool },
    Join {
        op: JoinOp,
        left: NodeId,
        right: Option<NodeId>,
    },
    Ident(String),
    Whitespace(String),
    /// Single-quoted text
    Quote(String),
    DblQuote { body: Vec<NodeId> },
    Variable { name: String },
    /// Command substitution; `quoted` when inside double quotes
    Sub {
        body: Vec<NodeId>,
        style: SubStyle,
        quoted: bool,
    },
    Comment,
}

impl NodeKind {
    pub fn command(target: bool) -> Self {
        Self::Command {
            body: Vec::new(),
            target,
        }
    }

    pub fn sub(style: SubStyle, quoted: bool) -> Self {
        Self::Sub {
            body: Vec::new(),
            style,
            quoted,
        }
    }
}

/// How a node contributes to the words of its command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WordClass {
    /// Appended verbatim to the current word
    Literal,
    /// Word-split on whitespace before being appended
    Expansion,
    /// Ends the current word
    Break,
    /// Not a word part
    Other,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub parent: Option<NodeId>,
    pub kind: NodeKind,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Ast {
    nodes: Vec<Node>,
}

impl Default for Ast {
    fn default() -> Self {
        Self::new()
    }
}

impl Ast {
    /// Create a tree holding only an empty `Script` root.
    pub fn new() -> Self {
        Self {
            nodes: vec![Node {
                parent: None,
                kind: NodeKind::Script { body: Vec::new() },
            }],
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.nodes[id.0].kind
    }

    pub fn kind_mut(&mut self, id: NodeId) -> &mut NodeKind {
        &mut self.nodes[id.0].kind
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    /// Allocate a detached node.
    pub fn add(&mut self, kind: NodeKind) -> NodeId {
        self.nodes.push(Node { parent: None, kind });
        NodeId(self.nodes.len() - 1)
    }

    /// Allocate a node and push it under `parent`.
    pub fn add_child(&mut self, parent: NodeId, kind: NodeKind) -> Result<NodeId, BashError> {
        let id = self.add(kind);
        self.push(parent, id)?;
        Ok(id)
    }

    /// Allocate a join of `left` with an empty right side.
    pub fn add_join(&mut self, op: JoinOp, left: NodeId) -> NodeId {
        let id = self.add(NodeKind::Join {
            op,
            left,
            right: None,
        });
        self.nodes[left.0].parent = Some(id);
        id
    }

    fn body_mut(&mut self, id: NodeId) -> Option<&mut Vec<NodeId>> {
        match &mut self.nodes[id.0].kind {
            NodeKind::Script { body }
            | NodeKind::Command { body, .. }
            | NodeKind::Group { body, .. }
            | NodeKind::DblQuote { body }
            | NodeKind::Sub { body, .. } => Some(body),
            _ => None,
        }
    }

    /// Children of a sequence node, in order. Empty for other kinds.
    pub fn body(&self, id: NodeId) -> &[NodeId] {
        match &self.nodes[id.0].kind {
            NodeKind::Script { body }
            | NodeKind::Command { body, .. }
            | NodeKind::Group { body, .. }
            | NodeKind::DblQuote { body }
            | NodeKind::Sub { body, .. } => body,
            _ => &[],
        }
    }

    pub fn last(&self, id: NodeId) -> Option<NodeId> {
        self.body(id).last().copied()
    }

    /// Attach `child` as the last child of `parent`.
    pub fn push(&mut self, parent: NodeId, child: NodeId) -> Result<(), BashError> {
        match &mut self.nodes[parent.0].kind {
            NodeKind::Join { right, .. } => {
                if right.is_some() {
                    return Err(BashError::UnexpectedToken);
                }
                *right = Some(child);
            }
            NodeKind::Comment => return Ok(()),
            _ => match self.body_mut(parent) {
                Some(body) => body.push(child),
                None => return Err(BashError::UnknownError),
            },
        }
        self.nodes[child.0].parent = Some(parent);
        Ok(())
    }

    /// Detach and return the last child of `parent`.
    pub fn pop(&mut self, parent: NodeId) -> Result<NodeId, BashError> {
        let child = match &mut self.nodes[parent.0].kind {
            NodeKind::Join { right, .. } => right.take().ok_or(BashError::UnexpectedToken)?,
            NodeKind::Comment
            | NodeKind::Ident(_)
            | NodeKind::Whitespace(_)
            | NodeKind::Quote(_)
            | NodeKind::Variable { .. } => return Err(BashError::UnknownError),
            _ => self
                .body_mut(parent)
                .and_then(|body| body.pop())
                .ok_or(BashError::UnexpectedToken)?,
        };
        self.nodes[child.0].parent = None;
        Ok(child)
    }

    /// Parents of `id`, nearest first.
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.parent(id), move |&p| self.parent(p))
    }

    pub fn word_class(&self, id: NodeId) -> WordClass {
        match self.kind(id) {
            NodeKind::Ident(_) | NodeKind::Quote(_) | NodeKind::DblQuote { .. } => WordClass::Literal,
            NodeKind::Sub { quoted: true, .. } => WordClass::Literal,
            NodeKind::Sub { quoted: false, .. } | NodeKind::Variable { .. } => WordClass::Expansion,
            NodeKind::Whitespace(_) | NodeKind::Comment => WordClass::Break,
            _ => WordClass::Other,
        }
    }

    /// Whether `id` accepts a statement per line (`Script`, open `Group`, `Sub`).
    pub fn is_statement_list(&self, id: NodeId) -> bool {
        matches!(
            self.kind(id),
            NodeKind::Script { .. } | NodeKind::Group { closed: false, .. } | NodeKind::Sub { .. }
        )
    }

    /// Render the subtree rooted at `id` as an s-expression.
    pub fn sexp(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.write_sexp(id, &mut out);
        out
    }

    fn write_sexp(&self, id: NodeId, out: &mut String) {
        let list = |out: &mut String, tag: &str, body: &[NodeId]| {
            out.push('(');
            out.push_str(tag);
            for &child in body {
                out.push(' ');
                self.write_sexp(child, out);
            }
            out.push(')');
        };
        match self.kind(id) {
            NodeKind::Script { body } => list(out, "script", body),
            NodeKind::Command { body, target: false } => list(out, "cmd", body),
            NodeKind::Command { body, target: true } => list(out, "target", body),
            NodeKind::Group { body, .. } => list(out, "group", body),
            NodeKind::DblQuote { body } => list(out, "dq", body),
            NodeKind::Sub { body, .. } => list(out, "sub", body),
            NodeKind::Join { op, left, right } => {
                let _ = write!(out, "({} ", op.as_str());
                self.write_sexp(*left, out);
                out.push(' ');
                match right {
                    Some(right) => self.write_sexp(*right, out),
                    None => out.push('?'),
                }
                out.push(')');
            }
            NodeKind::Ident(text) => {
                let _ = write!(out, "{:?}", text);
            }
            NodeKind::Quote(text) => {
                let _ = write!(out, "'{}'", text);
            }
            NodeKind::Whitespace(_) => out.push('_'),
            NodeKind::Variable { name } => {
                let _ = write!(out, "${}", name);
            }
            NodeKind::Comment => out.push('#'),
        }
    }
}

/// A finished parse: the tree plus its root
#[derive(Debug, Clone, PartialEq)]
pub struct Script {
    ast: Ast,
}

impl Script {
    pub fn new(ast: Ast) -> Self {
        Self { ast }
    }

    pub fn ast(&self) -> &Ast {
        &self.ast
    }

    /// Statements at the top level.
    pub fn statements(&self) -> &[NodeId] {
        self.ast.body(self.ast.root())
    }

    pub fn sexp(&self) -> String {
        self.ast.sexp(self.ast.root())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_pop_sequence() {
        let mut ast = Ast::new();
        let root = ast.root();
        let cmd = ast.add_child(root, NodeKind::command(false)).unwrap();
        assert_eq!(ast.parent(cmd), Some(root));
        assert_eq!(ast.pop(root).unwrap(), cmd);
        assert_eq!(ast.parent(cmd), None);
        assert_eq!(ast.pop(root), Err(BashError::UnexpectedToken));
    }

    #[test]
    fn test_join_accepts_one_right_side() {
        let mut ast = Ast::new();
        let left = ast.add(NodeKind::command(false));
        let join = ast.add_join(JoinOp::Pipe, left);
        assert_eq!(ast.parent(left), Some(join));
        let right = ast.add(NodeKind::command(false));
        ast.push(join, right).unwrap();
        let other = ast.add(NodeKind::command(false));
        assert_eq!(ast.push(join, other), Err(BashError::UnexpectedToken));
        assert_eq!(ast.pop(join).unwrap(), right);
        assert_eq!(ast.pop(join), Err(BashError::UnexpectedToken));
    }

    #[test]
    fn test_leaves_reject_children() {
        let mut ast = Ast::new();
        let leaf = ast.add(NodeKind::Ident("x".into()));
        let other = ast.add(NodeKind::Ident("y".into()));
        assert_eq!(ast.push(leaf, other), Err(BashError::UnknownError));
        assert_eq!(ast.pop(leaf), Err(BashError::UnknownError));
    }

    #[test]
    fn test_ancestors_nearest_first() {
        let mut ast = Ast::new();
        let root = ast.root();
        let cmd = ast.add_child(root, NodeKind::command(false)).unwrap();
        let sub = ast.add_child(cmd, NodeKind::sub(SubStyle::Dollar, false)).unwrap();
        let inner = ast.add_child(sub, NodeKind::command(false)).unwrap();
        let chain: Vec<NodeId> = ast.ancestors(inner).collect();
        assert_eq!(chain, vec![sub, cmd, root]);
    }

    #[test]
    fn test_precedence() {
        assert!(JoinOp::Write.binds_at_least(JoinOp::Pipe));
        assert!(JoinOp::Pipe.binds_at_least(JoinOp::And));
        assert!(JoinOp::And.binds_at_least(JoinOp::Or));
        assert!(!JoinOp::Pipe.binds_at_least(JoinOp::Write));
    }
}
