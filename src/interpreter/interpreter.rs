//! Interpreter
//!
//! Walks a parsed `Script` and executes it against a `Host` and a
//! `FileAccess`. Every node runs as a boxed local future so that the two
//! sides of a pipe can be interleaved on a single task; they make progress
//! by suspending on stream reads.

use std::future::Future;
use std::pin::Pin;

use tokio_util::sync::CancellationToken;

use crate::ast::{Ast, JoinOp, NodeId, NodeKind, Script, WordClass};
use crate::interpreter::types::{FileAccess, Host, Stdio};
use crate::interpreter::word_split::{join_words, split_words, WordSegment};
use crate::io::{FileStream, Stream, Writer};

type LocalFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

/// Exit status of a command that was never started because the run was
/// cancelled.
pub const CANCELLED_STATUS: i32 = 130;

/// Status of a redirection whose file could not be resolved or closed.
const REDIRECT_FAILED: i32 = 1;

pub struct Interpreter<'a> {
    ast: &'a Ast,
    host: &'a dyn Host,
    files: &'a dyn FileAccess,
    cancel: Option<CancellationToken>,
}

impl<'a> Interpreter<'a> {
    pub fn new(ast: &'a Ast, host: &'a dyn Host, files: &'a dyn FileAccess) -> Self {
        Self {
            ast,
            host,
            files,
            cancel: None,
        }
    }

    /// Streams created during the run give up their pending reads once
    /// `token` fires, and no further commands are started.
    pub fn with_cancel(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().map_or(false, |t| t.is_cancelled())
    }

    /// A private stream for pipes, captures and redirection targets.
    fn stream(&self) -> Stream {
        match &self.cancel {
            Some(token) => Stream::with_cancel(token.clone()),
            None => Stream::new(),
        }
    }

    /// Run the whole script. Statement statuses are logged, not reported:
    /// the script as a whole always succeeds.
    pub async fn run_script(&self, io: Stdio<'_>) -> i32 {
        self.run_all(io).await;
        0
    }

    /// Run every top-level statement and return the status of the last one.
    pub async fn run_all(&self, io: Stdio<'_>) -> i32 {
        let mut last = 0;
        for &statement in self.ast.body(self.ast.root()) {
            last = self.run_node(statement, io).await;
            tracing::debug!(status = last, "statement finished");
        }
        last
    }

    /// Execute one node and return its exit status.
    pub fn run_node<'s>(&'s self, id: NodeId, io: Stdio<'s>) -> LocalFuture<'s, i32> {
        Box::pin(async move {
            match self.ast.kind(id) {
                NodeKind::Script { body } | NodeKind::Group { body, .. } => {
                    self.run_statements(body, io).await
                }
                NodeKind::Command { target: false, .. } => self.run_command(id, io).await,
                NodeKind::Command { target: true, .. } => {
                    let text = self.target_text(id, io).await;
                    write_out(io.stdout, &text);
                    0
                }
                NodeKind::Join { op, left, right } => {
                    let Some(right) = *right else {
                        return 1;
                    };
                    self.run_join(*op, *left, right, io).await
                }
                NodeKind::Ident(text) | NodeKind::Whitespace(text) | NodeKind::Quote(text) => {
                    write_out(io.stdout, text);
                    0
                }
                NodeKind::DblQuote { .. } | NodeKind::Variable { .. } => {
                    let text = self.expand(id, io).await;
                    write_out(io.stdout, &text);
                    0
                }
                NodeKind::Sub { .. } => {
                    let (text, status) = self.capture(id, io).await;
                    write_out(io.stdout, &text);
                    status
                }
                NodeKind::Comment => 0,
            }
        })
    }

    async fn run_statements(&self, body: &[NodeId], io: Stdio<'_>) -> i32 {
        let mut status = 0;
        for &statement in body {
            status = self.run_node(statement, io).await;
        }
        status
    }

    async fn run_command(&self, id: NodeId, io: Stdio<'_>) -> i32 {
        let body = self.ast.body(id);

        // `( ... )` holder: the group is the command.
        if let Some(&group) = body
            .iter()
            .find(|&&child| matches!(self.ast.kind(child), NodeKind::Group { .. }))
        {
            return self.run_node(group, io).await;
        }

        let (segments, sub_status) = self.segments(body, io).await;
        let argv = split_words(&segments);
        if argv.is_empty() {
            // `$(cmd)` alone reports the substitution's status.
            return sub_status.unwrap_or(0);
        }
        if self.is_cancelled() {
            tracing::debug!(?argv, "cancelled before exec");
            return CANCELLED_STATUS;
        }

        tracing::debug!(?argv, "exec");
        self.host.exec(&argv, io).await
    }

    /// Evaluate the word parts of a command in order. Also returns the
    /// status of the last top-level substitution, if any ran.
    async fn segments(&self, body: &[NodeId], io: Stdio<'_>) -> (Vec<WordSegment>, Option<i32>) {
        let mut segments = Vec::with_capacity(body.len());
        let mut sub_status = None;
        for &part in body {
            let class = self.ast.word_class(part);
            match class {
                WordClass::Break => {
                    segments.push(WordSegment::Break);
                    continue;
                }
                WordClass::Other => continue,
                WordClass::Literal | WordClass::Expansion => {}
            }

            let text = if let NodeKind::Sub { .. } = self.ast.kind(part) {
                let (text, status) = self.capture(part, io).await;
                sub_status = Some(status);
                text
            } else {
                self.expand(part, io).await
            };
            segments.push(match class {
                WordClass::Literal => WordSegment::Literal(text),
                _ => WordSegment::Expansion(text),
            });
        }
        (segments, sub_status)
    }

    async fn target_text(&self, id: NodeId, io: Stdio<'_>) -> String {
        let (segments, _) = self.segments(self.ast.body(id), io).await;
        join_words(&segments)
    }

    /// Text a word part contributes to its command.
    fn expand<'s>(&'s self, id: NodeId, io: Stdio<'s>) -> LocalFuture<'s, String> {
        Box::pin(async move {
            match self.ast.kind(id) {
                NodeKind::Ident(text) | NodeKind::Whitespace(text) | NodeKind::Quote(text) => {
                    text.clone()
                }
                NodeKind::Variable { name } if name.is_empty() => "$".to_string(),
                NodeKind::Variable { name } => self.host.env(name),
                NodeKind::DblQuote { body } => {
                    let mut text = String::new();
                    for &part in body {
                        text.push_str(&self.expand(part, io).await);
                    }
                    text
                }
                NodeKind::Sub { .. } => self.capture(id, io).await.0,
                _ => String::new(),
            }
        })
    }

    /// Run a substitution's statements into a private stream and return the
    /// output with one trailing newline removed.
    async fn capture(&self, id: NodeId, io: Stdio<'_>) -> (String, i32) {
        let buffer = self.stream();
        let status = self
            .run_statements(self.ast.body(id), io.with_stdout(&buffer))
            .await;
        let mut text = buffer.read_sync().unwrap_or_default();
        if text.ends_with('\n') {
            text.pop();
        }
        (text, status)
    }

    async fn run_join(&self, op: JoinOp, left: NodeId, right: NodeId, io: Stdio<'_>) -> i32 {
        match op {
            JoinOp::Pipe => self.run_pipe(left, right, io).await,
            JoinOp::And => {
                let status = self.run_node(left, io).await;
                if status == 0 {
                    self.run_node(right, io).await
                } else {
                    status
                }
            }
            JoinOp::Or => {
                let status = self.run_node(left, io).await;
                if status != 0 {
                    self.run_node(right, io).await
                } else {
                    status
                }
            }
            JoinOp::Write | JoinOp::Append => {
                let Some(file) = self.resolve_file(right, io).await else {
                    return REDIRECT_FAILED;
                };
                if op == JoinOp::Write {
                    if let Err(e) = file.clear() {
                        tracing::warn!(file = file.name(), error = %e, "cannot truncate");
                    }
                }
                let status = self.run_node(left, io.with_stdout(&file)).await;
                let closed = file.close();
                if status != 0 {
                    status
                } else if closed.is_err() {
                    REDIRECT_FAILED
                } else {
                    0
                }
            }
            JoinOp::Read => {
                let Some(file) = self.resolve_file(right, io).await else {
                    return REDIRECT_FAILED;
                };
                // Only the content present now is read.
                let _ = file.close();
                self.run_node(left, io.with_stdin(&file)).await
            }
            JoinOp::ReadStr => {
                let input = self.stream();
                self.run_node(right, io.with_stdout(&input)).await;
                let _ = input.close();
                self.run_node(left, io.with_stdin(&input)).await
            }
        }
    }

    /// Interleave both sides of `left | right` on the current task. The pipe
    /// is closed as soon as either side finishes; that side's status is the
    /// pipeline's status.
    async fn run_pipe(&self, left: NodeId, right: NodeId, io: Stdio<'_>) -> i32 {
        let pipe = self.stream();
        let mut left = self.run_node(left, io.with_stdout(&pipe));
        let mut right = self.run_node(right, io.with_stdin(&pipe));

        let (status, rest) = tokio::select! {
            biased;
            status = &mut left => (status, right),
            status = &mut right => (status, left),
        };
        let _ = pipe.close();
        rest.await;
        status
    }

    /// Evaluate a redirection target into a file name and fetch the file.
    async fn resolve_file(&self, target: NodeId, io: Stdio<'_>) -> Option<FileStream> {
        let buffer = self.stream();
        self.run_node(target, io.with_stdout(&buffer)).await;
        let _ = buffer.close();

        match buffer.read_sync() {
            Ok(name) if !name.is_empty() => {
                tracing::debug!(file = %name, "redirect");
                Some(self.files.get_file(&name))
            }
            _ => {
                tracing::warn!("redirection target is empty");
                None
            }
        }
    }
}

fn write_out(out: &dyn Writer, text: &str) {
    if let Err(e) = out.write(text) {
        tracing::debug!(error = %e, "write dropped");
    }
}

impl Script {
    /// Execute the script. Returns `0` once every statement has run.
    pub async fn run(&self, host: &dyn Host, files: &dyn FileAccess, io: Stdio<'_>) -> i32 {
        Interpreter::new(self.ast(), host, files).run_script(io).await
    }

    /// Like `run`, but stops starting commands once `cancel` fires.
    pub async fn run_with_cancel(
        &self,
        host: &dyn Host,
        files: &dyn FileAccess,
        io: Stdio<'_>,
        cancel: CancellationToken,
    ) -> i32 {
        Interpreter::new(self.ast(), host, files)
            .with_cancel(cancel)
            .run_script(io)
            .await
    }
}
