//! File Streams
//!
//! A virtual file handed out by a `FileAccess` implementation: a `Stream`
//! pre-loaded with the file's current content, plus an accumulated
//! `content` string that embedders observe through a change hook.

use std::cell::RefCell;
use std::rc::Rc;

use async_trait::async_trait;

use super::stream::Stream;
use super::types::{BashError, Reader, Writer};

/// Called with the full file content after every change.
pub type ChangeHook = Rc<dyn Fn(&str)>;

#[derive(Clone)]
pub struct FileStream {
    name: String,
    stream: Stream,
    content: Rc<RefCell<String>>,
    changed: Option<ChangeHook>,
}

impl FileStream {
    /// Create a file whose existing `content` is readable from the stream.
    pub fn new(name: impl Into<String>, content: &str) -> Self {
        let stream = Stream::new();
        let _ = stream.write(content);
        Self {
            name: name.into(),
            stream,
            content: Rc::new(RefCell::new(content.to_string())),
            changed: None,
        }
    }

    pub fn with_hook(mut self, hook: ChangeHook) -> Self {
        self.changed = Some(hook);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn content(&self) -> String {
        self.content.borrow().clone()
    }

    /// Truncate the persisted content. Fails once the file is closed.
    pub fn clear(&self) -> Result<(), BashError> {
        if self.stream.is_closed() {
            return Err(BashError::Closed);
        }
        self.content.borrow_mut().clear();
        self.notify();
        Ok(())
    }

    pub fn close(&self) -> Result<(), BashError> {
        self.stream.close()
    }

    fn notify(&self) {
        if let Some(hook) = &self.changed {
            let content = self.content.borrow().clone();
            hook(&content);
        }
    }
}

#[async_trait(?Send)]
impl Reader for FileStream {
    async fn read(&self) -> Result<String, BashError> {
        self.stream.read().await
    }

    async fn read_char(&self) -> Result<char, BashError> {
        self.stream.read_char().await
    }

    async fn peek(&self) -> Result<char, BashError> {
        self.stream.peek().await
    }
}

impl Writer for FileStream {
    fn write(&self, s: &str) -> Result<(), BashError> {
        self.stream.write(s)?;
        self.content.borrow_mut().push_str(s);
        self.notify();
        Ok(())
    }
}

impl std::fmt::Debug for FileStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileStream")
            .field("name", &self.name)
            .field("content", &self.content.borrow())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_initial_content_is_readable() {
        let file = FileStream::new("notes.txt", "line one\n");
        file.close().unwrap();
        assert_eq!(file.read().await.unwrap(), "line one\n");
        assert_eq!(file.read().await, Err(BashError::Eof));
    }

    #[test]
    fn test_write_appends_content_and_notifies() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        let file = FileStream::new("log", "a")
            .with_hook(Rc::new(move |c: &str| sink.borrow_mut().push(c.to_string())));
        file.write("b").unwrap();
        file.write("c").unwrap();
        assert_eq!(file.content(), "abc");
        assert_eq!(*seen.borrow(), vec!["ab".to_string(), "abc".to_string()]);
    }

    #[test]
    fn test_clear_truncates_until_closed() {
        let file = FileStream::new("out", "old");
        file.clear().unwrap();
        assert_eq!(file.content(), "");
        file.write("new").unwrap();
        file.close().unwrap();
        assert_eq!(file.clear(), Err(BashError::Closed));
        assert_eq!(file.write("more"), Err(BashError::Closed));
        assert_eq!(file.content(), "new");
    }
}
