//! Cooperative Text Stream
//!
//! An unbounded, single-producer/multi-reader buffer with explicit close.
//! State lives behind `Rc<RefCell<_>>`: streams are shared between the two
//! sides of a pipe running on one task, never across threads.
//!
//! Suspended readers park a `oneshot` sender in a FIFO queue. A write wakes
//! the oldest reader; a reader that leaves data behind passes the wake-up on
//! to the next one. Closing wakes everybody.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use async_trait::async_trait;
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;

use super::types::{BashError, Reader, Writer};

#[derive(Default)]
struct StreamState {
    chunks: VecDeque<String>,
    /// Byte offset into the front chunk.
    at: usize,
    closed: bool,
    waiters: VecDeque<oneshot::Sender<()>>,
}

impl StreamState {
    fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    fn drain(&mut self) -> String {
        let mut out = String::new();
        if let Some(front) = self.chunks.pop_front() {
            out.push_str(&front[self.at..]);
        }
        self.at = 0;
        for chunk in self.chunks.drain(..) {
            out.push_str(&chunk);
        }
        out
    }

    fn front_char(&self) -> Option<char> {
        self.chunks.front().and_then(|c| c[self.at..].chars().next())
    }

    fn advance(&mut self, ch: char) {
        self.at += ch.len_utf8();
        let exhausted = self.chunks.front().map_or(false, |c| self.at >= c.len());
        if exhausted {
            self.chunks.pop_front();
            self.at = 0;
        }
    }

    fn wake_next(&mut self) {
        while let Some(waiter) = self.waiters.pop_front() {
            if waiter.send(()).is_ok() {
                break;
            }
        }
    }

    fn wake_all(&mut self) {
        for waiter in self.waiters.drain(..) {
            let _ = waiter.send(());
        }
    }

    /// Hand the buffer to the next parked reader if anything is left.
    fn pass_on(&mut self) {
        if !self.is_empty() {
            self.wake_next();
        }
    }
}

/// Shared handle to a cooperative text stream.
#[derive(Clone, Default)]
pub struct Stream {
    state: Rc<RefCell<StreamState>>,
    cancel: Option<CancellationToken>,
}

impl Stream {
    /// Create an empty, open stream.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a stream whose suspended reads give up once `token` fires.
    pub fn with_cancel(token: CancellationToken) -> Self {
        Self {
            state: Rc::default(),
            cancel: Some(token),
        }
    }

    /// Create a stream that already holds `content` and is closed.
    pub fn from_text(content: &str) -> Self {
        let stream = Self::new();
        let _ = stream.write(content);
        let _ = stream.close();
        stream
    }

    /// Close the stream. Pending readers are woken and see `Eof` once the
    /// buffer is drained. Closing twice fails with `Closed`.
    pub fn close(&self) -> Result<(), BashError> {
        let mut state = self.state.borrow_mut();
        if state.closed {
            return Err(BashError::Closed);
        }
        state.closed = true;
        state.wake_all();
        Ok(())
    }

    pub fn is_closed(&self) -> bool {
        self.state.borrow().closed
    }

    /// Drain without suspending. Fails with `Eof` only when the stream is
    /// both closed and empty.
    pub fn read_sync(&self) -> Result<String, BashError> {
        let mut state = self.state.borrow_mut();
        if state.is_empty() && state.closed {
            return Err(BashError::Eof);
        }
        Ok(state.drain())
    }

    /// Park until a writer or `close` wakes us.
    async fn wait(&self) -> Result<(), BashError> {
        let rx = {
            let mut state = self.state.borrow_mut();
            if state.closed {
                return Ok(());
            }
            let (tx, rx) = oneshot::channel();
            state.waiters.push_back(tx);
            rx
        };
        match &self.cancel {
            Some(token) => {
                tokio::select! {
                    _ = rx => Ok(()),
                    _ = token.cancelled() => Err(BashError::Cancelled),
                }
            }
            None => {
                // A dropped sender only means the stream went away; re-check.
                let _ = rx.await;
                Ok(())
            }
        }
    }

    async fn next_char(&self, consume: bool) -> Result<char, BashError> {
        loop {
            {
                let mut state = self.state.borrow_mut();
                if let Some(ch) = state.front_char() {
                    if consume {
                        state.advance(ch);
                    }
                    state.pass_on();
                    return Ok(ch);
                }
                if state.closed {
                    return Err(BashError::Eof);
                }
            }
            self.wait().await?;
        }
    }
}

#[async_trait(?Send)]
impl Reader for Stream {
    async fn read(&self) -> Result<String, BashError> {
        loop {
            {
                let mut state = self.state.borrow_mut();
                if !state.is_empty() {
                    return Ok(state.drain());
                }
                if state.closed {
                    return Err(BashError::Eof);
                }
            }
            self.wait().await?;
        }
    }

    async fn read_char(&self) -> Result<char, BashError> {
        self.next_char(true).await
    }

    async fn peek(&self) -> Result<char, BashError> {
        self.next_char(false).await
    }
}

impl Writer for Stream {
    fn write(&self, s: &str) -> Result<(), BashError> {
        let mut state = self.state.borrow_mut();
        if state.closed {
            return Err(BashError::Closed);
        }
        if s.is_empty() {
            return Ok(());
        }
        state.chunks.push_back(s.to_string());
        state.wake_next();
        Ok(())
    }
}

impl std::fmt::Debug for Stream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("Stream")
            .field("buffered", &state.chunks.len())
            .field("closed", &state.closed)
            .field("waiters", &state.waiters.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_read_drains_all_chunks() {
        let stream = Stream::new();
        stream.write("hello ").unwrap();
        stream.write("world").unwrap();
        assert_eq!(stream.read().await.unwrap(), "hello world");
    }

    #[tokio::test]
    async fn test_read_char_and_peek() {
        let stream = Stream::new();
        stream.write("ab").unwrap();
        stream.write("c").unwrap();
        assert_eq!(stream.peek().await.unwrap(), 'a');
        assert_eq!(stream.read_char().await.unwrap(), 'a');
        assert_eq!(stream.read_char().await.unwrap(), 'b');
        assert_eq!(stream.peek().await.unwrap(), 'c');
        assert_eq!(stream.read().await.unwrap(), "c");
    }

    #[tokio::test]
    async fn test_read_after_partial_char_read() {
        let stream = Stream::new();
        stream.write("xyz").unwrap();
        stream.read_char().await.unwrap();
        assert_eq!(stream.read_sync().unwrap(), "yz");
    }

    #[tokio::test]
    async fn test_multibyte_characters() {
        let stream = Stream::from_text("é日");
        assert_eq!(stream.read_char().await.unwrap(), 'é');
        assert_eq!(stream.read_char().await.unwrap(), '日');
        assert_eq!(stream.read_char().await, Err(BashError::Eof));
    }

    #[tokio::test]
    async fn test_read_suspends_until_write() {
        let stream = Stream::new();
        let writer = stream.clone();
        let (got, ()) = tokio::join!(stream.read(), async move {
            tokio::task::yield_now().await;
            writer.write("late").unwrap();
        });
        assert_eq!(got.unwrap(), "late");
    }

    #[tokio::test]
    async fn test_read_suspends_until_close() {
        let stream = Stream::new();
        let closer = stream.clone();
        let (got, ()) = tokio::join!(stream.read_char(), async move {
            tokio::task::yield_now().await;
            closer.close().unwrap();
        });
        assert_eq!(got, Err(BashError::Eof));
    }

    #[tokio::test]
    async fn test_pending_read_does_not_resolve_without_input() {
        let stream = Stream::new();
        let timed = tokio::time::timeout(Duration::from_millis(10), stream.read());
        assert!(timed.await.is_err());
    }

    #[tokio::test]
    async fn test_close_is_sticky() {
        let stream = Stream::new();
        stream.close().unwrap();
        assert_eq!(stream.read().await, Err(BashError::Eof));
        assert_eq!(stream.read().await, Err(BashError::Eof));
        assert_eq!(stream.read_char().await, Err(BashError::Eof));
        assert_eq!(stream.peek().await, Err(BashError::Eof));
    }

    #[tokio::test]
    async fn test_buffered_data_survives_close() {
        let stream = Stream::new();
        stream.write("tail").unwrap();
        stream.close().unwrap();
        assert_eq!(stream.read().await.unwrap(), "tail");
        assert_eq!(stream.read().await, Err(BashError::Eof));
    }

    #[test]
    fn test_write_and_close_after_close_fail() {
        let stream = Stream::new();
        stream.close().unwrap();
        assert_eq!(stream.write("x"), Err(BashError::Closed));
        assert_eq!(stream.close(), Err(BashError::Closed));
    }

    #[test]
    fn test_read_sync() {
        let stream = Stream::new();
        assert_eq!(stream.read_sync().unwrap(), "");
        stream.write("name.txt").unwrap();
        assert_eq!(stream.read_sync().unwrap(), "name.txt");
        stream.close().unwrap();
        assert_eq!(stream.read_sync(), Err(BashError::Eof));
    }

    #[tokio::test]
    async fn test_waiters_resolve_in_fifo_order() {
        let stream = Stream::new();
        let writer = stream.clone();
        let order = RefCell::new(Vec::new());
        let first = async {
            let c = stream.read_char().await.unwrap();
            order.borrow_mut().push((1, c));
        };
        let second = async {
            let c = stream.read_char().await.unwrap();
            order.borrow_mut().push((2, c));
        };
        let feed = async move {
            tokio::task::yield_now().await;
            writer.write("ab").unwrap();
        };
        tokio::join!(first, second, feed);
        assert_eq!(order.into_inner(), vec![(1, 'a'), (2, 'b')]);
    }

    #[tokio::test]
    async fn test_cancelled_read() {
        let token = CancellationToken::new();
        let stream = Stream::with_cancel(token.clone());
        let (got, ()) = tokio::join!(stream.read(), async move {
            tokio::task::yield_now().await;
            token.cancel();
        });
        assert_eq!(got, Err(BashError::Cancelled));
    }
}
