//! Input sources feeding the driver.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::io::BufRead;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, Lines};
use tokio::sync::mpsc;
use tracing::warn;

/// A stream of input units.
///
/// Returning `None` ends ingestion. Implementations must be cancel-safe:
/// the driver races `next` against its report tick and stop signal.
#[async_trait]
pub trait Source<T: Send>: Send {
    /// Yields the next unit, or `None` once exhausted.
    async fn next(&mut self) -> Option<T>;
}

/// Units received over a tokio channel. Ends when every sender is dropped.
#[derive(Debug)]
pub struct ChannelSource<T> {
    rx: mpsc::Receiver<T>,
}

impl<T> ChannelSource<T> {
    /// Wraps an existing receiver.
    pub fn new(rx: mpsc::Receiver<T>) -> Self {
        Self { rx }
    }

    /// Creates a bounded channel and returns its sender with the source.
    pub fn channel(buffer: usize) -> (mpsc::Sender<T>, Self) {
        let (tx, rx) = mpsc::channel(buffer.max(1));
        (tx, Self::new(rx))
    }
}

impl ChannelSource<String> {
    /// Reads non-blank lines of a blocking reader on a dedicated thread.
    ///
    /// The thread is detached, so a read that never returns (an idle
    /// terminal, an open pipe) does not keep the process alive once the
    /// driver has stopped. It exits when the reader ends or the source is
    /// dropped.
    pub fn from_reader<R>(reader: R, buffer: usize) -> std::io::Result<Self>
    where
        R: BufRead + Send + 'static,
    {
        let (tx, source) = Self::channel(buffer);
        std::thread::Builder::new()
            .name("stagewire-input".to_string())
            .spawn(move || {
                for line in reader.lines() {
                    let line = match line {
                        Ok(line) => line,
                        Err(e) => {
                            warn!(error = %e, "Input read failed, ending ingestion");
                            break;
                        }
                    };
                    if let Some(unit) = line_unit(line) {
                        if tx.blocking_send(unit).is_err() {
                            break;
                        }
                    }
                }
            })?;
        Ok(source)
    }

    /// Reads lines from standard input.
    pub fn stdin(buffer: usize) -> std::io::Result<Self> {
        Self::from_reader(std::io::BufReader::new(std::io::stdin()), buffer)
    }
}

#[async_trait]
impl<T: Send> Source<T> for ChannelSource<T> {
    async fn next(&mut self) -> Option<T> {
        self.rx.recv().await
    }
}

/// Units held in memory.
#[derive(Debug, Default)]
pub struct IterSource<T> {
    items: VecDeque<T>,
}

impl<T> IterSource<T> {
    /// Creates a source yielding `items` in order.
    pub fn new(items: impl IntoIterator<Item = T>) -> Self {
        Self {
            items: items.into_iter().collect(),
        }
    }

    /// Units not yet yielded.
    pub fn remaining(&self) -> usize {
        self.items.len()
    }
}

#[async_trait]
impl<T: Send> Source<T> for IterSource<T> {
    async fn next(&mut self) -> Option<T> {
        self.items.pop_front()
    }
}

/// Non-empty lines of an async reader, such as stdin.
#[derive(Debug)]
pub struct LineSource<R> {
    lines: Lines<R>,
}

impl<R: AsyncBufRead + Unpin> LineSource<R> {
    /// Reads lines from `reader`.
    pub fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
        }
    }
}

#[async_trait]
impl<R: AsyncBufRead + Unpin + Send> Source<String> for LineSource<R> {
    async fn next(&mut self) -> Option<String> {
        loop {
            match self.lines.next_line().await {
                Ok(Some(line)) => {
                    if let Some(unit) = line_unit(line) {
                        return Some(unit);
                    }
                }
                Ok(None) => return None,
                Err(e) => {
                    warn!(error = %e, "Input read failed, ending ingestion");
                    return None;
                }
            }
        }
    }
}

/// Drops a trailing `\r` and skips lines that are only whitespace.
/// Everything else is passed on untouched.
fn line_unit(mut line: String) -> Option<String> {
    if line.ends_with('\r') {
        line.pop();
    }
    if line.trim().is_empty() {
        None
    } else {
        Some(line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_iter_source_drains_in_order() {
        let mut source = IterSource::new(vec![1, 2, 3]);
        assert_eq!(source.remaining(), 3);
        assert_eq!(source.next().await, Some(1));
        assert_eq!(source.next().await, Some(2));
        assert_eq!(source.next().await, Some(3));
        assert_eq!(source.next().await, None);
    }

    #[tokio::test]
    async fn test_channel_source_ends_when_senders_drop() {
        let (tx, mut source) = ChannelSource::channel(4);
        tx.send("a".to_string()).await.unwrap();
        drop(tx);

        assert_eq!(source.next().await.as_deref(), Some("a"));
        assert_eq!(source.next().await, None);
    }

    #[tokio::test]
    async fn test_line_source_skips_blank_lines() {
        let input: &[u8] = b"first\n\n   \n  second  \n";
        let mut source = LineSource::new(input);

        assert_eq!(source.next().await.as_deref(), Some("first"));
        assert_eq!(source.next().await.as_deref(), Some("  second  "));
        assert_eq!(source.next().await, None);
    }

    #[tokio::test]
    async fn test_line_source_keeps_payload_but_drops_crlf() {
        let input: &[u8] = b"{\"note\": \" padded \"}\r\n\r\n\tindented\r\n";
        let mut source = LineSource::new(input);

        assert_eq!(
            source.next().await.as_deref(),
            Some(r#"{"note": " padded "}"#)
        );
        assert_eq!(source.next().await.as_deref(), Some("\tindented"));
        assert_eq!(source.next().await, None);
    }

    #[tokio::test]
    async fn test_reader_thread_feeds_channel() {
        let input = std::io::Cursor::new(b"one\r\n\n  two \n".to_vec());
        let mut source = ChannelSource::from_reader(input, 1).unwrap();

        assert_eq!(source.next().await.as_deref(), Some("one"));
        assert_eq!(source.next().await.as_deref(), Some("  two "));
        assert_eq!(source.next().await, None);
    }
}
