//! Async line readers for child output (non-UTF8-safe).
//!
//! The downloader and the tools it shells out to can emit non-UTF8 bytes
//! (file names, localized messages). `BufReader::lines()` would stop on the
//! first invalid sequence, so lines are read as bytes and decoded lossily.

use std::fmt;

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::sync::mpsc;
use tracing::trace;

/// Which pipe a line came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamKind {
    Stdout,
    Stderr,
}

impl StreamKind {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Stdout => "stdout",
            Self::Stderr => "stderr",
        }
    }
}

impl fmt::Display for StreamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One decoded output line, without its terminator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLine {
    pub stream: StreamKind,
    pub text: String,
}

/// Read `stream` line by line and forward each line to `tx`.
///
/// The task ends at EOF, on a read error, or when the receiver is gone.
/// Dropping the last sender closes the channel, which is how the consumer
/// learns both pipes are drained.
pub fn spawn_line_reader(
    stream: impl AsyncRead + Unpin + Send + 'static,
    kind: StreamKind,
    tx: mpsc::Sender<OutputLine>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut reader = BufReader::new(stream);
        let mut buf: Vec<u8> = Vec::with_capacity(512);

        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf).await {
                Ok(0) => break,
                Ok(_) => {
                    while matches!(buf.last(), Some(b'\n' | b'\r')) {
                        buf.pop();
                    }
                    let text = String::from_utf8_lossy(&buf).into_owned();
                    if tx.send(OutputLine { stream: kind, text }).await.is_err() {
                        break;
                    }
                }
                Err(e) => {
                    trace!(stream = %kind, error = %e, "line reader exiting on read error");
                    break;
                }
            }
        }

        trace!(stream = %kind, "line reader exiting");
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_reads_lines_and_strips_terminators() {
        let input: &[u8] = b"first\r\nsecond\nno-newline";
        let (tx, mut rx) = mpsc::channel(8);
        spawn_line_reader(input, StreamKind::Stdout, tx);

        let mut lines = Vec::new();
        while let Some(line) = rx.recv().await {
            assert_eq!(line.stream, StreamKind::Stdout);
            lines.push(line.text);
        }
        assert_eq!(lines, vec!["first", "second", "no-newline"]);
    }

    #[tokio::test]
    async fn test_invalid_utf8_is_replaced_not_fatal() {
        let input: &[u8] = b"bad \xff byte\nafter\n";
        let (tx, mut rx) = mpsc::channel(8);
        spawn_line_reader(input, StreamKind::Stderr, tx);

        let first = rx.recv().await.unwrap();
        assert!(first.text.starts_with("bad "));
        assert!(first.text.contains('\u{fffd}'));
        assert_eq!(rx.recv().await.unwrap().text, "after");
        assert!(rx.recv().await.is_none());
    }
}
