//! Tracing subscriber setup.
//!
//! Log lines go to stderr through the shared `MultiProgress`, which hides
//! the progress bars while a line is written and redraws them after.

use std::io::{self, Write};

use indicatif::MultiProgress;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::MakeWriter;

/// Install the global subscriber.
///
/// `RUST_LOG` wins when set; otherwise `info`, or `debug` with `verbose`.
pub fn init(verbose: bool, progress: MultiProgress) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(verbose)
        .with_writer(ProgressAwareWriter { progress })
        .try_init();
}

/// Creates one [`SuspendingWriter`] per log event.
#[derive(Clone)]
struct ProgressAwareWriter {
    progress: MultiProgress,
}

impl<'a> MakeWriter<'a> for ProgressAwareWriter {
    type Writer = SuspendingWriter;

    fn make_writer(&'a self) -> Self::Writer {
        SuspendingWriter {
            progress: self.progress.clone(),
            buf: Vec::new(),
        }
    }
}

/// Buffers one formatted event and writes it on drop with the bars hidden.
struct SuspendingWriter {
    progress: MultiProgress,
    buf: Vec<u8>,
}

impl Write for SuspendingWriter {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.buf.extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        if self.buf.is_empty() {
            return Ok(());
        }
        let buf = std::mem::take(&mut self.buf);
        self.progress
            .suspend(|| io::stderr().lock().write_all(&buf))
    }
}

impl Drop for SuspendingWriter {
    fn drop(&mut self) {
        let _ = self.flush();
    }
}

#[cfg(test)]
mod tests {
    use indicatif::ProgressDrawTarget;

    use super::*;

    #[test]
    fn test_writer_buffers_until_flush() {
        let progress = MultiProgress::with_draw_target(ProgressDrawTarget::hidden());
        let make = ProgressAwareWriter { progress };
        let mut writer = make.make_writer();
        writer.write_all(b"hello ").unwrap();
        writer.write_all(b"world\n").unwrap();
        assert_eq!(writer.buf, b"hello world\n");
        writer.flush().unwrap();
        assert!(writer.buf.is_empty());
    }
}
