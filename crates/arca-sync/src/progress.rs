//! Progress output for push and pull

use parking_lot::Mutex;
use std::io::Write;
use std::sync::Arc;

/// Receives human-readable progress lines
pub trait ProgressSink: Send + Sync {
    fn line(&self, message: &str);
}

/// Writes progress lines to any `io::Write`
#[derive(Debug)]
pub struct WriterSink<W> {
    writer: Mutex<W>,
}

impl<W: Write + Send> WriterSink<W> {
    #[must_use]
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    /// Recover the writer
    pub fn into_inner(self) -> W {
        self.writer.into_inner()
    }
}

impl<W: Write + Send> ProgressSink for WriterSink<W> {
    fn line(&self, message: &str) {
        let mut writer = self.writer.lock();
        if let Err(err) = writeln!(writer, "{message}").and_then(|()| writer.flush()) {
            tracing::warn!(error = %err, "failed to write progress");
        }
    }
}

/// Collects progress lines in memory
#[derive(Debug, Default)]
pub struct MemorySink {
    lines: Mutex<Vec<String>>,
}

impl MemorySink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Lines received so far
    #[must_use]
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().clone()
    }
}

impl ProgressSink for MemorySink {
    fn line(&self, message: &str) {
        self.lines.lock().push(message.to_string());
    }
}

/// Per-session progress channel honouring `quiet`
#[derive(Clone, Default)]
pub(crate) struct Progress {
    sink: Option<Arc<dyn ProgressSink>>,
    quiet: bool,
}

impl Progress {
    pub(crate) fn new(sink: Option<Arc<dyn ProgressSink>>, quiet: bool) -> Self {
        Self { sink, quiet }
    }

    pub(crate) fn line(&self, message: &str) {
        if self.quiet {
            return;
        }
        if let Some(sink) = &self.sink {
            sink.line(message);
        }
    }
}
