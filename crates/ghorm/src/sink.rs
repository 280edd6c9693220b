//! Destinations for forwarded gh-ost output.
//!
//! The driver hands every line of the child's stdout and stderr to an [`OutputSink`]
//! verbatim. Lines of one stream arrive in emission order; the two streams are not
//! ordered relative to each other.

use std::fmt;
use std::io::Write;
use std::sync::{Arc, Mutex};

/// Which child stream a line came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamKind {
    Stdout,
    Stderr,
}

impl StreamKind {
    pub fn as_str(self) -> &'static str {
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

/// Receives child output, one line at a time.
///
/// Called concurrently from both drain tasks.
pub trait OutputSink: Send + Sync {
    /// Handle one line, without its trailing newline.
    fn line(&self, stream: StreamKind, line: &str);
}

impl<S: OutputSink + ?Sized> OutputSink for Arc<S> {
    fn line(&self, stream: StreamKind, line: &str) {
        (**self).line(stream, line)
    }
}

/// Writes every line, from either stream, to the host's standard output.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdoutSink;

impl OutputSink for StdoutSink {
    fn line(&self, _stream: StreamKind, line: &str) {
        let mut out = std::io::stdout().lock();
        // A closed stdout must not abort the migration.
        let _ = writeln!(out, "{line}");
    }
}

/// Emits every line as a `tracing` event on target `ghorm.output`.
///
/// stdout lines are logged at `INFO`, stderr lines at `WARN`. gh-ost writes its
/// regular progress to stderr, so use [`TracingSink::uniform`] to log both at `INFO`.
#[derive(Debug, Clone, Copy)]
pub struct TracingSink {
    stderr_as_warn: bool,
}

impl Default for TracingSink {
    fn default() -> Self {
        Self {
            stderr_as_warn: true,
        }
    }
}

impl TracingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Log both streams at `INFO`.
    pub fn uniform() -> Self {
        Self {
            stderr_as_warn: false,
        }
    }
}

impl OutputSink for TracingSink {
    fn line(&self, stream: StreamKind, line: &str) {
        match stream {
            StreamKind::Stderr if self.stderr_as_warn => {
                tracing::warn!(target: "ghorm.output", stream = %stream, "{line}")
            }
            _ => tracing::info!(target: "ghorm.output", stream = %stream, "{line}"),
        }
    }
}

/// One captured line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLine {
    pub stream: StreamKind,
    pub line: String,
}

/// Collects lines in memory.
///
/// Clones share the same buffer, so keep one clone and hand another to the executor.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    lines: Arc<Mutex<Vec<OutputLine>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every captured line, in arrival order.
    pub fn lines(&self) -> Vec<OutputLine> {
        self.lines
            .lock()
            .map(|lines| lines.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }

    /// Captured lines of one stream, in emission order.
    pub fn stream(&self, stream: StreamKind) -> Vec<String> {
        self.lines()
            .into_iter()
            .filter(|l| l.stream == stream)
            .map(|l| l.line)
            .collect()
    }

    pub fn clear(&self) {
        match self.lines.lock() {
            Ok(mut lines) => lines.clear(),
            Err(poisoned) => poisoned.into_inner().clear(),
        }
    }
}

impl OutputSink for MemorySink {
    fn line(&self, stream: StreamKind, line: &str) {
        let entry = OutputLine {
            stream,
            line: line.to_string(),
        };
        match self.lines.lock() {
            Ok(mut lines) => lines.push(entry),
            Err(poisoned) => poisoned.into_inner().push(entry),
        }
    }
}

/// Fans every line out to several sinks, in the order they were added.
#[derive(Clone, Default)]
pub struct CompositeSink {
    sinks: Vec<Arc<dyn OutputSink>>,
}

impl CompositeSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add<S: OutputSink + 'static>(mut self, sink: S) -> Self {
        self.sinks.push(Arc::new(sink));
        self
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

impl OutputSink for CompositeSink {
    fn line(&self, stream: StreamKind, line: &str) {
        for sink in &self.sinks {
            sink.line(stream, line);
        }
    }
}

impl fmt::Debug for CompositeSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompositeSink")
            .field("sinks", &self.sinks.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_sink_keeps_order_per_stream() {
        let sink = MemorySink::new();
        sink.line(StreamKind::Stdout, "a");
        sink.line(StreamKind::Stderr, "x");
        sink.line(StreamKind::Stdout, "b");

        assert_eq!(sink.stream(StreamKind::Stdout), ["a", "b"]);
        assert_eq!(sink.stream(StreamKind::Stderr), ["x"]);
        assert_eq!(sink.lines().len(), 3);

        sink.clear();
        assert!(sink.lines().is_empty());
    }

    #[test]
    fn composite_sink_fans_out() {
        let first = MemorySink::new();
        let second = MemorySink::new();
        let sink = CompositeSink::new()
            .add(first.clone())
            .add(second.clone())
            .add(TracingSink::uniform());
        assert_eq!(sink.len(), 3);

        sink.line(StreamKind::Stderr, "Copy: 10/100 10.0%");

        let expected = vec![OutputLine {
            stream: StreamKind::Stderr,
            line: "Copy: 10/100 10.0%".to_string(),
        }];
        assert_eq!(first.lines(), expected);
        assert_eq!(second.lines(), expected);
    }

    #[test]
    fn stream_kind_display() {
        assert_eq!(StreamKind::Stdout.to_string(), "stdout");
        assert_eq!(StreamKind::Stderr.as_str(), "stderr");
    }
}
