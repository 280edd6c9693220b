//! Running gh-ost as a child process.
//!
//! # Example
//!
//! ```rust,ignore
//! use ghorm::{ExecuteConfig, Executor, TracingSink};
//!
//! let executor = Executor::new()
//!     .with_config(ExecuteConfig::new().kill_on_drop(true))
//!     .with_sink(TracingSink::uniform());
//!
//! let report = executor.run(&spec).await?;
//! println!("done in {:?}", report.elapsed);
//! ```

use crate::config::ExecuteConfig;
use crate::error::{GhormError, GhormResult};
use crate::migration::MigrationSpec;
use crate::sink::{OutputSink, StdoutSink, StreamKind};
use std::fmt;
use std::future::Future;
use std::process::ExitStatus;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::task::JoinHandle;
use tracing::Level;

/// Dispatch a tracing event at a runtime-determined level.
macro_rules! emit_at_level {
    ($level:expr, $($field:tt)*) => {
        match $level {
            Level::ERROR => tracing::error!($($field)*),
            Level::WARN  => tracing::warn!($($field)*),
            Level::INFO  => tracing::info!($($field)*),
            Level::DEBUG => tracing::debug!($($field)*),
            Level::TRACE => tracing::trace!($($field)*),
        }
    };
}

/// Outcome of a successful run.
#[derive(Debug, Clone, Copy)]
pub struct ExecutionReport {
    /// Exit status of the child (always success).
    pub status: ExitStatus,
    /// Lines forwarded from stdout.
    pub stdout_lines: u64,
    /// Lines forwarded from stderr.
    pub stderr_lines: u64,
    /// Wall time from spawn to exit.
    pub elapsed: Duration,
}

/// Launches gh-ost for a [`MigrationSpec`] and forwards its output to a sink.
///
/// Each run spawns the child plus one drain task per output stream, waits for the
/// child to exit, then gives both drains up to [`ExecuteConfig::drain_grace`] to reach
/// EOF so every line has reached the sink before the run returns.
#[derive(Clone)]
pub struct Executor {
    config: ExecuteConfig,
    sink: Arc<dyn OutputSink>,
}

impl Default for Executor {
    fn default() -> Self {
        Self {
            config: ExecuteConfig::default(),
            sink: Arc::new(StdoutSink),
        }
    }
}

impl Executor {
    /// Executor with default config, forwarding output to stdout.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(mut self, config: ExecuteConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_sink<S: OutputSink + 'static>(mut self, sink: S) -> Self {
        self.sink = Arc::new(sink);
        self
    }

    pub fn config(&self) -> &ExecuteConfig {
        &self.config
    }

    /// Run the migration to completion. No timeout is applied.
    pub async fn run(&self, spec: &MigrationSpec) -> GhormResult<ExecutionReport> {
        self.run_until(spec, std::future::pending::<()>()).await
    }

    /// Run the migration, killing the child if `shutdown` completes first.
    ///
    /// A cancelled run returns [`GhormError::Cancelled`].
    pub async fn run_until<F>(
        &self,
        spec: &MigrationSpec,
        shutdown: F,
    ) -> GhormResult<ExecutionReport>
    where
        F: Future<Output = ()>,
    {
        if spec.alter().is_empty() {
            return Err(GhormError::EmptyAlter);
        }

        let command_line = spec
            .command_line()
            .redact_password(self.config.redact_password);
        emit_at_level!(
            self.config.log_level,
            target: "ghorm.exec",
            database = spec.database(),
            table = spec.table(),
            command = %command_line,
            "starting gh-ost"
        );

        let started = Instant::now();
        let mut child = command_line
            .to_command(self.config.kill_on_drop)
            .spawn()
            .map_err(|source| GhormError::Spawn {
                binary: command_line.program().to_path_buf(),
                source,
            })?;

        let Some(stdout) = child.stdout.take() else {
            let _ = child.start_kill();
            return Err(GhormError::Pipe("stdout"));
        };
        let Some(stderr) = child.stderr.take() else {
            let _ = child.start_kill();
            return Err(GhormError::Pipe("stderr"));
        };

        let mut drains = Drains::spawn(stdout, stderr, &self.sink);

        tokio::pin!(shutdown);
        let waited = tokio::select! {
            status = child.wait() => Some(status),
            () = &mut shutdown => None,
        };

        let status = match waited {
            Some(Ok(status)) => status,
            Some(Err(err)) => {
                let _ = child.start_kill();
                return Err(err.into());
            }
            None => {
                tracing::warn!(
                    target: "ghorm.exec",
                    database = spec.database(),
                    table = spec.table(),
                    "shutdown requested, killing gh-ost"
                );
                child.kill().await?;
                if let Err(err) = drains.settle(self.config.drain_grace).await {
                    tracing::debug!(
                        target: "ghorm.exec",
                        error = %err,
                        "drain failed after kill"
                    );
                }
                return Err(GhormError::Cancelled);
            }
        };

        let drained = tokio::select! {
            drained = drains.settle(self.config.drain_grace) => drained,
            () = &mut shutdown => {
                tracing::warn!(
                    target: "ghorm.exec",
                    database = spec.database(),
                    table = spec.table(),
                    "shutdown requested while draining gh-ost output"
                );
                return Err(GhormError::Cancelled);
            }
        };
        let elapsed = started.elapsed();
        let (stdout_lines, stderr_lines) = drains.counts();

        if let Err(err) = exit_outcome(status, drained) {
            tracing::warn!(
                target: "ghorm.exec",
                database = spec.database(),
                table = spec.table(),
                status = %status,
                elapsed = ?elapsed,
                error = %err,
                "gh-ost failed"
            );
            return Err(err);
        }

        emit_at_level!(
            self.config.log_level,
            target: "ghorm.exec",
            database = spec.database(),
            table = spec.table(),
            stdout_lines,
            stderr_lines,
            elapsed = ?elapsed,
            "gh-ost finished"
        );

        Ok(ExecutionReport {
            status,
            stdout_lines,
            stderr_lines,
            elapsed,
        })
    }
}

impl fmt::Debug for Executor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Executor")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// A non-zero exit wins over a drain failure.
fn exit_outcome(status: ExitStatus, drained: GhormResult<()>) -> GhormResult<()> {
    if !status.success() {
        return Err(GhormError::Exit { status });
    }
    drained
}

/// The two output drain tasks of one run. Dropping it aborts both.
struct Drains {
    stdout: JoinHandle<std::io::Result<()>>,
    stderr: JoinHandle<std::io::Result<()>>,
    stdout_lines: Arc<AtomicU64>,
    stderr_lines: Arc<AtomicU64>,
}

impl Drains {
    fn spawn<O, E>(stdout: O, stderr: E, sink: &Arc<dyn OutputSink>) -> Self
    where
        O: AsyncRead + Unpin + Send + 'static,
        E: AsyncRead + Unpin + Send + 'static,
    {
        let stdout_lines = Arc::new(AtomicU64::new(0));
        let stderr_lines = Arc::new(AtomicU64::new(0));
        Self {
            stdout: tokio::spawn(drain(
                stdout,
                StreamKind::Stdout,
                sink.clone(),
                stdout_lines.clone(),
            )),
            stderr: tokio::spawn(drain(
                stderr,
                StreamKind::Stderr,
                sink.clone(),
                stderr_lines.clone(),
            )),
            stdout_lines,
            stderr_lines,
        }
    }

    /// Wait up to `grace` for both streams to reach EOF.
    ///
    /// On overrun the drains are aborted and the output still in flight is dropped.
    async fn settle(&mut self, grace: Duration) -> GhormResult<()> {
        let joined = tokio::time::timeout(grace, async {
            let stdout = (&mut self.stdout).await;
            let stderr = (&mut self.stderr).await;
            (stdout, stderr)
        })
        .await;

        match joined {
            Ok((stdout, stderr)) => {
                stdout??;
                stderr??;
                Ok(())
            }
            Err(_) => {
                self.abort();
                tracing::warn!(
                    target: "ghorm.exec",
                    grace = ?grace,
                    "gh-ost output still open after exit, dropping the rest"
                );
                Ok(())
            }
        }
    }

    fn abort(&self) {
        self.stdout.abort();
        self.stderr.abort();
    }

    fn counts(&self) -> (u64, u64) {
        (
            self.stdout_lines.load(Ordering::Relaxed),
            self.stderr_lines.load(Ordering::Relaxed),
        )
    }
}

impl Drop for Drains {
    fn drop(&mut self) {
        self.abort();
    }
}

/// Forward a stream to the sink line by line until EOF, counting lines as they go.
async fn drain<R>(
    reader: R,
    stream: StreamKind,
    sink: Arc<dyn OutputSink>,
    count: Arc<AtomicU64>,
) -> std::io::Result<()>
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();

    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf).await? == 0 {
            return Ok(());
        }
        let line = String::from_utf8_lossy(trim_line_end(&buf));
        sink.line(stream, &line);
        count.fetch_add(1, Ordering::Relaxed);
    }
}

fn trim_line_end(buf: &[u8]) -> &[u8] {
    let buf = buf.strip_suffix(b"\n").unwrap_or(buf);
    buf.strip_suffix(b"\r").unwrap_or(buf)
}
