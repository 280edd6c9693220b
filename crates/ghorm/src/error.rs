//! Error types for ghorm

use std::path::PathBuf;
use std::process::ExitStatus;
use thiserror::Error;

/// Result type alias for ghorm operations
pub type GhormResult<T> = Result<T, GhormError>;

/// Errors raised while building or running a migration.
#[derive(Debug, Error)]
pub enum GhormError {
    /// Execution was requested before any ALTER fragment was set
    #[error("alter statement can not be empty")]
    EmptyAlter,

    /// `ADD INDEX` without columns
    #[error("index '{index}': columns can not be empty")]
    EmptyIndexColumns { index: String },

    /// A required connection coordinate was empty at construction
    #[error("missing required coordinate: {0}")]
    MissingCoordinate(&'static str),

    /// The tool binary could not be started
    #[error("failed to start {}: {source}", binary.display())]
    Spawn {
        binary: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A child pipe was not available after spawn
    #[error("failed to attach to child {0}")]
    Pipe(&'static str),

    /// The tool exited with a non-zero status
    #[error("gh-ost exited with {status}")]
    Exit { status: ExitStatus },

    /// Reading from a child stream failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A stream drain task panicked or was aborted
    #[error("output drain task failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    /// The run was cancelled and the child was killed
    #[error("migration cancelled")]
    Cancelled,

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),
}

impl GhormError {
    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Check if the child exited with a non-zero status
    pub fn is_exit(&self) -> bool {
        matches!(self, Self::Exit { .. })
    }

    /// Check if the run was cancelled
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Exit code of the child, when the error carries one.
    ///
    /// Returns `None` for other errors and for children killed by a signal.
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            Self::Exit { status } => status.code(),
            _ => None,
        }
    }
}
