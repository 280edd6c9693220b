//! Driver and migration configuration.

use crate::error::{GhormError, GhormResult};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::Level;

/// Configuration for an [`Executor`](crate::Executor).
///
/// Defaults: password redacted in logs, child left running if the future is dropped,
/// command line logged at `INFO`, two seconds for output to drain once the child is gone.
#[derive(Debug, Clone)]
pub struct ExecuteConfig {
    /// Replace the password with `***` when logging the command line.
    pub redact_password: bool,
    /// Kill the child if the in-flight run future is dropped.
    pub kill_on_drop: bool,
    /// Level of the lifecycle events (command line, exit status).
    pub log_level: Level,
    /// How long to keep reading output after the child exits or is killed.
    ///
    /// A grandchild that inherited the pipes can hold them open past the exit; the
    /// remaining output is dropped once this elapses.
    pub drain_grace: Duration,
}

impl Default for ExecuteConfig {
    fn default() -> Self {
        Self {
            redact_password: true,
            kill_on_drop: false,
            log_level: Level::INFO,
            drain_grace: Duration::from_secs(2),
        }
    }
}

impl ExecuteConfig {
    /// Create a configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable password redaction in logs.
    pub fn redact_password(mut self, redact: bool) -> Self {
        self.redact_password = redact;
        self
    }

    /// Kill the child when the run future is dropped.
    pub fn kill_on_drop(mut self, kill: bool) -> Self {
        self.kill_on_drop = kill;
        self
    }

    /// Override the level of lifecycle events.
    pub fn log_level(mut self, level: Level) -> Self {
        self.log_level = level;
        self
    }

    /// Set the output drain window after exit or kill.
    pub fn drain_grace(mut self, grace: Duration) -> Self {
        self.drain_grace = grace;
        self
    }
}

/// Connection coordinates and flags in deserializable form.
///
/// Meant to be embedded in an application's own configuration, e.g. a TOML table:
///
/// ```toml
/// binary_path = "/usr/local/bin/gh-ost"
/// host = "127.0.0.1"
/// user = "root"
/// password = "secret"
/// database = "shop"
/// table = "orders"
///
/// [flags]
/// chunk-size = "500"
/// exact-rowcount = ""
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct MigrationConfig {
    pub binary_path: PathBuf,
    pub host: String,
    pub user: String,
    pub password: String,
    pub database: String,
    pub table: String,
    #[serde(default)]
    pub flags: BTreeMap<String, String>,
}

impl MigrationConfig {
    /// Check required fields and flag keys.
    pub fn validate(&self) -> GhormResult<()> {
        check_coordinates(
            &self.binary_path,
            [
                ("host", self.host.as_str()),
                ("user", self.user.as_str()),
                ("password", self.password.as_str()),
                ("database", self.database.as_str()),
                ("table", self.table.as_str()),
            ],
        )?;
        for key in self.flags.keys() {
            check_flag_key(key)?;
        }
        Ok(())
    }
}

/// Reject an empty binary path or any empty coordinate, naming the first one missing.
pub(crate) fn check_coordinates(
    binary_path: &Path,
    coordinates: [(&'static str, &str); 5],
) -> GhormResult<()> {
    if binary_path.as_os_str().is_empty() {
        return Err(GhormError::MissingCoordinate("binary_path"));
    }
    match coordinates.iter().find(|(_, value)| value.is_empty()) {
        Some((name, _)) => Err(GhormError::MissingCoordinate(*name)),
        None => Ok(()),
    }
}

/// A key made only of dashes would render as a bare `--`.
pub(crate) fn check_flag_key(key: &str) -> GhormResult<()> {
    if key.trim_start_matches('-').is_empty() {
        return Err(GhormError::config("flag name can not be empty"));
    }
    Ok(())
}
