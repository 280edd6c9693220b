//! Pass-through gh-ost flags.
//!
//! A flag is rendered as `--key=value`, or `--key` when its value is empty. The
//! facade does not know what the flags mean; the named constructors below only fix
//! the key of a few well-known gh-ost options.

use std::fmt::Display;
use std::path::Path;

/// One flag option applied to a [`MigrationSpec`](crate::MigrationSpec).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FlagOption {
    key: String,
    value: String,
}

impl FlagOption {
    /// A valueless flag (`--key`).
    pub fn new(key: impl Into<String>) -> Self {
        Self::with_value(key, "")
    }

    /// A flag with a value (`--key=value`). An empty value renders as `--key`.
    ///
    /// Leading dashes on `key` are stripped.
    pub fn with_value(key: impl Into<String>, value: impl Into<String>) -> Self {
        let key = key.into();
        Self {
            key: key.trim_start_matches('-').to_string(),
            value: value.into(),
        }
    }

    /// Flag name without leading dashes.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Flag value; empty for valueless flags.
    pub fn value(&self) -> &str {
        &self.value
    }

    pub(crate) fn into_parts(self) -> (String, String) {
        (self.key, self.value)
    }

    // ==================== Topology ====================

    /// `--assume-master-host`: name the master explicitly instead of letting gh-ost
    /// crawl the replication topology (master-master or tungsten setups).
    pub fn assume_master_host(host: impl Into<String>) -> Self {
        Self::with_value("assume-master-host", host)
    }

    /// `--allow-master-master`
    pub fn allow_master_master() -> Self {
        Self::new("allow-master-master")
    }

    /// `--port`
    pub fn port(port: u16) -> Self {
        Self::with_value("port", port.to_string())
    }

    /// `--assume-rbr`: skip the binlog format check and restart.
    pub fn assume_rbr() -> Self {
        Self::new("assume-rbr")
    }

    /// `--switch-to-rbr`
    pub fn switch_to_rbr() -> Self {
        Self::new("switch-to-rbr")
    }

    // ==================== Throttling ====================

    /// `--chunk-size`: rows copied per iteration.
    pub fn chunk_size(rows: u32) -> Self {
        Self::with_value("chunk-size", rows.to_string())
    }

    /// `--max-load`, e.g. `Threads_running=25`.
    pub fn max_load(thresholds: impl Into<String>) -> Self {
        Self::with_value("max-load", thresholds)
    }

    /// `--critical-load`, e.g. `Threads_running=1000`.
    pub fn critical_load(thresholds: impl Into<String>) -> Self {
        Self::with_value("critical-load", thresholds)
    }

    /// `--max-lag-millis`
    pub fn max_lag_millis(millis: impl Display) -> Self {
        Self::with_value("max-lag-millis", millis.to_string())
    }

    /// `--throttle-control-replicas`, a comma separated `host:port` list.
    pub fn throttle_control_replicas(replicas: impl Into<String>) -> Self {
        Self::with_value("throttle-control-replicas", replicas)
    }

    // ==================== Cut-over ====================

    /// `--cut-over` (`atomic` or `two-step`).
    pub fn cut_over(kind: impl Into<String>) -> Self {
        Self::with_value("cut-over", kind)
    }

    /// `--postpone-cut-over-flag-file`
    pub fn postpone_cut_over_flag_file(path: impl AsRef<Path>) -> Self {
        Self::with_value(
            "postpone-cut-over-flag-file",
            path.as_ref().display().to_string(),
        )
    }

    /// `--ok-to-drop-table`: drop the old table at the end of the migration.
    pub fn ok_to_drop_table() -> Self {
        Self::new("ok-to-drop-table")
    }

    // ==================== Misc ====================

    /// `--exact-rowcount`
    pub fn exact_rowcount() -> Self {
        Self::new("exact-rowcount")
    }

    /// `--serve-socket-file`
    pub fn serve_socket_file(path: impl AsRef<Path>) -> Self {
        Self::with_value("serve-socket-file", path.as_ref().display().to_string())
    }
}

/// Render one flag as a command-line argument.
pub(crate) fn render_flag(key: &str, value: &str) -> String {
    if value.is_empty() {
        format!("--{key}")
    } else {
        format!("--{key}={value}")
    }
}
