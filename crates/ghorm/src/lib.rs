//! # ghorm
//!
//! A small builder facade over [gh-ost](https://github.com/github/gh-ost), the online
//! schema-change tool for MySQL.
//!
//! ## Features
//!
//! - **Fragment builder**: `ADD/MODIFY/DROP COLUMN`, `ADD/DROP INDEX` and engine changes
//!   assembled from structured input. Each call replaces the previous fragment.
//! - **Pass-through flags**: any gh-ost flag as `--key` or `--key=value`, plus named
//!   constructors for common ones
//! - **Process driver**: spawns gh-ost, forwards stdout/stderr line by line to a sink,
//!   and reports the exit status
//! - **Opinionated defaults**: always runs on the primary, attempts instant DDL and drops
//!   leftover ghost/old tables before starting
//!
//! gh-ost itself handles connections, row copy, throttling and cut-over. This crate never
//! talks to the database.
//!
//! ## Example
//!
//! ```ignore
//! use ghorm::{ColumnDef, FlagOption, IndexDef, MigrationSpec};
//!
//! let mut spec = MigrationSpec::new(
//!     "/usr/local/bin/gh-ost",
//!     "127.0.0.1",
//!     "root",
//!     "secret",
//!     "shop",
//!     "orders",
//!     [FlagOption::assume_master_host("db-master:3306"), FlagOption::chunk_size(500)],
//! )?;
//!
//! spec.add_column(
//!     ColumnDef::new("note", "varchar")
//!         .length(255)
//!         .not_null()
//!         .default_value("''")
//!         .comment("free text"),
//! );
//! spec.execute().await?;
//!
//! // Reuse the same spec for the next change.
//! spec.add_index(IndexDef::new("idx_note", ["note"]))?;
//! spec.execute().await?;
//! ```

pub mod alter;
pub mod command;
pub mod config;
pub mod error;
pub mod exec;
pub mod flags;
pub mod migration;
pub mod sink;

pub use alter::{AlterClause, ColumnDef, IndexDef};
pub use command::CommandLine;
pub use config::{ExecuteConfig, MigrationConfig};
pub use error::{GhormError, GhormResult};
pub use exec::{ExecutionReport, Executor};
pub use flags::FlagOption;
pub use migration::MigrationSpec;
pub use sink::{
    CompositeSink, MemorySink, OutputLine, OutputSink, StdoutSink, StreamKind, TracingSink,
};
