//! The migration builder.

use crate::alter::{self, AlterClause, ColumnDef, IndexDef};
use crate::command::CommandLine;
use crate::config::{MigrationConfig, check_coordinates, check_flag_key};
use crate::error::GhormResult;
use crate::exec::{ExecutionReport, Executor};
use crate::flags::FlagOption;
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

/// One online schema change: where gh-ost lives, what table to change, and how.
///
/// Holds a single ALTER fragment. Every builder call replaces it, so
/// `spec.add_column(..).remove_column("c1")` leaves only `DROP COLUMN c1`.
///
/// # Example
/// ```ignore
/// use ghorm::{ColumnDef, FlagOption, MigrationSpec};
///
/// let mut spec = MigrationSpec::new(
///     "/usr/local/bin/gh-ost", "127.0.0.1", "root", "secret", "shop", "orders",
///     [FlagOption::assume_master_host("db-master:3306")],
/// )?;
/// spec.add_column(ColumnDef::new("note", "varchar").length(255).comment("free text"));
/// spec.execute().await?;
/// ```
#[derive(Clone)]
pub struct MigrationSpec {
    binary_path: PathBuf,
    host: String,
    user: String,
    password: String,
    database: String,
    table: String,
    flags: BTreeMap<String, String>,
    alter: String,
}

impl MigrationSpec {
    /// Create a spec. Options are applied in order; later options win for the same key.
    ///
    /// Fails with [`MissingCoordinate`](crate::GhormError::MissingCoordinate) if the binary path or any
    /// coordinate is empty.
    pub fn new<I>(
        binary_path: impl Into<PathBuf>,
        host: impl Into<String>,
        user: impl Into<String>,
        password: impl Into<String>,
        database: impl Into<String>,
        table: impl Into<String>,
        options: I,
    ) -> GhormResult<Self>
    where
        I: IntoIterator<Item = FlagOption>,
    {
        let binary_path = binary_path.into();
        let (host, user, password) = (host.into(), user.into(), password.into());
        let (database, table) = (database.into(), table.into());
        check_coordinates(
            &binary_path,
            [
                ("host", host.as_str()),
                ("user", user.as_str()),
                ("password", password.as_str()),
                ("database", database.as_str()),
                ("table", table.as_str()),
            ],
        )?;
        let mut spec = Self {
            binary_path,
            host,
            user,
            password,
            database,
            table,
            flags: BTreeMap::new(),
            alter: String::new(),
        };
        for option in options {
            spec.apply(option)?;
        }
        Ok(spec)
    }

    /// Build a spec from deserialized configuration.
    pub fn from_config(config: MigrationConfig) -> GhormResult<Self> {
        config.validate()?;
        let options = config
            .flags
            .into_iter()
            .map(|(k, v)| FlagOption::with_value(k, v));
        Self::new(
            config.binary_path,
            config.host,
            config.user,
            config.password,
            config.database,
            config.table,
            options,
        )
    }

    /// Apply a flag option, overwriting any previous value for the same key.
    ///
    /// A key made only of dashes would render as a bare `--`, which ends gh-ost's flag
    /// parsing before `--execute`. Such keys fail with [`Config`](crate::GhormError::Config) and leave
    /// the flags untouched.
    pub fn apply(&mut self, option: FlagOption) -> GhormResult<&mut Self> {
        check_flag_key(option.key())?;
        let (key, value) = option.into_parts();
        self.flags.insert(key, value);
        Ok(self)
    }

    // ==================== Accessors ====================

    pub fn binary_path(&self) -> &Path {
        &self.binary_path
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn user(&self) -> &str {
        &self.user
    }

    pub(crate) fn password(&self) -> &str {
        &self.password
    }

    pub fn database(&self) -> &str {
        &self.database
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    /// Pass-through flags, keyed by name without dashes.
    pub fn flags(&self) -> &BTreeMap<String, String> {
        &self.flags
    }

    /// Current ALTER fragment; empty until a builder method is called.
    pub fn alter(&self) -> &str {
        &self.alter
    }

    // ==================== ALTER builders ====================

    /// Replace the fragment with a rendered clause.
    ///
    /// On error the previous fragment is kept.
    pub fn set_alter(&mut self, clause: AlterClause) -> GhormResult<&mut Self> {
        self.alter = clause.to_sql()?;
        Ok(self)
    }

    /// `engine=<engine>`
    pub fn set_engine(&mut self, engine: &str) -> &mut Self {
        self.alter = alter::engine_sql(engine);
        self
    }

    /// `ADD COLUMN ...`
    pub fn add_column(&mut self, column: ColumnDef) -> &mut Self {
        self.alter = column.render(alter::ADD_COLUMN);
        self
    }

    /// `MODIFY COLUMN ...`
    pub fn modify_column(&mut self, column: ColumnDef) -> &mut Self {
        self.alter = column.render(alter::MODIFY_COLUMN);
        self
    }

    /// `DROP COLUMN <name>`
    pub fn remove_column(&mut self, name: &str) -> &mut Self {
        self.alter = alter::drop_column_sql(name);
        self
    }

    /// `ADD [type] INDEX <name>(cols) [USING method]`
    ///
    /// Fails with [`EmptyIndexColumns`](crate::GhormError::EmptyIndexColumns) when the index has no columns.
    pub fn add_index(&mut self, index: IndexDef) -> GhormResult<&mut Self> {
        self.set_alter(AlterClause::AddIndex(index))
    }

    /// `DROP INDEX <name>`
    pub fn remove_index(&mut self, name: &str) -> &mut Self {
        self.alter = alter::drop_index_sql(name);
        self
    }

    // ==================== Execution ====================

    /// The gh-ost invocation for the current state.
    pub fn command_line(&self) -> CommandLine {
        CommandLine::from_spec(self)
    }

    /// Arguments passed to gh-ost, password included.
    pub fn args(&self) -> Vec<String> {
        self.command_line().args().to_vec()
    }

    /// Run gh-ost with default settings, forwarding its output to stdout.
    pub async fn execute(&self) -> GhormResult<ExecutionReport> {
        Executor::new().run(self).await
    }
}

impl fmt::Debug for MigrationSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MigrationSpec")
            .field("binary_path", &self.binary_path)
            .field("host", &self.host)
            .field("user", &self.user)
            .field("password", &"***")
            .field("database", &self.database)
            .field("table", &self.table)
            .field("flags", &self.flags)
            .field("alter", &self.alter)
            .finish()
    }
}
