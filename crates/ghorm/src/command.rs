//! gh-ost argument vector construction.

use crate::flags::render_flag;
use crate::migration::MigrationSpec;
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Stdio;

/// Flags passed on every run, after the connection coordinates and `--alter`.
///
/// Run on the primary, try instant DDL first, and clear `_gho`/`_del` tables left by
/// an earlier aborted run.
pub const FIXED_FLAGS: [&str; 4] = [
    "--allow-on-master",
    "--attempt-instant-ddl",
    "--initially-drop-ghost-table",
    "--initially-drop-old-table",
];

/// Always the last argument: perform the change instead of a dry run.
pub const EXECUTE_FLAG: &str = "--execute";

const PASSWORD_PREFIX: &str = "--password=";

/// The full gh-ost invocation for one migration.
///
/// `Display` renders the program followed by its arguments, with the password masked
/// unless redaction was turned off.
#[derive(Clone, PartialEq, Eq)]
pub struct CommandLine {
    program: PathBuf,
    args: Vec<String>,
    redact_password: bool,
}

impl CommandLine {
    pub(crate) fn from_spec(spec: &MigrationSpec) -> Self {
        let mut args = vec![
            format!("--host={}", spec.host()),
            format!("--user={}", spec.user()),
            format!("{PASSWORD_PREFIX}{}", spec.password()),
            format!("--database={}", spec.database()),
            format!("--table={}", spec.table()),
            format!("--alter={}", spec.alter()),
        ];
        args.extend(FIXED_FLAGS.iter().map(|f| f.to_string()));
        args.extend(spec.flags().iter().map(|(k, v)| render_flag(k, v)));
        args.push(EXECUTE_FLAG.to_string());

        Self {
            program: spec.binary_path().to_path_buf(),
            args,
            redact_password: true,
        }
    }

    /// Toggle password masking in the `Display` form.
    pub fn redact_password(mut self, redact: bool) -> Self {
        self.redact_password = redact;
        self
    }

    /// Path of the gh-ost binary.
    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Arguments, in the order they are passed to the child.
    pub fn args(&self) -> &[String] {
        &self.args
    }

    pub(crate) fn to_command(&self, kill_on_drop: bool) -> tokio::process::Command {
        let mut cmd = tokio::process::Command::new(&self.program);
        cmd.args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(kill_on_drop);
        cmd
    }
}

impl fmt::Display for CommandLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.display())?;
        for arg in &self.args {
            if self.redact_password && arg.starts_with(PASSWORD_PREFIX) {
                write!(f, " {PASSWORD_PREFIX}***")?;
            } else if arg.contains(char::is_whitespace) || arg.contains('"') {
                write!(f, " {arg:?}")?;
            } else {
                write!(f, " {arg}")?;
            }
        }
        Ok(())
    }
}

impl fmt::Debug for CommandLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("CommandLine")
            .field(&self.clone().redact_password(true).to_string())
            .finish()
    }
}
