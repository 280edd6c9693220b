//! ALTER fragment construction.
//!
//! A fragment is the clause body that follows `ALTER TABLE <t>`; gh-ost prepends the
//! table itself. Fragments are assembled purely syntactically: identifiers are not
//! validated and nothing is escaped.
//!
//! # Example
//!
//! ```ignore
//! use ghorm::alter::{AlterClause, ColumnDef, IndexDef};
//!
//! let add = AlterClause::AddColumn(
//!     ColumnDef::new("c1", "varchar").length(10).not_null().default_value("'a'"),
//! );
//! assert_eq!(add.to_sql()?, "ADD COLUMN c1 varchar(10) NOT NULL DEFAULT 'a'");
//!
//! let idx = AlterClause::AddIndex(IndexDef::unique("idx_c1", ["c1"]).method("BTREE"));
//! assert_eq!(idx.to_sql()?, "ADD UNIQUE INDEX idx_c1(c1) USING BTREE");
//! # Ok::<(), ghorm::GhormError>(())
//! ```

mod column;
mod index;


pub use column::ColumnDef;
pub use index::IndexDef;

use crate::error::GhormResult;

/// One ALTER clause in typed form.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AlterClause {
    /// `engine=<engine>`
    Engine(String),
    /// `ADD COLUMN ...`
    AddColumn(ColumnDef),
    /// `MODIFY COLUMN ...`
    ModifyColumn(ColumnDef),
    /// `DROP COLUMN <name>`
    DropColumn(String),
    /// `ADD [type] INDEX <name>(cols) [USING method]`
    AddIndex(IndexDef),
    /// `DROP INDEX <name>`
    DropIndex(String),
}

impl AlterClause {
    /// Render the clause body.
    ///
    /// Only `AddIndex` can fail, when its column list is empty.
    pub fn to_sql(&self) -> GhormResult<String> {
        Ok(match self {
            Self::Engine(engine) => engine_sql(engine),
            Self::AddColumn(column) => column.render(ADD_COLUMN),
            Self::ModifyColumn(column) => column.render(MODIFY_COLUMN),
            Self::DropColumn(name) => drop_column_sql(name),
            Self::AddIndex(index) => index.render()?,
            Self::DropIndex(name) => drop_index_sql(name),
        })
    }
}

pub(crate) const ADD_COLUMN: &str = "ADD COLUMN";
pub(crate) const MODIFY_COLUMN: &str = "MODIFY COLUMN";

pub(crate) fn engine_sql(engine: &str) -> String {
    format!("engine={engine}")
}

pub(crate) fn drop_column_sql(name: &str) -> String {
    format!("DROP COLUMN {name}")
}

pub(crate) fn drop_index_sql(name: &str) -> String {
    format!("DROP INDEX {name}")
}
