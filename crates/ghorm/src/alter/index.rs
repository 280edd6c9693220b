//! Index definitions for `ADD INDEX`.

use crate::error::{GhormError, GhormResult};

/// An index definition rendered into an `ADD [type] INDEX` clause.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct IndexDef {
    /// Index name
    pub name: String,
    /// Index kind such as `UNIQUE`, `FULLTEXT` or `SPATIAL`; empty for a plain index
    pub index_type: String,
    /// Index method such as `BTREE` or `HASH`; empty to let the server choose
    pub method: String,
    /// Indexed columns, in order
    pub columns: Vec<String>,
}

impl IndexDef {
    /// Create a plain index over `columns`.
    pub fn new<I, S>(name: impl Into<String>, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            columns: columns.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Shorthand for a `UNIQUE` index.
    pub fn unique<I, S>(name: impl Into<String>, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(name, columns).index_type("UNIQUE")
    }

    /// Set the index kind (`UNIQUE`, `FULLTEXT`, ...).
    pub fn index_type(mut self, index_type: impl Into<String>) -> Self {
        self.index_type = index_type.into();
        self
    }

    /// Set the `USING` method.
    pub fn method(mut self, method: impl Into<String>) -> Self {
        self.method = method.into();
        self
    }

    /// Append a column.
    pub fn column(mut self, column: impl Into<String>) -> Self {
        self.columns.push(column.into());
        self
    }

    /// Render the clause, rejecting an empty column list.
    pub(crate) fn render(&self) -> GhormResult<String> {
        if self.columns.is_empty() {
            return Err(GhormError::EmptyIndexColumns {
                index: self.name.clone(),
            });
        }

        let mut sql = if self.index_type.is_empty() {
            "ADD".to_string()
        } else {
            format!("ADD {}", self.index_type)
        };
        sql.push_str(" INDEX ");
        sql.push_str(&self.name);
        sql.push('(');
        sql.push_str(&self.columns.join(","));
        sql.push(')');

        if !self.method.is_empty() {
            sql.push_str(" USING ");
            sql.push_str(&self.method);
        }

        Ok(sql)
    }
}
