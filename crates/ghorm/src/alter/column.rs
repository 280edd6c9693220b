//! Column definitions for `ADD COLUMN` / `MODIFY COLUMN`.

/// A column definition rendered into an `ADD COLUMN` or `MODIFY COLUMN` clause.
///
/// Every optional part is omitted when left at its zero value. Nothing is escaped:
/// `default` is emitted verbatim and `comment` is wrapped in single quotes as-is.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ColumnDef {
    /// Column name
    pub name: String,
    /// Column type without its length, e.g. `varchar`
    pub data_type: String,
    /// Type length, `0` means none
    pub length: u32,
    /// Decimal places, only used together with a non-zero `length`
    pub decimal: u32,
    /// Body following `CHARACTER`, e.g. `SET utf8mb4 COLLATE utf8mb4_bin`
    pub charset: String,
    /// Emit `NOT NULL`
    pub not_null: bool,
    /// Raw default expression, quoted by the caller when needed
    pub default: String,
    /// Column comment
    pub comment: String,
}

impl ColumnDef {
    /// Create a column definition with a name and type.
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
            ..Self::default()
        }
    }

    /// Set the type length, e.g. `varchar(255)`.
    pub fn length(mut self, length: u32) -> Self {
        self.length = length;
        self
    }

    /// Set the decimal places, e.g. `decimal(10,3)`.
    pub fn decimal(mut self, decimal: u32) -> Self {
        self.decimal = decimal;
        self
    }

    /// Set the `CHARACTER ...` body.
    pub fn charset(mut self, charset: impl Into<String>) -> Self {
        self.charset = charset.into();
        self
    }

    /// Mark the column `NOT NULL`.
    pub fn not_null(mut self) -> Self {
        self.not_null = true;
        self
    }

    /// Set `NOT NULL` from a flag.
    pub fn nullable(mut self, nullable: bool) -> Self {
        self.not_null = !nullable;
        self
    }

    /// Set the raw default expression.
    pub fn default_value(mut self, default: impl Into<String>) -> Self {
        self.default = default.into();
        self
    }

    /// Set the column comment.
    pub fn comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = comment.into();
        self
    }

    /// Type with its `(length[,decimal])` suffix.
    pub fn type_sql(&self) -> String {
        let mut ty = self.data_type.clone();
        if self.length > 0 && self.decimal > 0 {
            ty.push_str(&format!("({},{})", self.length, self.decimal));
        } else if self.length > 0 {
            ty.push_str(&format!("({})", self.length));
        }
        ty
    }

    /// Render the clause with the given leading keyword (`ADD COLUMN` / `MODIFY COLUMN`).
    pub(crate) fn render(&self, keyword: &str) -> String {
        let mut tokens: Vec<String> = vec![keyword.to_string()];

        if !self.name.is_empty() {
            tokens.push(self.name.clone());
        }
        if !self.data_type.is_empty() {
            tokens.push(self.type_sql());
        }
        if !self.charset.is_empty() {
            tokens.push(format!("CHARACTER {}", self.charset));
        }
        if self.not_null {
            tokens.push("NOT NULL".to_string());
        }
        if !self.default.is_empty() {
            tokens.push(format!("DEFAULT {}", self.default));
        }
        if !self.comment.is_empty() {
            tokens.push(format!("COMMENT '{}'", self.comment));
        }

        tokens.join(" ")
    }
}
