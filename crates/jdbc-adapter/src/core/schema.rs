//! Schema and metadata types: logical types, native type tables, column
//! descriptors and DDL option sets.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::value::Value;

/// Portable type names used by the ORM layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogicalType {
    PrimaryKey,
    String,
    Text,
    Binary,
    Float,
    Decimal,
    Numeric,
    Integer,
    Smallint,
    Bigint,
    Real,
    Double,
    Date,
    Time,
    Datetime,
    Timestamp,
    Xml,
    Boolean,
}

impl LogicalType {
    /// Every logical type, in declaration order.
    pub const ALL: [LogicalType; 18] = [
        LogicalType::PrimaryKey,
        LogicalType::String,
        LogicalType::Text,
        LogicalType::Binary,
        LogicalType::Float,
        LogicalType::Decimal,
        LogicalType::Numeric,
        LogicalType::Integer,
        LogicalType::Smallint,
        LogicalType::Bigint,
        LogicalType::Real,
        LogicalType::Double,
        LogicalType::Date,
        LogicalType::Time,
        LogicalType::Datetime,
        LogicalType::Timestamp,
        LogicalType::Xml,
        LogicalType::Boolean,
    ];

    /// The ORM name of this type.
    pub fn as_str(&self) -> &'static str {
        match self {
            LogicalType::PrimaryKey => "primary_key",
            LogicalType::String => "string",
            LogicalType::Text => "text",
            LogicalType::Binary => "binary",
            LogicalType::Float => "float",
            LogicalType::Decimal => "decimal",
            LogicalType::Numeric => "numeric",
            LogicalType::Integer => "integer",
            LogicalType::Smallint => "smallint",
            LogicalType::Bigint => "bigint",
            LogicalType::Real => "real",
            LogicalType::Double => "double",
            LogicalType::Date => "date",
            LogicalType::Time => "time",
            LogicalType::Datetime => "datetime",
            LogicalType::Timestamp => "timestamp",
            LogicalType::Xml => "xml",
            LogicalType::Boolean => "boolean",
        }
    }
}

impl fmt::Display for LogicalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogicalType {
    type Err = String;

    /// Parse an ORM type name (case-insensitive).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        LogicalType::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == lower)
            .ok_or_else(|| format!("unknown logical type: {}", s))
    }
}

/// Native definition of a logical type for one dialect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NativeType {
    /// Native type name (or the full column definition for `primary_key`).
    pub name: String,
    /// Default limit.
    pub limit: Option<u32>,
    /// Default precision.
    pub precision: Option<u32>,
    /// Default scale.
    pub scale: Option<u32>,
}

impl NativeType {
    /// A native type with only a name.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            limit: None,
            precision: None,
            scale: None,
        }
    }

    /// A native type with a default limit.
    pub fn with_limit(name: impl Into<String>, limit: u32) -> Self {
        Self {
            limit: Some(limit),
            ..Self::named(name)
        }
    }

    /// A native type with default precision and scale.
    pub fn with_precision(name: impl Into<String>, precision: u32, scale: u32) -> Self {
        Self {
            precision: Some(precision),
            scale: Some(scale),
            ..Self::named(name)
        }
    }
}

/// Native type table keyed by logical type.
pub type NativeTypes = BTreeMap<LogicalType, NativeType>;

/// Raw column metadata as reported by the driver for `columns_internal`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ColumnMetadata {
    /// Column name.
    pub name: String,
    /// Driver type name (e.g. "VARCHAR", "DECIMAL").
    pub type_name: String,
    /// Reported column size (length or precision).
    pub column_size: Option<u32>,
    /// Reported decimal digits (scale).
    pub decimal_digits: Option<u32>,
    /// Whether the column allows NULL.
    pub is_nullable: bool,
    /// Raw default string as the driver returns it (may include quotes).
    pub default: Option<String>,
    /// Ordinal position (1-based).
    pub ordinal_pos: i32,
}

impl ColumnMetadata {
    /// Compose the sql type string the way the driver bridge does:
    /// `DECIMAL(5,2)`, `VARCHAR(255)`, bare names for everything else.
    pub fn sql_type(&self) -> String {
        let lower = self.type_name.to_lowercase();
        let is_numeric = lower.starts_with("dec") || lower.starts_with("numeric");
        match (self.column_size, self.decimal_digits) {
            (Some(size), Some(digits)) if is_numeric => {
                format!("{}({},{})", self.type_name, size, digits)
            }
            (Some(size), _) if is_numeric || lower.contains("char") => {
                format!("{}({})", self.type_name, size)
            }
            _ => self.type_name.clone(),
        }
    }
}

/// Column descriptor produced by introspection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    /// Column name.
    pub name: String,
    /// Normalized sql type string (lower-cased by the Derby mapper).
    pub sql_type: String,
    /// Logical type, `None` when no rule recognized the sql type.
    pub logical_type: Option<LogicalType>,
    /// Length limit.
    pub limit: Option<u32>,
    /// Numeric precision.
    pub precision: Option<u32>,
    /// Numeric scale.
    pub scale: Option<u32>,
    /// Whether the column allows NULL.
    pub is_nullable: bool,
    /// Post-processed default value.
    pub default: Option<String>,
    /// Ordinal position (1-based).
    pub ordinal_pos: i32,
}

/// Options for column DDL (`add_column`, `change_column`, table definitions).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColumnOptions {
    pub limit: Option<u32>,
    pub precision: Option<u32>,
    pub scale: Option<u32>,
    /// Column default. `Some(Value::Null)` is treated as no default.
    pub default: Option<Value>,
    /// `Some(false)` adds NOT NULL; `Some(true)` allows NULL explicitly.
    pub null: Option<bool>,
}

impl ColumnOptions {
    /// Empty options.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn precision(mut self, precision: u32, scale: u32) -> Self {
        self.precision = Some(precision);
        self.scale = Some(scale);
        self
    }

    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn null(mut self, allow: bool) -> Self {
        self.null = Some(allow);
        self
    }

    /// The default, ignoring an explicit NULL.
    pub fn effective_default(&self) -> Option<&Value> {
        self.default.as_ref().filter(|v| !v.is_null())
    }
}

/// Identifies an index either by its columns or by an explicit name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexSpec {
    /// Index over these columns; the name is derived.
    Columns(Vec<String>),
    /// Index with an explicit name.
    Name(String),
}

impl IndexSpec {
    /// Index over a single column.
    pub fn column(name: impl Into<String>) -> Self {
        IndexSpec::Columns(vec![name.into()])
    }
}

/// Row limiting for `add_limit_offset`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LimitOffset {
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

impl LimitOffset {
    pub fn limit(limit: u64) -> Self {
        Self {
            limit: Some(limit),
            offset: None,
        }
    }

    pub fn with_offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }
}

/// One column of a [`TableDefinition`].
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDefinition {
    pub name: String,
    /// Logical type name, or a raw native type passed through verbatim.
    pub type_name: String,
    pub options: ColumnOptions,
}

/// Builder for `create_table`.
#[derive(Debug, Clone, PartialEq)]
pub struct TableDefinition {
    pub name: String,
    /// Primary key column added first; `None` for tables without one.
    pub primary_key: Option<String>,
    pub columns: Vec<ColumnDefinition>,
}

impl TableDefinition {
    /// New table with the conventional `id` primary key.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            primary_key: Some("id".to_string()),
            columns: Vec::new(),
        }
    }

    /// Use a different primary key column name.
    pub fn primary_key(mut self, name: impl Into<String>) -> Self {
        self.primary_key = Some(name.into());
        self
    }

    /// Create the table without a primary key column.
    pub fn without_id(mut self) -> Self {
        self.primary_key = None;
        self
    }

    /// Add a column of any type.
    pub fn column(
        mut self,
        name: impl Into<String>,
        type_name: impl Into<String>,
        options: ColumnOptions,
    ) -> Self {
        self.columns.push(ColumnDefinition {
            name: name.into(),
            type_name: type_name.into(),
            options,
        });
        self
    }

    pub fn string(self, name: impl Into<String>, options: ColumnOptions) -> Self {
        self.column(name, "string", options)
    }

    pub fn integer(self, name: impl Into<String>, options: ColumnOptions) -> Self {
        self.column(name, "integer", options)
    }

    pub fn decimal(self, name: impl Into<String>, options: ColumnOptions) -> Self {
        self.column(name, "decimal", options)
    }

    pub fn boolean(self, name: impl Into<String>, options: ColumnOptions) -> Self {
        self.column(name, "boolean", options)
    }

    pub fn datetime(self, name: impl Into<String>, options: ColumnOptions) -> Self {
        self.column(name, "datetime", options)
    }

    pub fn text(self, name: impl Into<String>, options: ColumnOptions) -> Self {
        self.column(name, "text", options)
    }

    /// XML column (Derby native `xml`).
    pub fn xml(self, name: impl Into<String>, options: ColumnOptions) -> Self {
        self.column(name, "xml", options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metadata(type_name: &str, size: Option<u32>, digits: Option<u32>) -> ColumnMetadata {
        ColumnMetadata {
            name: "C".to_string(),
            type_name: type_name.to_string(),
            column_size: size,
            decimal_digits: digits,
            is_nullable: true,
            default: None,
            ordinal_pos: 1,
        }
    }

    #[test]
    fn test_logical_type_parse() {
        assert_eq!("integer".parse::<LogicalType>(), Ok(LogicalType::Integer));
        assert_eq!("DateTime".parse::<LogicalType>(), Ok(LogicalType::Datetime));
        assert_eq!(
            "primary_key".parse::<LogicalType>(),
            Ok(LogicalType::PrimaryKey)
        );
        assert!("geometry".parse::<LogicalType>().is_err());
    }

    #[test]
    fn test_logical_type_names_round_trip() {
        for t in LogicalType::ALL {
            assert_eq!(t.as_str().parse::<LogicalType>(), Ok(t));
        }
    }

    #[test]
    fn test_metadata_sql_type() {
        assert_eq!(
            metadata("DECIMAL", Some(5), Some(2)).sql_type(),
            "DECIMAL(5,2)"
        );
        assert_eq!(metadata("VARCHAR", Some(40), None).sql_type(), "VARCHAR(40)");
        assert_eq!(metadata("VARCHAR", None, None).sql_type(), "VARCHAR");
        assert_eq!(metadata("INTEGER", Some(10), Some(0)).sql_type(), "INTEGER");
        assert_eq!(metadata("TIMESTAMP", Some(29), Some(9)).sql_type(), "TIMESTAMP");
    }

    #[test]
    fn test_column_options_null_default_is_ignored() {
        let opts = ColumnOptions::new().default_value(Value::Null);
        assert!(opts.effective_default().is_none());

        let opts = ColumnOptions::new().default_value("x").null(false);
        assert_eq!(opts.effective_default(), Some(&Value::Text("x".into())));
        assert_eq!(opts.null, Some(false));
    }

    #[test]
    fn test_table_definition_builder() {
        let def = TableDefinition::new("posts")
            .string("title", ColumnOptions::new().limit(100))
            .xml("body", ColumnOptions::new());
        assert_eq!(def.primary_key.as_deref(), Some("id"));
        assert_eq!(def.columns.len(), 2);
        assert_eq!(def.columns[1].type_name, "xml");

        let def = TableDefinition::new("tags").without_id();
        assert!(def.primary_key.is_none());
    }
}
