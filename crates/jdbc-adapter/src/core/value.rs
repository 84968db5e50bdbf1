//! Values and result sets exchanged with connection handles.

use std::fmt;

/// A single SQL cell value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// SQL NULL.
    Null,
    /// Boolean value.
    Bool(bool),
    /// Any integral value.
    Int(i64),
    /// Floating point value.
    Float(f64),
    /// Character data (also used for decimals the driver reports as text).
    Text(String),
}

impl Value {
    /// Check if this value is NULL.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Coerce to an integer the way a lenient `to_i` would.
    ///
    /// NULL and unparsable text become 0; floats are truncated.
    pub fn to_i64(&self) -> i64 {
        match self {
            Value::Null => 0,
            Value::Bool(b) => i64::from(*b),
            Value::Int(v) => *v,
            Value::Float(v) => *v as i64,
            Value::Text(s) => {
                let trimmed = s.trim();
                let digits_end = trimmed
                    .char_indices()
                    .find(|&(i, c)| !(c.is_ascii_digit() || (i == 0 && (c == '-' || c == '+'))))
                    .map(|(i, _)| i)
                    .unwrap_or(trimmed.len());
                trimmed[..digits_end].parse().unwrap_or(0)
            }
        }
    }

    /// Render as text, `None` for NULL.
    pub fn as_text(&self) -> Option<String> {
        match self {
            Value::Null => None,
            other => Some(other.to_string()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(v) => write!(f, "{}", v),
            Value::Float(v) => write!(f, "{}", v),
            Value::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v as i64)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

/// Rows returned by a statement, plus the update count.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryResult {
    /// Column labels, in select-list order.
    pub columns: Vec<String>,
    /// Row data; each row has one value per column label.
    pub rows: Vec<Vec<Value>>,
    /// Update count for DML/DDL statements.
    pub rows_affected: u64,
}

impl QueryResult {
    /// Result of a statement that returns no rows.
    pub fn affected(rows_affected: u64) -> Self {
        Self {
            rows_affected,
            ..Self::default()
        }
    }

    /// Result carrying rows.
    pub fn with_rows(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        Self {
            columns,
            rows,
            rows_affected: 0,
        }
    }

    /// Iterate rows as label-addressable views.
    pub fn iter(&self) -> impl Iterator<Item = Row<'_>> {
        self.rows.iter().map(move |values| Row {
            columns: &self.columns,
            values,
        })
    }

    /// First row, if any.
    pub fn first(&self) -> Option<Row<'_>> {
        self.iter().next()
    }

    /// First column of the first row.
    pub fn scalar(&self) -> Option<&Value> {
        self.rows.first().and_then(|r| r.first())
    }

    /// Check if no rows were returned.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// A borrowed row addressed by column label.
#[derive(Debug, Clone, Copy)]
pub struct Row<'a> {
    columns: &'a [String],
    values: &'a [Value],
}

impl<'a> Row<'a> {
    /// Look up a value by label (case-insensitive, as drivers differ on label case).
    pub fn get(&self, label: &str) -> Option<&'a Value> {
        self.columns
            .iter()
            .position(|c| c.eq_ignore_ascii_case(label))
            .and_then(|i| self.values.get(i))
    }

    /// Look up a non-NULL value as text.
    pub fn get_text(&self, label: &str) -> Option<String> {
        self.get(label).and_then(Value::as_text)
    }
}

/// One row of a driver metadata result set (`getTables`, `getColumns`).
///
/// Addressed by 1-based position like a JDBC `ResultSet`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetadataRow {
    values: Vec<Option<String>>,
}

impl MetadataRow {
    /// Create a metadata row from positional values.
    pub fn new(values: Vec<Option<String>>) -> Self {
        Self { values }
    }

    /// Get the string at a 1-based column index.
    pub fn get_string(&self, index: usize) -> Option<&str> {
        index
            .checked_sub(1)
            .and_then(|i| self.values.get(i))
            .and_then(|v| v.as_deref())
    }
}
