//! Error types for the adapter layer.

use std::borrow::Cow;
use std::fmt;

use thiserror::Error;

/// Category of a failure reported by a connection handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverErrorKind {
    /// SQL-level failure raised by the driver (the JDBC `SQLException` family).
    Sql,
    /// Platform-level throwable (driver bug, classloading, out of memory, ...).
    ///
    /// These are never rewrapped as statement errors.
    Native,
}

/// Error raised by a [`Connection`](crate::core::Connection) handle.
///
/// The message is kept as raw bytes because drivers do not guarantee the
/// encoding of their diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriverError {
    /// Error category.
    pub kind: DriverErrorKind,
    /// Class name of the driver exception (e.g. `java.sql.SQLSyntaxErrorException`).
    pub class_name: String,
    /// Raw message bytes as reported by the driver.
    pub message: Vec<u8>,
    /// Five character SQLSTATE, when the driver reported one.
    pub sql_state: Option<String>,
    /// Stack frames captured by the driver.
    pub backtrace: Vec<String>,
}

impl DriverError {
    /// Create an SQL-level driver error.
    pub fn sql(class_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: DriverErrorKind::Sql,
            class_name: class_name.into(),
            message: message.into().into_bytes(),
            sql_state: None,
            backtrace: Vec::new(),
        }
    }

    /// Create a platform-level driver error.
    pub fn native(class_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: DriverErrorKind::Native,
            ..Self::sql(class_name, message)
        }
    }

    /// Attach an SQLSTATE.
    pub fn with_sql_state(mut self, state: impl Into<String>) -> Self {
        self.sql_state = Some(state.into());
        self
    }

    /// Attach stack frames.
    pub fn with_backtrace<I, S>(mut self, frames: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.backtrace = frames.into_iter().map(Into::into).collect();
        self
    }

    /// Replace the message with raw bytes in an arbitrary encoding.
    pub fn with_raw_message(mut self, bytes: impl Into<Vec<u8>>) -> Self {
        self.message = bytes.into();
        self
    }

    /// Whether this is a platform-level error.
    pub fn is_native(&self) -> bool {
        self.kind == DriverErrorKind::Native
    }

    /// The message as text, replacing undecodable bytes.
    pub fn message_lossy(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.message)
    }
}

impl fmt::Display for DriverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.class_name, self.message_lossy())
    }
}

impl std::error::Error for DriverError {}

/// Result type for connection handle calls.
pub type DriverResult<T> = std::result::Result<T, DriverError>;

/// Main error type for adapter operations.
#[derive(Error, Debug)]
pub enum AdapterError {
    /// Configuration error (missing fields, unknown adapter, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// A statement failed; the message embeds the driver error and the SQL text.
    #[error("{message}")]
    StatementInvalid {
        message: String,
        sql: String,
        stack: Vec<String>,
        #[source]
        source: DriverError,
    },

    /// Platform-level driver failure, passed through untouched.
    #[error(transparent)]
    Native(DriverError),

    /// Invalid arguments for a DDL or type operation.
    #[error("Invalid argument: {0}")]
    Argument(String),

    /// Operation not provided by the active dialect.
    #[error("{operation} is not supported by the {dialect} adapter")]
    NotImplemented {
        operation: &'static str,
        dialect: String,
    },

    /// IO error (configuration files)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML serialization/deserialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl AdapterError {
    /// Create a NotImplemented error.
    pub fn not_implemented(operation: &'static str, dialect: impl Into<String>) -> Self {
        AdapterError::NotImplemented {
            operation,
            dialect: dialect.into(),
        }
    }

    /// The underlying driver error, if this error came from the connection handle.
    pub fn driver_error(&self) -> Option<&DriverError> {
        match self {
            AdapterError::StatementInvalid { source, .. } => Some(source),
            AdapterError::Native(e) => Some(e),
            _ => None,
        }
    }

    /// Stack frames carried over from the driver error.
    pub fn backtrace(&self) -> &[String] {
        match self {
            AdapterError::StatementInvalid { stack, .. } => stack,
            AdapterError::Native(e) => &e.backtrace,
            _ => &[],
        }
    }

    /// Format error with full details including error chain
    pub fn format_detailed(&self) -> String {
        let mut output = format!("Error: {}\n", self);

        let mut source = std::error::Error::source(self);
        let mut depth = 1;
        while let Some(err) = source {
            output.push_str(&format!("\nCaused by:\n  {}: {}", depth, err));
            source = err.source();
            depth += 1;
        }

        output
    }
}

/// Result type alias for adapter operations.
pub type Result<T> = std::result::Result<T, AdapterError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_driver_error_display() {
        let err = DriverError::sql("java.sql.SQLException", "Table 'T' does not exist");
        assert_eq!(
            err.to_string(),
            "java.sql.SQLException: Table 'T' does not exist"
        );
        assert!(!err.is_native());
    }

    #[test]
    fn test_driver_error_lossy_message() {
        let err = DriverError::sql("E", "").with_raw_message(vec![b'b', 0xE9, b'b']);
        assert_eq!(err.message_lossy(), "b\u{FFFD}b");
    }

    #[test]
    fn test_format_detailed_includes_source() {
        let source = DriverError::sql("java.sql.SQLException", "boom");
        let err = AdapterError::StatementInvalid {
            message: "java.sql.SQLException: boom: SELECT 1".to_string(),
            sql: "SELECT 1".to_string(),
            stack: Vec::new(),
            source,
        };
        let detailed = err.format_detailed();
        assert!(detailed.starts_with("Error: java.sql.SQLException: boom: SELECT 1"));
        assert!(detailed.contains("Caused by:\n  1: java.sql.SQLException: boom"));
    }

    #[test]
    fn test_not_implemented_message() {
        let err = AdapterError::not_implemented("change_column", "jdbc");
        assert_eq!(
            err.to_string(),
            "change_column is not supported by the jdbc adapter"
        );
    }
}
