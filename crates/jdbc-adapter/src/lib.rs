//! # jdbc-adapter
//!
//! Database dialect adapters for an ORM running over JDBC-style connections.
//!
//! This library sits between ORM code and a live driver connection and
//! provides:
//!
//! - **Dialect resolution** from configuration through a [`DialectRegistry`]
//! - **Exception translation** of driver failures into [`AdapterError`]
//! - **Type mapping** between logical column types and native SQL types
//! - **Column introspection** normalized through per-dialect rule tables
//! - **DDL generation** including Derby's copy-based column type changes
//! - **Apache Derby** support, with a generic JDBC fallback dialect
//!
//! ## Example
//!
//! ```rust,ignore
//! use jdbc_adapter::{AdapterConfig, DialectRegistry, JdbcAdapter};
//!
//! let config = AdapterConfig::load("database.yaml")?;
//! let registry = DialectRegistry::with_builtins();
//! let mut adapter = JdbcAdapter::new(Some(Box::new(connection)), config, &registry)?;
//!
//! for column in adapter.columns("users")? {
//!     println!("{} {:?}", column.name, column.logical_type);
//! }
//! ```

pub mod adapter;
pub mod config;
pub mod core;
pub mod drivers;
pub mod error;
pub mod typemap;

#[cfg(test)]
mod test_support;

// Re-exports for convenient access
pub use adapter::JdbcAdapter;
pub use config::{AdapterConfig, PoolConfig};
pub use core::{
    Column, ColumnMetadata, ColumnOptions, Connection, DatabaseMetadata, DialectRegistry,
    Dialect, Executor, IndexSpec, LimitOffset, LogicalType, QueryResult, TableDefinition, Value,
};
pub use drivers::{DerbyDialect, GenericDialect};
pub use error::{AdapterError, DriverError, DriverErrorKind, DriverResult, Result};
pub use typemap::ColumnTypeMapper;
