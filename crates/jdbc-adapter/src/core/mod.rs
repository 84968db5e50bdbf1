//! Core abstractions for database-agnostic adapters.
//!
//! This module provides the foundational types and traits used throughout
//! the adapter layer:
//!
//! - [`schema`]: logical types, column metadata and DDL option types
//! - [`value`]: SQL values and query results
//! - [`traits`]: the connection, executor and dialect traits
//! - [`catalog`]: dialect registry for dependency injection
//! - [`exception`]: driver error translation
//! - [`identifier`]: identifier validation and quoting
//!
//! # Architecture
//!
//! The core module defines database-agnostic abstractions that are implemented
//! by driver modules (`drivers/derby`, `drivers/generic`). New databases are
//! added by implementing [`Dialect`] and registering it in a
//! [`DialectRegistry`], without touching core code.
//!
//! # Design Patterns
//!
//! - **Registry**: `DialectRegistry` maps identifiers to dialects and factories
//! - **Strategy**: `Dialect` provides interchangeable SQL generation
//! - **Template Method**: Default trait method implementations define the
//!   generic behaviour that dialects override

pub mod catalog;
pub mod exception;
pub mod identifier;
pub mod schema;
pub mod traits;
pub mod value;

// Re-export commonly used types for convenience
pub use catalog::{ConnectionFactory, DialectRegistry, GENERIC_DIALECT};
pub use exception::translate_exception;
pub use schema::{
    Column, ColumnDefinition, ColumnMetadata, ColumnOptions, IndexSpec, LimitOffset, LogicalType,
    NativeType, NativeTypes, TableDefinition,
};
pub use traits::{with_transaction, Connection, DatabaseMetadata, Dialect, Executor};
pub use value::{MetadataRow, QueryResult, Row, Value};
