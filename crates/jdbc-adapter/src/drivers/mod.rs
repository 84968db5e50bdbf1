//! Database dialect implementations.
//!
//! This module provides database-specific implementations of the core traits:
//!
//! - [`derby`]: Apache Derby (embedded and network server)
//! - [`generic`]: Generic JDBC fallback
//!
//! # Architecture
//!
//! Each driver module implements `Dialect`, the SQL syntax and DDL strategy
//! for the database engine. Connections are supplied by the embedding
//! application, either directly or through a factory registered in the
//! `DialectRegistry`.
//!
//! # Adding New Databases
//!
//! To add support for a new database:
//!
//! 1. Create a new module under `drivers/` (e.g., `drivers/h2/`)
//! 2. Implement the `Dialect` trait, overriding only what differs from the
//!    generic defaults
//! 3. Register it in `DialectRegistry::with_builtins()`

pub mod derby;
pub mod generic;

pub use derby::DerbyDialect;
pub use generic::GenericDialect;
