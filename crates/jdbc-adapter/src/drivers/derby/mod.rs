//! Apache Derby driver.
//!
//! This module provides Derby-specific implementations:
//!
//! - [`DerbyDialect`]: SQL syntax, DDL and introspection strategy for Derby
//! - `column`: rule tables for normalizing Derby column metadata
//! - `structure`: `CREATE TABLE` dump rebuilt from catalog metadata

mod column;
mod dialect;
mod structure;

pub use column::{GENERATED_DEFAULT, MAX_VARCHAR_LENGTH};
pub use dialect::DerbyDialect;
