//! Generic JDBC dialect.
//!
//! Used when no database-specific dialect matches the configuration. Every
//! operation is the [`Dialect`] default: ANSI quoting, `LIMIT`/`OFFSET` row
//! limiting and the generic native type table.

use crate::core::traits::Dialect;
use crate::typemap::ColumnTypeMapper;

static GENERIC_MAPPER: ColumnTypeMapper = ColumnTypeMapper::generic();

/// Generic dialect implementation.
#[derive(Debug, Clone, Default)]
pub struct GenericDialect;

impl GenericDialect {
    /// Create a new generic dialect instance.
    pub fn new() -> Self {
        Self
    }
}

impl Dialect for GenericDialect {
    fn name(&self) -> &str {
        "jdbc"
    }

    fn adapter_name(&self) -> &str {
        "JDBC"
    }

    fn column_mapper(&self) -> &ColumnTypeMapper {
        &GENERIC_MAPPER
    }
}
