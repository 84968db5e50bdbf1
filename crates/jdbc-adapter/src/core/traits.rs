//! Core traits of the adapter layer.
//!
//! - [`Connection`]: the live driver handle supplied by the embedding application
//! - [`DatabaseMetadata`]: positional catalog introspection on that handle
//! - [`Executor`]: the generic execution surface a dialect calls back into
//! - [`Dialect`]: per-database SQL/DDL generation and introspection strategy
//!
//! # Design Patterns
//!
//! - **Strategy**: each database plugs in a `Dialect`
//! - **Template Method**: default `Dialect` methods are the generic base
//!   behaviour that dialects override piecemeal

use std::any::Any;
use std::borrow::Cow;

use tracing::{debug, warn};

use crate::config::AdapterConfig;
use crate::error::{AdapterError, DriverResult, Result};
use crate::typemap::{self, ColumnTypeMapper};

use super::exception::translate_exception;
use super::identifier::{qualify_with, quote_ansi, quote_string_literal, validate_identifier};
use super::schema::{
    Column, ColumnMetadata, ColumnOptions, IndexSpec, LimitOffset, NativeTypes, TableDefinition,
};
use super::value::{MetadataRow, QueryResult, Value};

/// A live database session.
///
/// Exclusively owned by one [`JdbcAdapter`](crate::JdbcAdapter); calls are
/// synchronous and return once the driver round trip completes.
pub trait Connection: Send {
    /// Session setup hook, run once right after construction.
    fn configure_connection(&mut self) -> DriverResult<()> {
        Ok(())
    }

    /// Execute one statement.
    fn execute(&mut self, sql: &str) -> DriverResult<QueryResult>;

    /// Column metadata for a table.
    fn columns_internal(
        &mut self,
        table: &str,
        catalog: Option<&str>,
        schema: &str,
    ) -> DriverResult<Vec<ColumnMetadata>>;

    /// Table names in a schema.
    fn tables(&mut self, catalog: Option<&str>, schema: &str) -> DriverResult<Vec<String>>;

    /// Primary key column names of a table.
    fn primary_keys(&mut self, table: &str) -> DriverResult<Vec<String>>;

    /// Catalog metadata access.
    fn metadata(&mut self) -> DriverResult<&mut dyn DatabaseMetadata>;

    /// Start a transaction.
    fn begin(&mut self) -> DriverResult<()>;

    /// Commit the current transaction.
    fn commit(&mut self) -> DriverResult<()>;

    /// Roll back the current transaction.
    fn rollback(&mut self) -> DriverResult<()>;

    /// The raw connection object.
    ///
    /// With `unwrap`, a pooling or proxy wrapper should hand out the native
    /// object it wraps rather than itself.
    fn jdbc_connection(&self, unwrap: bool) -> &dyn Any;

    /// Release the session.
    fn close(&mut self) -> DriverResult<()> {
        Ok(())
    }
}

/// Catalog introspection with JDBC-style positional result rows.
pub trait DatabaseMetadata {
    /// `getTables`: column 3 is the table name.
    fn get_tables(
        &mut self,
        catalog: Option<&str>,
        schema_pattern: Option<&str>,
        table_pattern: Option<&str>,
        types: &[&str],
    ) -> DriverResult<Vec<MetadataRow>>;

    /// `getColumns`: 4 name, 6 type, 7 size, 13 default, 18 nullable ("YES"/"NO").
    fn get_columns(
        &mut self,
        catalog: Option<&str>,
        schema_pattern: Option<&str>,
        table_pattern: Option<&str>,
        column_pattern: Option<&str>,
    ) -> DriverResult<Vec<MetadataRow>>;
}

/// Execution surface a dialect uses to reach the database.
///
/// Implemented by [`JdbcAdapter`](crate::JdbcAdapter). Driver errors come
/// back already translated.
pub trait Executor {
    /// The adapter configuration.
    fn config(&self) -> &AdapterConfig;

    /// Execute a statement after the dialect's SQL rewriting.
    fn execute(&mut self, sql: &str) -> Result<QueryResult>;

    /// First column of the first row, `None` when no row came back.
    fn select_value(&mut self, sql: &str) -> Result<Option<Value>> {
        Ok(self.execute(sql)?.scalar().cloned())
    }

    /// The underlying handle, for metadata calls.
    fn connection(&mut self) -> &mut dyn Connection;

    fn begin_transaction(&mut self) -> Result<()>;

    fn commit_transaction(&mut self) -> Result<()>;

    fn rollback_transaction(&mut self) -> Result<()>;
}

/// Run `f` inside a transaction: commit on `Ok`, roll back on `Err`.
pub fn with_transaction<T, F>(exec: &mut dyn Executor, f: F) -> Result<T>
where
    F: FnOnce(&mut dyn Executor) -> Result<T>,
{
    exec.begin_transaction()?;
    match f(exec) {
        Ok(value) => {
            exec.commit_transaction()?;
            Ok(value)
        }
        Err(e) => {
            if let Err(rollback_err) = exec.rollback_transaction() {
                warn!("Rollback failed after error '{}': {}", e, rollback_err);
            }
            Err(e)
        }
    }
}

/// SQL syntax, type mapping, DDL and introspection strategy for one database.
///
/// Implementations are stateless: the configuration and live connection are
/// reached through the [`Executor`] passed to each operation. Default
/// methods implement the generic JDBC behaviour.
pub trait Dialect: Send + Sync {
    /// Registry identifier (e.g. "derby").
    fn name(&self) -> &str;

    /// Human-readable adapter name (e.g. "Derby").
    fn adapter_name(&self) -> &str;

    /// Column metadata normalizer for this dialect.
    fn column_mapper(&self) -> &ColumnTypeMapper;

    // ===== Connection =====

    /// Session setup statements, run after the handle's own hook.
    fn configure_connection(&self, _exec: &mut dyn Executor) -> Result<()> {
        Ok(())
    }

    /// Schema used for introspection queries.
    fn schema_name(&self, config: &AdapterConfig) -> String {
        config.schema.clone().unwrap_or_default()
    }

    // ===== Types =====

    /// Native type table keyed by logical type.
    fn native_database_types(&self) -> NativeTypes {
        typemap::generic_native_types()
    }

    /// Adjust a driver-derived type table.
    fn modify_types(&self, types: NativeTypes) -> NativeTypes {
        types
    }

    /// Render a column type.
    fn type_to_sql(
        &self,
        type_name: &str,
        limit: Option<u32>,
        precision: Option<u32>,
        scale: Option<u32>,
    ) -> Result<String> {
        typemap::type_to_sql(
            &self.native_database_types(),
            type_name,
            limit,
            precision,
            scale,
        )
    }

    // ===== Quoting =====

    fn quote_column_name(&self, name: &str) -> String {
        quote_ansi(name)
    }

    /// Quote a possibly schema-qualified table name.
    fn quote_table_name(&self, name: &str) -> String {
        qualify_with(name, |part| self.quote_column_name(part))
    }

    /// Render a value as an SQL literal.
    fn quote_value(&self, value: &Value) -> String {
        match value {
            Value::Null => "NULL".to_string(),
            Value::Bool(true) => "TRUE".to_string(),
            Value::Bool(false) => "FALSE".to_string(),
            Value::Int(v) => v.to_string(),
            Value::Float(v) => v.to_string(),
            Value::Text(s) => quote_string_literal(s),
        }
    }

    // ===== SQL generation =====

    /// Rewrite a statement before it reaches the driver.
    fn rewrite_sql<'a>(&self, sql: &'a str) -> Cow<'a, str> {
        Cow::Borrowed(sql)
    }

    /// DISTINCT clause for `columns` given ORDER BY fragments.
    fn distinct(&self, columns: &str, _order_by: &[&str]) -> String {
        format!("DISTINCT {}", columns)
    }

    /// Append row limiting to a SELECT.
    fn add_limit_offset(&self, sql: &mut String, opts: LimitOffset) {
        if let Some(limit) = opts.limit {
            sql.push_str(&format!(" LIMIT {}", limit));
        }
        if let Some(offset) = opts.offset {
            sql.push_str(&format!(" OFFSET {}", offset));
        }
    }

    /// Append DEFAULT / NOT NULL to a column definition.
    fn add_column_options(&self, sql: &mut String, options: &ColumnOptions) {
        if let Some(default) = &options.default {
            sql.push_str(&format!(" DEFAULT {}", self.quote_value(default)));
        }
        if options.null == Some(false) {
            sql.push_str(" NOT NULL");
        }
    }

    /// Longest index name the database accepts.
    fn index_name_length(&self) -> usize {
        64
    }

    /// Index name for a spec: explicit, or `index_<table>_on_<c1>_and_<c2>`.
    fn index_name(&self, table: &str, spec: &IndexSpec) -> Result<String> {
        match spec {
            IndexSpec::Name(name) => Ok(name.clone()),
            IndexSpec::Columns(cols) if !cols.is_empty() => {
                Ok(format!("index_{}_on_{}", table, cols.join("_and_")))
            }
            IndexSpec::Columns(_) => Err(AdapterError::Argument(
                "You must specify the index name".to_string(),
            )),
        }
    }

    /// Whether a failed in-place type change means "conversion not supported".
    fn is_unsupported_conversion(&self, _err: &AdapterError) -> bool {
        false
    }

    // ===== Introspection =====

    /// Column descriptors for a table.
    fn columns(&self, exec: &mut dyn Executor, table: &str) -> Result<Vec<Column>> {
        let schema = self.schema_name(exec.config());
        let raw = exec
            .connection()
            .columns_internal(table, None, &schema)
            .map_err(|e| translate_exception(e, &format!("columns_internal({})", table)))?;

        Ok(raw.iter().map(|m| self.column_mapper().column(m)).collect())
    }

    /// Table names in the configured schema.
    fn tables(&self, exec: &mut dyn Executor) -> Result<Vec<String>> {
        let schema = self.schema_name(exec.config());
        exec.connection()
            .tables(None, &schema)
            .map_err(|e| translate_exception(e, &format!("tables({})", schema)))
    }

    /// Primary key columns of a table.
    fn primary_keys(&self, exec: &mut dyn Executor, table: &str) -> Result<Vec<String>> {
        exec.connection()
            .primary_keys(table)
            .map_err(|e| translate_exception(e, &format!("primary_keys({})", table)))
    }

    /// `CREATE TABLE` statements for every table, rebuilt from metadata.
    fn structure_dump(&self, _exec: &mut dyn Executor) -> Result<String> {
        Err(AdapterError::not_implemented("structure_dump", self.name()))
    }

    // ===== DDL =====

    fn create_table(&self, exec: &mut dyn Executor, definition: &TableDefinition) -> Result<()> {
        validate_identifier(&definition.name)?;

        let mut parts = Vec::with_capacity(definition.columns.len() + 1);
        if let Some(pk) = &definition.primary_key {
            validate_identifier(pk)?;
            parts.push(format!(
                "{} {}",
                self.quote_column_name(pk),
                self.type_to_sql("primary_key", None, None, None)?
            ));
        }
        for col in &definition.columns {
            validate_identifier(&col.name)?;
            let mut part = format!(
                "{} {}",
                self.quote_column_name(&col.name),
                self.type_to_sql(
                    &col.type_name,
                    col.options.limit,
                    col.options.precision,
                    col.options.scale
                )?
            );
            self.add_column_options(&mut part, &col.options);
            parts.push(part);
        }

        let sql = format!(
            "CREATE TABLE {} ({})",
            self.quote_table_name(&definition.name),
            parts.join(", ")
        );
        exec.execute(&sql)?;
        debug!("Created table {}", definition.name);
        Ok(())
    }

    fn drop_table(&self, exec: &mut dyn Executor, table: &str) -> Result<()> {
        exec.execute(&format!("DROP TABLE {}", self.quote_table_name(table)))?;
        debug!("Dropped table {}", table);
        Ok(())
    }

    fn add_column(
        &self,
        exec: &mut dyn Executor,
        table: &str,
        column: &str,
        type_name: &str,
        options: &ColumnOptions,
    ) -> Result<()> {
        validate_identifier(column)?;
        let mut sql = format!(
            "ALTER TABLE {} ADD {} {}",
            self.quote_table_name(table),
            self.quote_column_name(column),
            self.type_to_sql(type_name, options.limit, options.precision, options.scale)?
        );
        self.add_column_options(&mut sql, options);
        exec.execute(&sql)?;
        debug!("Added column {}.{}", table, column);
        Ok(())
    }

    fn remove_column(&self, exec: &mut dyn Executor, table: &str, columns: &[&str]) -> Result<()> {
        for column in columns {
            exec.execute(&format!(
                "ALTER TABLE {} DROP {}",
                self.quote_table_name(table),
                self.quote_column_name(column)
            ))?;
            debug!("Removed column {}.{}", table, column);
        }
        Ok(())
    }

    fn rename_column(
        &self,
        exec: &mut dyn Executor,
        table: &str,
        column: &str,
        new_name: &str,
    ) -> Result<()> {
        validate_identifier(new_name)?;
        exec.execute(&format!(
            "ALTER TABLE {} RENAME COLUMN {} TO {}",
            self.quote_table_name(table),
            self.quote_column_name(column),
            self.quote_column_name(new_name)
        ))?;
        Ok(())
    }

    fn rename_table(&self, exec: &mut dyn Executor, name: &str, new_name: &str) -> Result<()> {
        validate_identifier(new_name)?;
        exec.execute(&format!(
            "ALTER TABLE {} RENAME TO {}",
            self.quote_table_name(name),
            self.quote_table_name(new_name)
        ))?;
        Ok(())
    }

    /// Change a column's type and options.
    fn change_column(
        &self,
        _exec: &mut dyn Executor,
        _table: &str,
        _column: &str,
        _type_name: &str,
        _options: &ColumnOptions,
    ) -> Result<()> {
        Err(AdapterError::not_implemented("change_column", self.name()))
    }

    fn add_index(
        &self,
        exec: &mut dyn Executor,
        table: &str,
        columns: &[&str],
        name: Option<&str>,
        unique: bool,
    ) -> Result<()> {
        let spec = match name {
            Some(n) => IndexSpec::Name(n.to_string()),
            None => IndexSpec::Columns(columns.iter().map(|c| c.to_string()).collect()),
        };
        let index_name = self.index_name(table, &spec)?;
        if index_name.chars().count() > self.index_name_length() {
            return Err(AdapterError::Argument(format!(
                "Index name '{}' on table '{}' is too long; the limit is {} characters",
                index_name,
                table,
                self.index_name_length()
            )));
        }

        let quoted_columns = columns
            .iter()
            .map(|c| self.quote_column_name(c))
            .collect::<Vec<_>>()
            .join(", ");

        exec.execute(&format!(
            "CREATE {}INDEX {} ON {} ({})",
            if unique { "UNIQUE " } else { "" },
            self.quote_column_name(&index_name),
            self.quote_table_name(table),
            quoted_columns
        ))?;
        debug!("Created index {} on {}", index_name, table);
        Ok(())
    }

    fn remove_index(&self, exec: &mut dyn Executor, table: &str, spec: &IndexSpec) -> Result<()> {
        let index_name = self.index_name(table, spec)?;
        exec.execute(&format!(
            "DROP INDEX {} ON {}",
            self.quote_column_name(&index_name),
            self.quote_table_name(table)
        ))?;
        Ok(())
    }

    /// Restart an identity column one past the current maximum.
    fn reset_sequence(&self, _exec: &mut dyn Executor, _table: &str, _column: &str) -> Result<()> {
        Err(AdapterError::not_implemented("reset_sequence", self.name()))
    }

    /// Reset the sequence behind a table's primary key.
    fn reset_pk_sequence(
        &self,
        _exec: &mut dyn Executor,
        _table: &str,
        _pk: Option<&str>,
    ) -> Result<()> {
        Err(AdapterError::not_implemented("reset_pk_sequence", self.name()))
    }

    /// Drop every table in the configured schema.
    fn recreate_database(&self, exec: &mut dyn Executor, name: &str) -> Result<()> {
        let tables = self.tables(exec)?;
        debug!("Recreating database {}: dropping {} tables", name, tables.len());
        for table in tables {
            self.drop_table(exec, &table)?;
        }
        Ok(())
    }
}
