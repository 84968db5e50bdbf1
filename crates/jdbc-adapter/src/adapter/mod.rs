//! Connection core.
//!
//! [`JdbcAdapter`] owns one live connection handle and the dialect resolved
//! for its configuration. Every statement goes through the dialect's SQL
//! rewriting and every driver failure through exception translation, so
//! callers only ever see [`AdapterError`].

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::config::AdapterConfig;
use crate::core::catalog::DialectRegistry;
use crate::core::exception::translate_exception;
use crate::core::schema::{
    Column, ColumnOptions, IndexSpec, LimitOffset, NativeTypes, TableDefinition,
};
use crate::core::traits::{Connection, Dialect, Executor};
use crate::core::value::{QueryResult, Value};
use crate::error::{AdapterError, Result};

/// A database adapter: one connection, one dialect.
///
/// Not shared between threads; pooling is left to the embedding
/// application. The connection is closed on [`disconnect`](Self::disconnect)
/// or when the adapter is dropped.
pub struct JdbcAdapter {
    config: AdapterConfig,
    connection: Box<dyn Connection>,
    dialect: Arc<dyn Dialect>,
    closed: bool,
}

impl fmt::Debug for JdbcAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JdbcAdapter")
            .field("dialect", &self.dialect.name())
            .field("config", &self.config)
            .field("closed", &self.closed)
            .finish()
    }
}

impl JdbcAdapter {
    /// Build an adapter for `config`.
    ///
    /// The dialect is resolved through `registry`. When `connection` is
    /// `None` the registry's connection factory for that dialect opens one.
    /// The handle's own setup hook runs first, then the dialect's session
    /// setup.
    pub fn new(
        connection: Option<Box<dyn Connection>>,
        config: AdapterConfig,
        registry: &DialectRegistry,
    ) -> Result<Self> {
        config.validate()?;
        let dialect = registry.resolve(&config)?;

        let connection = match connection {
            Some(connection) => connection,
            None => registry.connect(dialect.name(), &config)?,
        };

        info!(
            "Opened {} adapter for {}",
            dialect.adapter_name(),
            config.url.as_deref().unwrap_or(&config.adapter)
        );

        let mut adapter = Self {
            config,
            connection,
            dialect,
            closed: false,
        };

        adapter
            .connection
            .configure_connection()
            .map_err(|e| translate_exception(e, "configure_connection"))?;

        let dialect = Arc::clone(&adapter.dialect);
        dialect.configure_connection(&mut adapter)?;

        Ok(adapter)
    }

    /// The raw connection object, for driver calls this layer does not wrap.
    ///
    /// With `unwrap`, a pooled or proxied handle hands out the native object
    /// behind it.
    pub fn jdbc_connection(&self, unwrap: bool) -> &dyn Any {
        self.connection.jdbc_connection(unwrap)
    }

    pub fn config(&self) -> &AdapterConfig {
        &self.config
    }

    pub fn dialect(&self) -> &Arc<dyn Dialect> {
        &self.dialect
    }

    pub fn adapter_name(&self) -> &str {
        self.dialect.adapter_name()
    }

    /// Execute a statement.
    pub fn execute(&mut self, sql: &str) -> Result<QueryResult> {
        Executor::execute(self, sql)
    }

    /// Execute a statement with `?` placeholders replaced by quoted `binds`.
    ///
    /// Placeholders inside single-quoted literals are left alone. The number
    /// of placeholders must match the number of binds.
    pub fn execute_with_binds(&mut self, sql: &str, binds: &[Value]) -> Result<QueryResult> {
        let sql = self.substitute_binds(sql, binds)?;
        Executor::execute(self, &sql)
    }

    fn substitute_binds(&self, sql: &str, binds: &[Value]) -> Result<String> {
        let mut out = String::with_capacity(sql.len() + binds.len() * 8);
        let mut binds_iter = binds.iter();
        let mut in_literal = false;
        let mut placeholders = 0usize;

        for ch in sql.chars() {
            match ch {
                '\'' => {
                    in_literal = !in_literal;
                    out.push(ch);
                }
                '?' if !in_literal => {
                    placeholders += 1;
                    if let Some(value) = binds_iter.next() {
                        out.push_str(&self.dialect.quote_value(value));
                    }
                }
                _ => out.push(ch),
            }
        }

        if placeholders != binds.len() {
            return Err(AdapterError::Argument(format!(
                "wrong number of bind variables ({} for {}) in: {}",
                binds.len(),
                placeholders,
                sql
            )));
        }

        Ok(out)
    }

    /// First column of the first row.
    pub fn select_value(&mut self, sql: &str) -> Result<Option<Value>> {
        Executor::select_value(self, sql)
    }

    /// Run `f` in a transaction: commit when it returns `Ok`, roll back when
    /// it returns `Err`.
    pub fn transaction<T, F>(&mut self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Self) -> Result<T>,
    {
        self.begin_transaction()?;
        match f(self) {
            Ok(value) => {
                self.commit_transaction()?;
                Ok(value)
            }
            Err(e) => {
                if let Err(rollback_err) = self.rollback_transaction() {
                    warn!("Rollback failed after error '{}': {}", e, rollback_err);
                }
                Err(e)
            }
        }
    }

    /// Close the connection.
    pub fn disconnect(mut self) -> Result<()> {
        self.closed = true;
        self.connection
            .close()
            .map_err(|e| translate_exception(e, "close"))?;
        info!("Closed {} adapter", self.dialect.adapter_name());
        Ok(())
    }

    // ===== Types and quoting =====

    pub fn native_database_types(&self) -> NativeTypes {
        self.dialect.native_database_types()
    }

    pub fn modify_types(&self, types: NativeTypes) -> NativeTypes {
        self.dialect.modify_types(types)
    }

    pub fn type_to_sql(
        &self,
        type_name: &str,
        limit: Option<u32>,
        precision: Option<u32>,
        scale: Option<u32>,
    ) -> Result<String> {
        self.dialect.type_to_sql(type_name, limit, precision, scale)
    }

    pub fn quote_column_name(&self, name: &str) -> String {
        self.dialect.quote_column_name(name)
    }

    pub fn quote_table_name(&self, name: &str) -> String {
        self.dialect.quote_table_name(name)
    }

    pub fn quote_value(&self, value: &Value) -> String {
        self.dialect.quote_value(value)
    }

    pub fn distinct(&self, columns: &str, order_by: &[&str]) -> String {
        self.dialect.distinct(columns, order_by)
    }

    pub fn add_limit_offset(&self, sql: &mut String, opts: LimitOffset) {
        self.dialect.add_limit_offset(sql, opts)
    }

    pub fn add_column_options(&self, sql: &mut String, options: &ColumnOptions) {
        self.dialect.add_column_options(sql, options)
    }

    pub fn index_name_length(&self) -> usize {
        self.dialect.index_name_length()
    }

    pub fn index_name(&self, table: &str, spec: &IndexSpec) -> Result<String> {
        self.dialect.index_name(table, spec)
    }

    // ===== Introspection =====

    pub fn columns(&mut self, table: &str) -> Result<Vec<Column>> {
        let dialect = Arc::clone(&self.dialect);
        dialect.columns(self, table)
    }

    pub fn tables(&mut self) -> Result<Vec<String>> {
        let dialect = Arc::clone(&self.dialect);
        dialect.tables(self)
    }

    pub fn primary_keys(&mut self, table: &str) -> Result<Vec<String>> {
        let dialect = Arc::clone(&self.dialect);
        dialect.primary_keys(self, table)
    }

    pub fn structure_dump(&mut self) -> Result<String> {
        let dialect = Arc::clone(&self.dialect);
        dialect.structure_dump(self)
    }

    // ===== DDL =====

    pub fn create_table(&mut self, definition: &TableDefinition) -> Result<()> {
        let dialect = Arc::clone(&self.dialect);
        dialect.create_table(self, definition)
    }

    pub fn drop_table(&mut self, table: &str) -> Result<()> {
        let dialect = Arc::clone(&self.dialect);
        dialect.drop_table(self, table)
    }

    pub fn add_column(
        &mut self,
        table: &str,
        column: &str,
        type_name: &str,
        options: &ColumnOptions,
    ) -> Result<()> {
        let dialect = Arc::clone(&self.dialect);
        dialect.add_column(self, table, column, type_name, options)
    }

    pub fn remove_column(&mut self, table: &str, columns: &[&str]) -> Result<()> {
        let dialect = Arc::clone(&self.dialect);
        dialect.remove_column(self, table, columns)
    }

    pub fn rename_column(&mut self, table: &str, column: &str, new_name: &str) -> Result<()> {
        let dialect = Arc::clone(&self.dialect);
        dialect.rename_column(self, table, column, new_name)
    }

    pub fn rename_table(&mut self, name: &str, new_name: &str) -> Result<()> {
        let dialect = Arc::clone(&self.dialect);
        dialect.rename_table(self, name, new_name)
    }

    pub fn change_column(
        &mut self,
        table: &str,
        column: &str,
        type_name: &str,
        options: &ColumnOptions,
    ) -> Result<()> {
        let dialect = Arc::clone(&self.dialect);
        dialect.change_column(self, table, column, type_name, options)
    }

    pub fn add_index(
        &mut self,
        table: &str,
        columns: &[&str],
        name: Option<&str>,
        unique: bool,
    ) -> Result<()> {
        let dialect = Arc::clone(&self.dialect);
        dialect.add_index(self, table, columns, name, unique)
    }

    pub fn remove_index(&mut self, table: &str, spec: &IndexSpec) -> Result<()> {
        let dialect = Arc::clone(&self.dialect);
        dialect.remove_index(self, table, spec)
    }

    pub fn reset_sequence(&mut self, table: &str, column: &str) -> Result<()> {
        let dialect = Arc::clone(&self.dialect);
        dialect.reset_sequence(self, table, column)
    }

    pub fn reset_pk_sequence(&mut self, table: &str, pk: Option<&str>) -> Result<()> {
        let dialect = Arc::clone(&self.dialect);
        dialect.reset_pk_sequence(self, table, pk)
    }

    pub fn recreate_database(&mut self, name: &str) -> Result<()> {
        let dialect = Arc::clone(&self.dialect);
        dialect.recreate_database(self, name)
    }
}

impl Executor for JdbcAdapter {
    fn config(&self) -> &AdapterConfig {
        &self.config
    }

    fn execute(&mut self, sql: &str) -> Result<QueryResult> {
        let sql = self.dialect.rewrite_sql(sql);
        debug!("Executing: {}", sql);
        self.connection
            .execute(&sql)
            .map_err(|e| translate_exception(e, &sql))
    }

    fn connection(&mut self) -> &mut dyn Connection {
        self.connection.as_mut()
    }

    fn begin_transaction(&mut self) -> Result<()> {
        self.connection
            .begin()
            .map_err(|e| translate_exception(e, "BEGIN"))
    }

    fn commit_transaction(&mut self) -> Result<()> {
        self.connection
            .commit()
            .map_err(|e| translate_exception(e, "COMMIT"))
    }

    fn rollback_transaction(&mut self) -> Result<()> {
        self.connection
            .rollback()
            .map_err(|e| translate_exception(e, "ROLLBACK"))
    }
}

impl Drop for JdbcAdapter {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        if let Err(e) = self.connection.close() {
            warn!("Failed to close {} connection: {}", self.dialect.adapter_name(), e);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;

    use super::*;
    use crate::error::DriverError;
    use crate::test_support::{adapter_with, fake, fake_of, FakeConnection, NativeHandle};

    #[test]
    fn test_new_resolves_dialect() {
        let adapter = adapter_with(fake(), "jdbcderby");
        assert_eq!(adapter.adapter_name(), "Derby");
        assert_eq!(adapter.dialect().name(), "derby");

        let adapter = adapter_with(fake(), "jdbc");
        assert_eq!(adapter.adapter_name(), "JDBC");
        let conn = fake_of(&adapter);
        assert!(conn.configured);
        assert!(conn.executed.is_empty());
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let result = JdbcAdapter::new(
            Some(Box::new(fake())),
            AdapterConfig::new("derby").with_url("derby:memory:x"),
            &DialectRegistry::with_builtins(),
        );
        assert!(matches!(result, Err(AdapterError::Config(_))));
    }

    #[test]
    fn test_new_uses_registered_factory() {
        let mut registry = DialectRegistry::with_builtins();
        let config = AdapterConfig::new("jdbc").with_url("jdbc:derby:memory:test");

        let err = JdbcAdapter::new(None, config.clone(), &registry).unwrap_err();
        assert!(err.to_string().contains("No connection factory"));

        registry.register_connector("derby", |_| Ok(Box::new(FakeConnection::new())));
        let adapter = JdbcAdapter::new(None, config, &registry).unwrap();
        assert_eq!(adapter.adapter_name(), "Derby");
        assert_eq!(
            fake_of(&adapter).executed,
            vec!["SET ISOLATION = SERIALIZABLE"]
        );
    }

    #[test]
    fn test_jdbc_connection_unwrap() {
        let adapter = adapter_with(fake(), "derby");
        assert!(adapter
            .jdbc_connection(false)
            .downcast_ref::<FakeConnection>()
            .is_some());
        assert_eq!(
            adapter.jdbc_connection(true).downcast_ref::<NativeHandle>(),
            Some(&NativeHandle("native-connection"))
        );
    }

    #[test]
    fn test_execute_translates_sql_errors() {
        let err_source = DriverError::sql("java.sql.SQLSyntaxErrorException", "Syntax error")
            .with_backtrace(["org.apache.derby.impl.sql.compile.Parser.parse"]);
        let conn = fake().with_failure("SELEC", err_source.clone());
        let mut adapter = adapter_with(conn, "jdbc");

        let err = adapter.execute("SELEC 1").unwrap_err();
        assert_eq!(
            err.to_string(),
            "java.sql.SQLSyntaxErrorException: Syntax error: SELEC 1"
        );
        assert_eq!(
            err.backtrace(),
            &["org.apache.derby.impl.sql.compile.Parser.parse".to_string()]
        );
        assert_eq!(err.driver_error(), Some(&err_source));
    }

    #[test]
    fn test_execute_passes_native_errors_through() {
        let native = DriverError::native("java.lang.OutOfMemoryError", "heap");
        let conn = fake().with_failure("SELECT", native.clone());
        let mut adapter = adapter_with(conn, "jdbc");

        match adapter.execute("SELECT 1") {
            Err(AdapterError::Native(e)) => assert_eq!(e, native),
            other => panic!("expected native error, got {:?}", other),
        }
    }

    #[test]
    fn test_execute_applies_dialect_rewrite() {
        let mut adapter = adapter_with(fake(), "derby");
        adapter.execute("DELETE FROM t WHERE a = NULL").unwrap();
        assert_eq!(
            fake_of(&adapter).statements(),
            vec!["DELETE FROM t WHERE a IS NULL"]
        );
    }

    #[test]
    fn test_execute_with_binds() {
        let mut adapter = adapter_with(fake(), "derby");
        adapter
            .execute_with_binds(
                "UPDATE t SET name = ?, active = ? WHERE note = 'why?' AND id = ?",
                &[Value::from("O'Hara"), Value::Bool(true), Value::Int(7)],
            )
            .unwrap();
        assert_eq!(
            fake_of(&adapter).statements(),
            vec!["UPDATE t SET name = 'O''Hara', active = 1 WHERE note = 'why?' AND id = 7"]
        );

        let too_few = adapter.execute_with_binds("SELECT ? + ?", &[Value::Int(1)]);
        assert!(matches!(too_few, Err(AdapterError::Argument(_))));
        let too_many = adapter.execute_with_binds("SELECT ?", &[Value::Int(1), Value::Int(2)]);
        assert!(matches!(too_many, Err(AdapterError::Argument(_))));
    }

    #[test]
    fn test_select_value() {
        let conn = fake().with_response(
            "COUNT",
            QueryResult::with_rows(vec!["1".into()], vec![vec![Value::Int(3)]]),
        );
        let mut adapter = adapter_with(conn, "derby");
        assert_eq!(
            adapter.select_value("SELECT COUNT(*) FROM t").unwrap(),
            Some(Value::Int(3))
        );
        assert_eq!(adapter.select_value("SELECT 1 FROM t").unwrap(), None);
    }

    #[test]
    fn test_transaction_commit_and_rollback() {
        let mut adapter = adapter_with(fake(), "jdbc");

        let value = adapter
            .transaction(|a| {
                a.execute("INSERT INTO t VALUES (1)")?;
                Ok(42)
            })
            .unwrap();
        assert_eq!(value, 42);

        let result: Result<()> = adapter.transaction(|a| {
            a.execute("INSERT INTO t VALUES (2)")?;
            Err(AdapterError::Argument("abort".into()))
        });
        assert!(result.is_err());

        assert_eq!(
            fake_of(&adapter).executed,
            vec![
                "BEGIN",
                "INSERT INTO t VALUES (1)",
                "COMMIT",
                "BEGIN",
                "INSERT INTO t VALUES (2)",
                "ROLLBACK",
            ]
        );
    }

    #[test]
    fn test_disconnect_and_drop_close_connection() {
        let conn = fake();
        let closed = conn.closed_flag();
        adapter_with(conn, "jdbc").disconnect().unwrap();
        assert!(closed.load(Ordering::SeqCst));

        let conn = fake();
        let closed = conn.closed_flag();
        {
            let _adapter = adapter_with(conn, "derby");
            assert!(!closed.load(Ordering::SeqCst));
        }
        assert!(closed.load(Ordering::SeqCst));
    }

    #[test]
    fn test_debug_hides_password() {
        let config = AdapterConfig::new("derby").with_password("hunter2");
        let adapter = JdbcAdapter::new(
            Some(Box::new(fake())),
            config,
            &DialectRegistry::with_builtins(),
        )
        .unwrap();
        let output = format!("{:?}", adapter);
        assert!(output.contains("derby"));
        assert!(!output.contains("hunter2"));
    }
}
