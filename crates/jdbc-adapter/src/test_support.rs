//! In-memory connection used by unit tests.
//!
//! `FakeConnection` logs every statement, answers scripted queries, injects
//! driver failures by substring and keeps just enough table state (columns
//! and rows) to observe the DDL sequences the dialects emit. `begin`
//! snapshots that state and `rollback` restores it.

use std::any::Any;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, LazyLock};

use regex::Regex;

use crate::adapter::JdbcAdapter;
use crate::config::AdapterConfig;
use crate::core::catalog::DialectRegistry;
use crate::core::schema::ColumnMetadata;
use crate::core::traits::{Connection, DatabaseMetadata};
use crate::core::value::{MetadataRow, QueryResult, Value};
use crate::error::{DriverError, DriverResult};

static ADD_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)^ALTER TABLE "?([^"\s]+)"? ADD "?([^"\s]+)"? (\S+)"#).expect("Invalid Regex")
});
static DROP_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)^ALTER TABLE "?([^"\s]+)"? DROP (?:COLUMN )?"?([^"\s]+)"?"#)
        .expect("Invalid Regex")
});
static CAST_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)^UPDATE "?([^"\s]+)"? SET "?([^"\s]+)"? = CAST\("?([^"\s]+)"? AS"#)
        .expect("Invalid Regex")
});
static RENAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)^RENAME COLUMN "?([^"\s.]+)"?\."?([^"\s]+)"? TO "?([^"\s]+)"?"#)
        .expect("Invalid Regex")
});

pub(crate) fn fake() -> FakeConnection {
    FakeConnection::new()
}

/// Adapter over `conn` resolved from the built-in registry by adapter name.
pub(crate) fn adapter_with(conn: FakeConnection, adapter: &str) -> JdbcAdapter {
    let config = AdapterConfig::new(adapter).with_username("app");
    JdbcAdapter::new(
        Some(Box::new(conn)),
        config,
        &DialectRegistry::with_builtins(),
    )
    .expect("adapter construction")
}

/// The fake behind an adapter.
pub(crate) fn fake_of(adapter: &JdbcAdapter) -> &FakeConnection {
    adapter
        .jdbc_connection(false)
        .downcast_ref::<FakeConnection>()
        .expect("FakeConnection handle")
}

/// Stand-in for the native object behind a wrapped connection.
#[derive(Debug, PartialEq, Eq)]
pub(crate) struct NativeHandle(pub &'static str);

#[derive(Debug, Clone, Default)]
pub(crate) struct FakeTable {
    pub columns: Vec<ColumnMetadata>,
    pub rows: Vec<BTreeMap<String, Value>>,
}

#[derive(Debug, Default)]
pub(crate) struct FakeMetadata {
    pub table_rows: Vec<MetadataRow>,
    pub column_rows: HashMap<String, Vec<MetadataRow>>,
}

impl DatabaseMetadata for FakeMetadata {
    fn get_tables(
        &mut self,
        _catalog: Option<&str>,
        _schema_pattern: Option<&str>,
        _table_pattern: Option<&str>,
        _types: &[&str],
    ) -> DriverResult<Vec<MetadataRow>> {
        Ok(self.table_rows.clone())
    }

    fn get_columns(
        &mut self,
        _catalog: Option<&str>,
        _schema_pattern: Option<&str>,
        table_pattern: Option<&str>,
        _column_pattern: Option<&str>,
    ) -> DriverResult<Vec<MetadataRow>> {
        let table = table_pattern.unwrap_or_default();
        Ok(self.column_rows.get(table).cloned().unwrap_or_default())
    }
}

#[derive(Debug)]
pub(crate) struct FakeConnection {
    pub executed: Vec<String>,
    pub configured: bool,
    pub last_columns_call: Option<(String, Option<String>, String)>,
    pub metadata: FakeMetadata,
    responses: Vec<(String, QueryResult)>,
    failures: Vec<(String, DriverError)>,
    tables: BTreeMap<String, FakeTable>,
    snapshot: Option<BTreeMap<String, FakeTable>>,
    primary_keys: HashMap<String, Vec<String>>,
    native: NativeHandle,
    closed: Arc<AtomicBool>,
}

impl FakeConnection {
    pub fn new() -> Self {
        Self {
            executed: Vec::new(),
            configured: false,
            last_columns_call: None,
            metadata: FakeMetadata::default(),
            responses: Vec::new(),
            failures: Vec::new(),
            tables: BTreeMap::new(),
            snapshot: None,
            primary_keys: HashMap::new(),
            native: NativeHandle("native-connection"),
            closed: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Answer statements containing `pattern` with `result`.
    pub fn with_response(mut self, pattern: &str, result: QueryResult) -> Self {
        self.responses.push((pattern.to_string(), result));
        self
    }

    /// Fail statements containing `pattern` with `error`.
    pub fn with_failure(mut self, pattern: &str, error: DriverError) -> Self {
        self.failures.push((pattern.to_string(), error));
        self
    }

    /// Add a table with `(name, type)` columns.
    pub fn with_table(mut self, name: &str, columns: &[(&str, &str)]) -> Self {
        let columns = columns
            .iter()
            .enumerate()
            .map(|(i, (col, ty))| ColumnMetadata {
                name: col.to_uppercase(),
                type_name: ty.to_string(),
                is_nullable: true,
                ordinal_pos: i as i32 + 1,
                ..Default::default()
            })
            .collect();
        self.tables.insert(
            name.to_uppercase(),
            FakeTable {
                columns,
                rows: Vec::new(),
            },
        );
        self
    }

    /// Replace a table's column metadata.
    pub fn with_columns(mut self, table: &str, columns: Vec<ColumnMetadata>) -> Self {
        self.tables.entry(table.to_uppercase()).or_default().columns = columns;
        self
    }

    pub fn with_row(mut self, table: &str, values: &[(&str, Value)]) -> Self {
        let row = values
            .iter()
            .map(|(c, v)| (c.to_uppercase(), v.clone()))
            .collect();
        self.tables
            .entry(table.to_uppercase())
            .or_default()
            .rows
            .push(row);
        self
    }

    pub fn with_primary_keys(mut self, table: &str, keys: &[&str]) -> Self {
        self.primary_keys.insert(
            table.to_string(),
            keys.iter().map(|k| k.to_string()).collect(),
        );
        self
    }

    /// Shared flag set when the connection is closed.
    pub fn closed_flag(&self) -> Arc<AtomicBool> {
        self.closed.clone()
    }

    pub fn column_names(&self, table: &str) -> Vec<String> {
        self.tables
            .get(&table.to_uppercase())
            .map(|t| t.columns.iter().map(|c| c.name.clone()).collect())
            .unwrap_or_default()
    }

    pub fn column_values(&self, table: &str, column: &str) -> Vec<Value> {
        let column = column.to_uppercase();
        self.tables
            .get(&table.to_uppercase())
            .map(|t| {
                t.rows
                    .iter()
                    .map(|r| r.get(&column).cloned().unwrap_or(Value::Null))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Executed statements, excluding transaction markers and session setup.
    pub fn statements(&self) -> Vec<&str> {
        self.executed
            .iter()
            .map(String::as_str)
            .filter(|s| !matches!(*s, "BEGIN" | "COMMIT" | "ROLLBACK"))
            .filter(|s| !s.starts_with("SET ISOLATION"))
            .collect()
    }

    fn apply(&mut self, sql: &str) {
        if let Some(c) = ADD_RE.captures(sql) {
            if let Some(table) = self.tables.get_mut(&c[1].to_uppercase()) {
                let ordinal_pos = table.columns.len() as i32 + 1;
                table.columns.push(ColumnMetadata {
                    name: c[2].to_uppercase(),
                    type_name: c[3].to_uppercase(),
                    is_nullable: true,
                    ordinal_pos,
                    ..Default::default()
                });
            }
        } else if let Some(c) = DROP_RE.captures(sql) {
            if let Some(table) = self.tables.get_mut(&c[1].to_uppercase()) {
                let column = c[2].to_uppercase();
                table.columns.retain(|col| col.name != column);
                for row in &mut table.rows {
                    row.remove(&column);
                }
            }
        } else if let Some(c) = CAST_RE.captures(sql) {
            if let Some(table) = self.tables.get_mut(&c[1].to_uppercase()) {
                let (target, source) = (c[2].to_uppercase(), c[3].to_uppercase());
                for row in &mut table.rows {
                    let value = row.get(&source).cloned().unwrap_or(Value::Null);
                    row.insert(target.clone(), value);
                }
            }
        } else if let Some(c) = RENAME_RE.captures(sql) {
            if let Some(table) = self.tables.get_mut(&c[1].to_uppercase()) {
                let (from, to) = (c[2].to_uppercase(), c[3].to_uppercase());
                for col in &mut table.columns {
                    if col.name == from {
                        col.name = to.clone();
                    }
                }
                for row in &mut table.rows {
                    if let Some(value) = row.remove(&from) {
                        row.insert(to.clone(), value);
                    }
                }
            }
        }
    }
}

impl Connection for FakeConnection {
    fn configure_connection(&mut self) -> DriverResult<()> {
        self.configured = true;
        Ok(())
    }

    fn execute(&mut self, sql: &str) -> DriverResult<QueryResult> {
        self.executed.push(sql.to_string());

        if let Some((_, err)) = self.failures.iter().find(|(p, _)| sql.contains(p.as_str())) {
            return Err(err.clone());
        }

        self.apply(sql);

        Ok(self
            .responses
            .iter()
            .find(|(p, _)| sql.contains(p.as_str()))
            .map(|(_, r)| r.clone())
            .unwrap_or_default())
    }

    fn columns_internal(
        &mut self,
        table: &str,
        catalog: Option<&str>,
        schema: &str,
    ) -> DriverResult<Vec<ColumnMetadata>> {
        self.last_columns_call = Some((
            table.to_string(),
            catalog.map(str::to_string),
            schema.to_string(),
        ));
        self.tables
            .get(&table.to_uppercase())
            .map(|t| t.columns.clone())
            .ok_or_else(|| {
                DriverError::sql("java.sql.SQLException", format!("Table '{}' not found", table))
                    .with_sql_state("42X05")
            })
    }

    fn tables(&mut self, _catalog: Option<&str>, _schema: &str) -> DriverResult<Vec<String>> {
        Ok(self.tables.keys().cloned().collect())
    }

    fn primary_keys(&mut self, table: &str) -> DriverResult<Vec<String>> {
        Ok(self.primary_keys.get(table).cloned().unwrap_or_default())
    }

    fn metadata(&mut self) -> DriverResult<&mut dyn DatabaseMetadata> {
        Ok(&mut self.metadata)
    }

    fn begin(&mut self) -> DriverResult<()> {
        self.executed.push("BEGIN".to_string());
        self.snapshot = Some(self.tables.clone());
        Ok(())
    }

    fn commit(&mut self) -> DriverResult<()> {
        self.executed.push("COMMIT".to_string());
        self.snapshot = None;
        Ok(())
    }

    fn rollback(&mut self) -> DriverResult<()> {
        self.executed.push("ROLLBACK".to_string());
        if let Some(tables) = self.snapshot.take() {
            self.tables = tables;
        }
        Ok(())
    }

    fn jdbc_connection(&self, unwrap: bool) -> &dyn Any {
        if unwrap {
            &self.native
        } else {
            self
        }
    }

    fn close(&mut self) -> DriverResult<()> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}
