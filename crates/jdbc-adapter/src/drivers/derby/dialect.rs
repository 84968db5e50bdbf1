//! Apache Derby SQL dialect (Strategy pattern).
//!
//! Overrides the generic behaviour where Derby differs: upper-case identifier
//! quoting, `OFFSET .. ROWS FETCH FIRST .. ROWS ONLY` pagination, limit-less
//! integer and temporal types, `RENAME TABLE`/`RENAME COLUMN` statements and
//! a copy-through-shadow-column fallback for type changes Derby cannot do in
//! place.

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, warn};

use crate::config::AdapterConfig;
use crate::core::exception::translate_exception;
use crate::core::identifier::{qualify_with, quote_string_literal, quote_upper, validate_identifier};
use crate::core::schema::{
    ColumnOptions, IndexSpec, LimitOffset, LogicalType, NativeType, NativeTypes,
};
use crate::core::traits::{with_transaction, Dialect, Executor};
use crate::core::value::Value;
use crate::error::{AdapterError, Result};
use crate::typemap::{self, ColumnTypeMapper};

use super::column::DERBY_COLUMN_MAPPER;
use super::structure;

static DML_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\A\s*(UPDATE|INSERT)").expect("Invalid Regex"));
static WHERE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?im)\sWHERE\s").expect("Invalid Regex"));
static NOT_EQ_NULL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\s*(?:!=|<>)\s*NULL\b").expect("Invalid Regex"));
// the captured char keeps `<=`, `>=` and `!=` out of the match
static EQ_NULL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(^|[^<>!=])\s*=\s*NULL\b").expect("Invalid Regex"));

static DERBY_NATIVE_TYPES: LazyLock<NativeTypes> = LazyLock::new(derby_native_types);

/// Types Derby rejects a length on.
const NO_LIMIT_TYPES: &[LogicalType] = &[
    LogicalType::Integer,
    LogicalType::Boolean,
    LogicalType::Timestamp,
    LogicalType::Datetime,
    LogicalType::Date,
    LogicalType::Time,
];

/// Types `modify_types` resets to Derby's definitions.
const MODIFIED_TYPES: &[LogicalType] = &[
    LogicalType::PrimaryKey,
    LogicalType::String,
    LogicalType::Float,
    LogicalType::Decimal,
    LogicalType::Numeric,
    LogicalType::Integer,
    LogicalType::Smallint,
    LogicalType::Bigint,
    LogicalType::Real,
    LogicalType::Double,
    LogicalType::Xml,
    LogicalType::Boolean,
];

/// SQLSTATEs Derby raises when `SET DATA TYPE` cannot convert a column:
/// invalid type for the column (42Z15), unsupported alteration (42Z16),
/// feature not supported (0A000) and syntax errors from older releases
/// without `SET DATA TYPE` (42X01).
const UNSUPPORTED_CONVERSION_STATES: &[&str] = &["42Z15", "42Z16", "0A000", "42X01"];

fn derby_native_types() -> NativeTypes {
    let mut types = NativeTypes::new();
    types.insert(
        LogicalType::PrimaryKey,
        NativeType::named("int GENERATED BY DEFAULT AS identity NOT NULL PRIMARY KEY"),
    );
    types.insert(LogicalType::String, NativeType::with_limit("varchar", 255));
    types.insert(LogicalType::Text, NativeType::named("clob"));
    types.insert(LogicalType::Binary, NativeType::named("blob"));
    types.insert(LogicalType::Float, NativeType::with_limit("float", 8));
    types.insert(LogicalType::Decimal, NativeType::with_precision("decimal", 5, 0));
    types.insert(LogicalType::Numeric, NativeType::with_precision("decimal", 5, 0));
    types.insert(LogicalType::Integer, NativeType::with_limit("integer", 4));
    types.insert(LogicalType::Smallint, NativeType::with_limit("smallint", 2));
    types.insert(LogicalType::Bigint, NativeType::with_limit("bigint", 8));
    types.insert(LogicalType::Real, NativeType::with_limit("real", 4));
    types.insert(LogicalType::Double, NativeType::with_limit("double", 8));
    types.insert(LogicalType::Date, NativeType::named("date"));
    types.insert(LogicalType::Time, NativeType::named("time"));
    types.insert(LogicalType::Datetime, NativeType::named("timestamp"));
    types.insert(LogicalType::Timestamp, NativeType::named("timestamp"));
    types.insert(LogicalType::Xml, NativeType::named("xml"));
    types.insert(LogicalType::Boolean, NativeType::named("smallint"));
    types
}

/// Apache Derby dialect implementation.
#[derive(Debug, Clone, Default)]
pub struct DerbyDialect;

impl DerbyDialect {
    /// Create a new Derby dialect instance.
    pub fn new() -> Self {
        Self
    }

    fn alter_column_prefix(&self, table: &str, column: &str) -> String {
        format!(
            "ALTER TABLE {} ALTER COLUMN {}",
            self.quote_table_name(table),
            self.quote_column_name(column)
        )
    }

    fn rewrite_null_comparisons(text: &str) -> Cow<'_, str> {
        match NOT_EQ_NULL_RE.replace_all(text, " IS NOT NULL") {
            Cow::Borrowed(text) => EQ_NULL_RE.replace_all(text, "${1} IS NULL"),
            Cow::Owned(text) => {
                Cow::Owned(EQ_NULL_RE.replace_all(&text, "${1} IS NULL").into_owned())
            }
        }
    }

    /// Copy `column` into a shadow column of the new type and swap it in.
    fn change_column_by_copy(
        &self,
        exec: &mut dyn Executor,
        table: &str,
        column: &str,
        type_name: &str,
        sql_type: &str,
        options: &ColumnOptions,
    ) -> Result<()> {
        let shadow = format!("{}_newtype", column);
        let shadow_options = ColumnOptions {
            null: None,
            ..options.clone()
        };

        with_transaction(exec, |tx| {
            self.add_column(tx, table, &shadow, type_name, &shadow_options)?;
            tx.execute(&format!(
                "UPDATE {} SET {} = CAST({} AS {})",
                self.quote_table_name(table),
                self.quote_column_name(&shadow),
                self.quote_column_name(column),
                sql_type
            ))?;
            self.remove_column(tx, table, &[column])?;
            self.rename_column(tx, table, &shadow, column)
        })
    }
}

impl Dialect for DerbyDialect {
    fn name(&self) -> &str {
        "derby"
    }

    fn adapter_name(&self) -> &str {
        "Derby"
    }

    fn column_mapper(&self) -> &ColumnTypeMapper {
        &DERBY_COLUMN_MAPPER
    }

    fn configure_connection(&self, exec: &mut dyn Executor) -> Result<()> {
        // SELECT .. FOR UPDATE only locks as expected under SERIALIZABLE
        exec.execute("SET ISOLATION = SERIALIZABLE")?;
        Ok(())
    }

    /// Derby names schemas after the connecting user.
    fn schema_name(&self, config: &AdapterConfig) -> String {
        config
            .schema
            .clone()
            .or_else(|| config.username.clone())
            .unwrap_or_default()
    }

    fn native_database_types(&self) -> NativeTypes {
        let mut types = typemap::generic_native_types();
        types.extend(DERBY_NATIVE_TYPES.iter().map(|(k, v)| (*k, v.clone())));
        types
    }

    fn modify_types(&self, mut types: NativeTypes) -> NativeTypes {
        for logical in MODIFIED_TYPES {
            if let Some(native) = DERBY_NATIVE_TYPES.get(logical) {
                types.insert(*logical, native.clone());
            }
        }
        types
    }

    fn type_to_sql(
        &self,
        type_name: &str,
        limit: Option<u32>,
        precision: Option<u32>,
        scale: Option<u32>,
    ) -> Result<String> {
        let no_limit = type_name
            .parse::<LogicalType>()
            .ok()
            .filter(|t| NO_LIMIT_TYPES.contains(t))
            .and_then(|t| DERBY_NATIVE_TYPES.get(&t));
        if let Some(native) = no_limit {
            return Ok(native.name.clone());
        }

        typemap::type_to_sql(
            &self.native_database_types(),
            type_name,
            limit,
            precision,
            scale,
        )
    }

    fn quote_column_name(&self, name: &str) -> String {
        quote_upper(name)
    }

    fn quote_table_name(&self, name: &str) -> String {
        qualify_with(name, quote_upper)
    }

    fn quote_value(&self, value: &Value) -> String {
        match value {
            Value::Null => "NULL".to_string(),
            // booleans are smallint columns
            Value::Bool(b) => i64::from(*b).to_string(),
            Value::Int(v) => v.to_string(),
            Value::Float(v) => v.to_string(),
            Value::Text(s) => quote_string_literal(s),
        }
    }

    /// Turn `= NULL` and `!=`/`<> NULL` comparisons into `IS [NOT] NULL`.
    ///
    /// For UPDATE and INSERT only the text from the first WHERE onwards is
    /// rewritten, so `SET col = NULL` assignments survive.
    fn rewrite_sql<'a>(&self, sql: &'a str) -> Cow<'a, str> {
        if !DML_RE.is_match(sql) {
            return Self::rewrite_null_comparisons(sql);
        }

        let Some(where_at) = WHERE_RE.find(sql).map(|m| m.start()) else {
            return Cow::Borrowed(sql);
        };

        let (head, where_part) = sql.split_at(where_at);
        match Self::rewrite_null_comparisons(where_part) {
            Cow::Borrowed(_) => Cow::Borrowed(sql),
            Cow::Owned(rewritten) => Cow::Owned(format!("{}{}", head, rewritten)),
        }
    }

    /// Derby requires ORDER BY columns in the select list of a DISTINCT
    /// query, so they are appended as `alias_<i>` columns.
    fn distinct(&self, columns: &str, order_by: &[&str]) -> String {
        let order_columns: Vec<&str> = order_by
            .iter()
            .flat_map(|o| o.split(','))
            .filter_map(|s| s.split_whitespace().next())
            .collect();

        if order_columns.is_empty() {
            return format!("DISTINCT {}", columns);
        }

        let aliased = order_columns
            .iter()
            .enumerate()
            .map(|(i, c)| format!("{} AS alias_{}", c, i))
            .collect::<Vec<_>>()
            .join(", ");

        format!("DISTINCT {}, {}", columns, aliased)
    }

    fn add_limit_offset(&self, sql: &mut String, opts: LimitOffset) {
        if let Some(offset) = opts.offset {
            sql.push_str(&format!(" OFFSET {} ROWS", offset));
        }
        // ROWS/ROW and FIRST/NEXT are interchangeable
        if let Some(limit) = opts.limit {
            sql.push_str(&format!(" FETCH FIRST {} ROWS ONLY", limit));
        }
    }

    fn add_column_options(&self, sql: &mut String, options: &ColumnOptions) {
        if let Some(default) = options.effective_default() {
            sql.push_str(&format!(" DEFAULT {}", self.quote_value(default)));
        }
        if options.null == Some(false) {
            sql.push_str(" NOT NULL");
        }
    }

    fn index_name_length(&self) -> usize {
        128
    }

    fn is_unsupported_conversion(&self, err: &AdapterError) -> bool {
        err.driver_error()
            .and_then(|e| e.sql_state.as_deref())
            .is_some_and(|state| UNSUPPORTED_CONVERSION_STATES.contains(&state))
    }

    fn primary_keys(&self, exec: &mut dyn Executor, table: &str) -> Result<Vec<String>> {
        let table = table.to_uppercase();
        exec.connection()
            .primary_keys(&table)
            .map_err(|e| translate_exception(e, &format!("primary_keys({})", table)))
    }

    fn structure_dump(&self, exec: &mut dyn Executor) -> Result<String> {
        structure::structure_dump(exec)
    }

    fn remove_column(&self, exec: &mut dyn Executor, table: &str, columns: &[&str]) -> Result<()> {
        for column in columns {
            exec.execute(&format!(
                "ALTER TABLE {} DROP COLUMN {} RESTRICT",
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
            "RENAME COLUMN {}.{} TO {}",
            self.quote_table_name(table),
            self.quote_column_name(column),
            self.quote_column_name(new_name)
        ))?;
        Ok(())
    }

    fn rename_table(&self, exec: &mut dyn Executor, name: &str, new_name: &str) -> Result<()> {
        validate_identifier(new_name)?;
        exec.execute(&format!(
            "RENAME TABLE {} TO {}",
            self.quote_table_name(name),
            self.quote_table_name(new_name)
        ))?;
        Ok(())
    }

    /// Change a column in place, falling back to a shadow-column copy.
    ///
    /// A nullability change runs first as its own statement, then `SET DATA
    /// TYPE` is attempted. A requested default follows the in-place change
    /// as a separate `DEFAULT` statement. If Derby reports the conversion as
    /// unsupported the column is rebuilt in one transaction instead: add
    /// `<column>_newtype` (carrying the default), copy with `CAST`, drop the
    /// original, rename the shadow. Any other failure is returned as is.
    fn change_column(
        &self,
        exec: &mut dyn Executor,
        table: &str,
        column: &str,
        type_name: &str,
        options: &ColumnOptions,
    ) -> Result<()> {
        if let Some(null) = options.null {
            let nullability = if null { "NULL" } else { "NOT NULL" };
            exec.execute(&format!(
                "{} {}",
                self.alter_column_prefix(table, column),
                nullability
            ))?;
        }

        let sql_type = self.type_to_sql(type_name, options.limit, options.precision, options.scale)?;
        let alter = format!(
            "{} SET DATA TYPE {}",
            self.alter_column_prefix(table, column),
            sql_type
        );

        match exec.execute(&alter) {
            Ok(_) => match options.effective_default() {
                Some(default) => {
                    exec.execute(&format!(
                        "{} DEFAULT {}",
                        self.alter_column_prefix(table, column),
                        self.quote_value(default)
                    ))?;
                    Ok(())
                }
                None => Ok(()),
            },
            Err(e) if self.is_unsupported_conversion(&e) => {
                warn!(
                    "In-place type change of {}.{} to {} rejected ({}), copying through a shadow column",
                    table, column, sql_type, e
                );
                self.change_column_by_copy(exec, table, column, type_name, &sql_type, options)
            }
            Err(e) => Err(e),
        }
    }

    fn remove_index(&self, exec: &mut dyn Executor, table: &str, spec: &IndexSpec) -> Result<()> {
        exec.execute(&format!("DROP INDEX {}", self.index_name(table, spec)?))?;
        Ok(())
    }

    fn reset_sequence(&self, exec: &mut dyn Executor, table: &str, column: &str) -> Result<()> {
        let quoted_table = self.quote_table_name(table);
        let quoted_column = self.quote_column_name(column);

        let max = exec
            .select_value(&format!("SELECT MAX({}) FROM {}", quoted_column, quoted_table))?
            .map(|v| v.to_i64())
            .unwrap_or(0);
        let next = max.checked_add(1).ok_or_else(|| {
            AdapterError::Argument(format!(
                "identity of {}.{} is exhausted at {}",
                table, column, max
            ))
        })?;

        exec.execute(&format!(
            "ALTER TABLE {} ALTER COLUMN {} RESTART WITH {}",
            quoted_table, quoted_column, next
        ))?;
        debug!("Reset identity of {}.{} to {}", table, column, next);
        Ok(())
    }

    /// Reset the identity behind `pk` (or the table's first primary key)
    /// when it is an integer column; other keys are left alone.
    fn reset_pk_sequence(
        &self,
        exec: &mut dyn Executor,
        table: &str,
        pk: Option<&str>,
    ) -> Result<()> {
        let pk = match pk {
            Some(pk) => pk.to_string(),
            None => match self.primary_keys(exec, table)?.into_iter().next() {
                Some(pk) => pk,
                None => {
                    debug!("No primary key on {}, nothing to reset", table);
                    return Ok(());
                }
            },
        };

        let is_integer = self
            .columns(exec, table)?
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(&pk))
            .is_some_and(|c| c.logical_type == Some(LogicalType::Integer));

        if is_integer {
            self.reset_sequence(exec, table, &pk)
        } else {
            debug!("Primary key {}.{} is not an integer, skipping reset", table, pk);
            Ok(())
        }
    }
}
