//! Derby structure dump.
//!
//! Rebuilds `CREATE TABLE` statements from JDBC catalog metadata. Identity
//! columns are reported with a `GENERATED_...` default, so their clause is
//! recovered from the `SYS.SYSCOLUMNS` system table.

use tracing::{debug, warn};

use crate::core::exception::translate_exception;
use crate::core::identifier::{add_quotes, expand_double_quotes, strip_quotes};
use crate::core::traits::Executor;
use crate::core::value::{MetadataRow, Value};
use crate::error::Result;

/// Types whose column size is part of the declaration.
const SIZEABLE: &[&str] = &["VARCHAR", "CLOB", "BLOB"];

// getTables / getColumns result positions
const TABLE_NAME: usize = 3;
const COLUMN_NAME: usize = 4;
const TYPE_NAME: usize = 6;
const COLUMN_SIZE: usize = 7;
const COLUMN_DEF: usize = 13;
const IS_NULLABLE: usize = 18;

/// `CREATE TABLE` statements for every table, each ending in `);\n\n`.
pub(super) fn structure_dump(exec: &mut dyn Executor) -> Result<String> {
    let tables = read_catalog(exec)?;
    debug!("Dumping structure of {} tables", tables.len());

    let mut definition = String::new();
    for (table, columns) in &tables {
        definition.push_str(&format!("CREATE TABLE {} (\n", table));

        let mut create_columns = Vec::with_capacity(columns.len());
        for row in columns {
            let Some(name) = row.get_string(COLUMN_NAME) else {
                continue;
            };
            let column_name = add_quotes(name);

            let default = match row.get_string(COLUMN_DEF) {
                Some(d) if d.starts_with("GENERATED_") => {
                    auto_increment_stmt(exec, table, &column_name)?
                }
                Some(d) => format!(" DEFAULT {}", d),
                None => String::new(),
            };

            let type_name = row.get_string(TYPE_NAME).unwrap_or_default();
            let mut create_column = add_quotes(&expand_double_quotes(strip_quotes(&column_name)));
            create_column.push(' ');
            create_column.push_str(type_name);
            if SIZEABLE.contains(&type_name) {
                create_column.push_str(&format!(
                    "({})",
                    row.get_string(COLUMN_SIZE).unwrap_or_default()
                ));
            }
            if row.get_string(IS_NULLABLE) == Some("NO") {
                create_column.push_str(" NOT NULL");
            }
            create_column.push_str(&default);

            create_columns.push(format!(" {}", create_column));
        }

        definition.push_str(&create_columns.join(",\n"));
        definition.push_str(");\n\n");
    }

    Ok(definition)
}

/// Table names with their column metadata rows, read up front so the
/// metadata borrow ends before identity lookups run queries.
fn read_catalog(exec: &mut dyn Executor) -> Result<Vec<(String, Vec<MetadataRow>)>> {
    let meta = exec
        .connection()
        .metadata()
        .map_err(|e| translate_exception(e, "getMetaData"))?;

    let table_rows = meta
        .get_tables(None, None, None, &["TABLE"])
        .map_err(|e| translate_exception(e, "getTables"))?;

    let mut tables = Vec::with_capacity(table_rows.len());
    for row in &table_rows {
        let Some(table) = row.get_string(TABLE_NAME) else {
            continue;
        };
        let columns = meta
            .get_columns(None, None, Some(table), None)
            .map_err(|e| translate_exception(e, &format!("getColumns({})", table)))?;
        tables.push((table.to_string(), columns));
    }

    Ok(tables)
}

/// Identity clause for `table.column`, or an empty string when the system
/// tables have no usable start/increment for it.
fn auto_increment_stmt(exec: &mut dyn Executor, table: &str, column: &str) -> Result<String> {
    let sql = format!(
        "SELECT AUTOINCREMENTSTART, AUTOINCREMENTINC, COLUMNNAME, REFERENCEID, COLUMNDEFAULT \
         FROM SYS.SYSCOLUMNS WHERE REFERENCEID = \
         (SELECT T.TABLEID FROM SYS.SYSTABLES T WHERE T.TABLENAME = '{}') AND COLUMNNAME = '{}'",
        table.replace('\'', "''"),
        strip_quotes(column).replace('\'', "''")
    );

    let result = exec.execute(&sql)?;
    let Some(row) = result.first() else {
        return Ok(String::new());
    };

    let start = identity_number(row.get("AUTOINCREMENTSTART"), table, column);
    let increment = identity_number(row.get("AUTOINCREMENTINC"), table, column);
    let (Some(start), Some(increment)) = (start, increment) else {
        return Ok(String::new());
    };

    let generated = match row.get("COLUMNDEFAULT") {
        None | Some(Value::Null) => "ALWAYS",
        Some(_) => "BY DEFAULT",
    };

    Ok(format!(
        " GENERATED {} AS IDENTITY (START WITH {}, INCREMENT BY {})",
        generated, start, increment
    ))
}

fn identity_number(value: Option<&Value>, table: &str, column: &str) -> Option<i64> {
    match value? {
        Value::Null => None,
        Value::Int(n) => Some(*n),
        Value::Text(s) => match s.trim().parse() {
            Ok(n) => Some(n),
            Err(_) => {
                warn!("Non-numeric identity setting '{}' for {}.{}", s, table, column);
                None
            }
        },
        other => {
            warn!("Unexpected identity setting {:?} for {}.{}", other, table, column);
            None
        }
    }
}
