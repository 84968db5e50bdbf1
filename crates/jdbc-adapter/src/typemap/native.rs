//! Logical type → native SQL type rendering.

use crate::core::schema::{LogicalType, NativeType, NativeTypes};
use crate::error::{AdapterError, Result};

/// The generic JDBC type table, used by dialects that do not override it.
pub fn generic_native_types() -> NativeTypes {
    let mut types = NativeTypes::new();
    types.insert(
        LogicalType::PrimaryKey,
        NativeType::named("integer GENERATED BY DEFAULT AS IDENTITY NOT NULL PRIMARY KEY"),
    );
    types.insert(LogicalType::String, NativeType::with_limit("varchar", 255));
    types.insert(LogicalType::Text, NativeType::named("clob"));
    types.insert(LogicalType::Binary, NativeType::named("blob"));
    types.insert(LogicalType::Float, NativeType::named("float"));
    types.insert(LogicalType::Decimal, NativeType::named("decimal"));
    types.insert(LogicalType::Numeric, NativeType::named("numeric"));
    types.insert(LogicalType::Integer, NativeType::named("integer"));
    types.insert(LogicalType::Smallint, NativeType::named("smallint"));
    types.insert(LogicalType::Bigint, NativeType::named("bigint"));
    types.insert(LogicalType::Real, NativeType::named("real"));
    types.insert(LogicalType::Double, NativeType::named("double precision"));
    types.insert(LogicalType::Date, NativeType::named("date"));
    types.insert(LogicalType::Time, NativeType::named("time"));
    types.insert(LogicalType::Datetime, NativeType::named("timestamp"));
    types.insert(LogicalType::Timestamp, NativeType::named("timestamp"));
    types.insert(LogicalType::Xml, NativeType::named("xml"));
    types.insert(LogicalType::Boolean, NativeType::named("boolean"));
    types
}

/// Render a column type from a native type table.
///
/// - `decimal` ignores `limit` and uses precision/scale, falling back to the
///   native defaults; a scale without a precision is an error.
/// - `primary_key` is emitted verbatim.
/// - Every other known type appends `(limit)` when a limit is given or the
///   native type carries a default one.
/// - Type names that are not logical types pass through unchanged.
pub fn type_to_sql(
    types: &NativeTypes,
    type_name: &str,
    limit: Option<u32>,
    precision: Option<u32>,
    scale: Option<u32>,
) -> Result<String> {
    let Some((logical, native)) = type_name
        .parse::<LogicalType>()
        .ok()
        .and_then(|t| types.get(&t).map(|n| (t, n)))
    else {
        return Ok(type_name.to_string());
    };

    let mut sql = native.name.clone();

    if logical == LogicalType::Decimal {
        let scale = scale.or(native.scale);
        match (precision.or(native.precision), scale) {
            (Some(p), Some(s)) => sql.push_str(&format!("({},{})", p, s)),
            (Some(p), None) => sql.push_str(&format!("({})", p)),
            (None, Some(_)) => {
                return Err(AdapterError::Argument(
                    "Error adding decimal column: precision cannot be empty if scale is specified"
                        .to_string(),
                ))
            }
            (None, None) => {}
        }
    } else if logical != LogicalType::PrimaryKey {
        if let Some(limit) = limit.or(native.limit) {
            sql.push_str(&format!("({})", limit));
        }
    }

    Ok(sql)
}
