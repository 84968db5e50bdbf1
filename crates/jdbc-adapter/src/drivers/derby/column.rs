//! Derby column metadata rules.

use crate::core::schema::LogicalType;
use crate::typemap::{ColumnTypeMapper, LimitRule, Simplified, TypeMatcher, TypeRule};

/// Largest VARCHAR Derby accepts; reported when the driver gives no length.
pub const MAX_VARCHAR_LENGTH: u32 = 32672;

/// Default string Derby reports for identity columns.
pub const GENERATED_DEFAULT: &str = "GENERATED_BY_DEFAULT";

const fn limit(prefix: &'static str, limit: Option<u32>) -> LimitRule {
    LimitRule {
        matcher: TypeMatcher::Prefix(prefix),
        sql_type: prefix,
        limit,
    }
}

const LIMIT_RULES: &[LimitRule] = &[
    limit("smallint", Some(2)),
    limit("bigint", Some(8)),
    // DOUBLE PRECISION
    limit("double", Some(8)),
    limit("real", Some(4)),
    limit("integer", Some(4)),
    limit("datetime", None),
    limit("timestamp", None),
    limit("time", None),
    limit("date", None),
    limit("xml", None),
];

const TYPE_RULES: &[TypeRule] = &[
    // boolean columns are stored as smallint
    TypeRule {
        matchers: &[TypeMatcher::Prefix("smallint")],
        simplified: Simplified::Fixed(LogicalType::Boolean),
    },
    TypeRule {
        matchers: &[TypeMatcher::Prefix("bigint"), TypeMatcher::Contains("int")],
        simplified: Simplified::Fixed(LogicalType::Integer),
    },
    TypeRule {
        matchers: &[TypeMatcher::Prefix("real"), TypeMatcher::Contains("double")],
        simplified: Simplified::Fixed(LogicalType::Float),
    },
    // DEC is an alias of DECIMAL
    TypeRule {
        matchers: &[TypeMatcher::Prefix("dec")],
        simplified: Simplified::IntegerIfZeroScale,
    },
    TypeRule {
        matchers: &[TypeMatcher::Prefix("timestamp")],
        simplified: Simplified::Fixed(LogicalType::Datetime),
    },
    TypeRule {
        matchers: &[TypeMatcher::Prefix("xml")],
        simplified: Simplified::Fixed(LogicalType::Xml),
    },
];

pub(crate) static DERBY_COLUMN_MAPPER: ColumnTypeMapper = ColumnTypeMapper::generic()
    .with_limit_rules(LIMIT_RULES)
    .with_type_rules(TYPE_RULES)
    .lowercase_sql_type()
    .with_unbounded_varchar_limit(MAX_VARCHAR_LENGTH)
    .with_default_rules(GENERATED_DEFAULT);
