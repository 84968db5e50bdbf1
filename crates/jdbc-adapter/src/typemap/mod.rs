//! Type mapping in both directions.
//!
//! - [`native`]: logical type → native SQL type (`type_to_sql`)
//! - [`column`]: driver type string → limit, precision, scale and logical
//!   type (column introspection)
//!
//! Both directions live together so a dialect keeps them consistent: a
//! column introspected as `integer` renders back as the dialect's integer
//! type.

pub mod column;
pub mod native;

pub use column::{
    extract_precision, extract_scale, generic_limit, ColumnTypeMapper, LimitRule, Simplified,
    TypeMatcher, TypeRule, GENERIC_TYPE_RULES,
};
pub use native::{generic_native_types, type_to_sql};
