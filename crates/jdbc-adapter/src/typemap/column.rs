//! Column metadata normalization driven by ordered rule tables.
//!
//! A dialect describes how driver type strings map to limits and logical
//! types as two ordered tables. Rules are tried top to bottom and the first
//! match wins; anything the dialect table does not match falls through to
//! the generic extractors at the bottom of this module.

use std::sync::LazyLock;

use regex::Regex;

use crate::core::schema::{Column, ColumnMetadata, LogicalType};

static LIMIT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\((.*)\)").expect("Invalid Regex"));
static PRECISION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(numeric|decimal|number)\((\d+)(,\d+)?\)").expect("Invalid Regex")
});
static SCALE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(numeric|decimal|number)\((\d+)(,(\d+))?\)").expect("Invalid Regex")
});

/// How a rule matches a driver type string. Matching is case-insensitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeMatcher {
    /// Type string starts with the pattern.
    Prefix(&'static str),
    /// Type string contains the pattern anywhere.
    Contains(&'static str),
}

impl TypeMatcher {
    /// Test a lower-cased type string.
    pub fn matches(&self, lower: &str) -> bool {
        match self {
            TypeMatcher::Prefix(p) => lower.starts_with(p),
            TypeMatcher::Contains(p) => lower.contains(p),
        }
    }
}

/// Limit rule: when matched, the sql type is normalized to `sql_type` and
/// the column gets `limit`.
#[derive(Debug, Clone, Copy)]
pub struct LimitRule {
    pub matcher: TypeMatcher,
    pub sql_type: &'static str,
    pub limit: Option<u32>,
}

/// Logical type chosen by a [`TypeRule`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Simplified {
    /// Always this logical type.
    Fixed(LogicalType),
    /// Integer when the generic scale extractor reports 0, decimal otherwise.
    IntegerIfZeroScale,
}

/// Logical type rule: matches when any of its matchers does.
#[derive(Debug, Clone, Copy)]
pub struct TypeRule {
    pub matchers: &'static [TypeMatcher],
    pub simplified: Simplified,
}

/// Generic logical type rules, applied after any dialect rules.
pub static GENERIC_TYPE_RULES: &[TypeRule] = &[
    TypeRule {
        matchers: &[TypeMatcher::Contains("int")],
        simplified: Simplified::Fixed(LogicalType::Integer),
    },
    TypeRule {
        matchers: &[TypeMatcher::Contains("float"), TypeMatcher::Contains("double")],
        simplified: Simplified::Fixed(LogicalType::Float),
    },
    TypeRule {
        matchers: &[
            TypeMatcher::Contains("decimal"),
            TypeMatcher::Contains("numeric"),
            TypeMatcher::Contains("number"),
        ],
        simplified: Simplified::IntegerIfZeroScale,
    },
    TypeRule {
        matchers: &[TypeMatcher::Contains("datetime")],
        simplified: Simplified::Fixed(LogicalType::Datetime),
    },
    TypeRule {
        matchers: &[TypeMatcher::Contains("timestamp")],
        simplified: Simplified::Fixed(LogicalType::Timestamp),
    },
    TypeRule {
        matchers: &[TypeMatcher::Contains("time")],
        simplified: Simplified::Fixed(LogicalType::Time),
    },
    TypeRule {
        matchers: &[TypeMatcher::Contains("date")],
        simplified: Simplified::Fixed(LogicalType::Date),
    },
    TypeRule {
        matchers: &[TypeMatcher::Contains("clob"), TypeMatcher::Contains("text")],
        simplified: Simplified::Fixed(LogicalType::Text),
    },
    TypeRule {
        matchers: &[TypeMatcher::Contains("blob"), TypeMatcher::Contains("binary")],
        simplified: Simplified::Fixed(LogicalType::Binary),
    },
    TypeRule {
        matchers: &[TypeMatcher::Contains("char"), TypeMatcher::Contains("string")],
        simplified: Simplified::Fixed(LogicalType::String),
    },
    TypeRule {
        matchers: &[TypeMatcher::Contains("boolean")],
        simplified: Simplified::Fixed(LogicalType::Boolean),
    },
];

/// Per-dialect column metadata normalizer.
#[derive(Debug, Clone)]
pub struct ColumnTypeMapper {
    limit_rules: &'static [LimitRule],
    type_rules: &'static [TypeRule],
    lowercase_sql_type: bool,
    unbounded_varchar_limit: Option<u32>,
    strip_quoted_defaults: bool,
    generated_default: Option<&'static str>,
}

impl Default for ColumnTypeMapper {
    fn default() -> Self {
        Self::generic()
    }
}

impl ColumnTypeMapper {
    /// A mapper that only applies the generic extractors.
    pub const fn generic() -> Self {
        Self {
            limit_rules: &[],
            type_rules: &[],
            lowercase_sql_type: false,
            unbounded_varchar_limit: None,
            strip_quoted_defaults: false,
            generated_default: None,
        }
    }

    /// Dialect limit rules, tried before the generic `(n)` extractor.
    pub const fn with_limit_rules(mut self, rules: &'static [LimitRule]) -> Self {
        self.limit_rules = rules;
        self
    }

    /// Dialect logical type rules, tried before [`GENERIC_TYPE_RULES`].
    pub const fn with_type_rules(mut self, rules: &'static [TypeRule]) -> Self {
        self.type_rules = rules;
        self
    }

    /// Report sql types in lower case.
    pub const fn lowercase_sql_type(mut self) -> Self {
        self.lowercase_sql_type = true;
        self
    }

    /// Limit for VARCHAR columns the driver reports without a length.
    pub const fn with_unbounded_varchar_limit(mut self, limit: u32) -> Self {
        self.unbounded_varchar_limit = Some(limit);
        self
    }

    /// Unwrap single-quoted literal defaults and drop the default when it
    /// equals `generated` (value produced by the database).
    pub const fn with_default_rules(mut self, generated: &'static str) -> Self {
        self.strip_quoted_defaults = true;
        self.generated_default = Some(generated);
        self
    }

    /// Normalized sql type and limit for a driver type string.
    pub fn extract_limit(&self, sql_type: &str) -> (String, Option<u32>) {
        let lower = sql_type.to_lowercase();

        if let Some(rule) = self.limit_rules.iter().find(|r| r.matcher.matches(&lower)) {
            return (rule.sql_type.to_string(), rule.limit);
        }

        let normalized = if self.lowercase_sql_type {
            lower.clone()
        } else {
            sql_type.to_string()
        };

        let mut limit = generic_limit(sql_type);
        if limit.is_none() && lower.starts_with("varchar") {
            limit = self.unbounded_varchar_limit;
        }

        (normalized, limit)
    }

    /// Logical type for a driver type string.
    pub fn simplified_type(&self, sql_type: &str) -> Option<LogicalType> {
        let lower = sql_type.to_lowercase();

        self.type_rules
            .iter()
            .chain(GENERIC_TYPE_RULES.iter())
            .find(|rule| rule.matchers.iter().any(|m| m.matches(&lower)))
            .map(|rule| match rule.simplified {
                Simplified::Fixed(t) => t,
                Simplified::IntegerIfZeroScale => {
                    if extract_scale(sql_type) == Some(0) {
                        LogicalType::Integer
                    } else {
                        LogicalType::Decimal
                    }
                }
            })
    }

    /// Post-process a raw driver default.
    pub fn default_value(&self, raw: Option<&str>) -> Option<String> {
        let value = raw?;

        if self.strip_quoted_defaults
            && value.len() >= 2
            && value.starts_with('\'')
            && value.ends_with('\'')
        {
            return Some(value[1..value.len() - 1].to_string());
        }

        if self.generated_default == Some(value) {
            return None;
        }

        Some(value.to_string())
    }

    /// Build a column descriptor from driver metadata.
    pub fn column(&self, meta: &ColumnMetadata) -> Column {
        let raw_type = meta.sql_type();
        let (sql_type, limit) = self.extract_limit(&raw_type);

        Column {
            name: meta.name.clone(),
            logical_type: self.simplified_type(&raw_type),
            precision: extract_precision(&raw_type),
            scale: extract_scale(&raw_type),
            sql_type,
            limit,
            is_nullable: meta.is_nullable,
            default: self.default_value(meta.default.as_deref()),
            ordinal_pos: meta.ordinal_pos,
        }
    }
}

/// Generic limit: the leading number inside the first parenthesized group.
pub fn generic_limit(sql_type: &str) -> Option<u32> {
    let inner = LIMIT_RE.captures(sql_type)?.get(1)?.as_str().trim_start();
    let digits: String = inner.chars().take_while(char::is_ascii_digit).collect();
    digits.parse().ok()
}

/// Precision of a `numeric`/`decimal`/`number` type string.
pub fn extract_precision(sql_type: &str) -> Option<u32> {
    PRECISION_RE
        .captures(sql_type)
        .and_then(|c| c.get(2))
        .and_then(|m| m.as_str().parse().ok())
}

/// Scale of a `numeric`/`decimal`/`number` type string; 0 when only a
/// precision is given.
pub fn extract_scale(sql_type: &str) -> Option<u32> {
    let caps = SCALE_RE.captures(sql_type)?;
    match caps.get(4) {
        Some(scale) => scale.as_str().parse().ok(),
        None => Some(0),
    }
}
