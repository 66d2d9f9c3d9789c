//! Syntactic coercion of form text into typed condition values.
//!
//! Coercion never looks at the stored schema. A boolean field compared against the
//! text `"1"` coerces to the number 1 and simply matches nothing.

use super::types::{ConditionValue, Operator};

/// Coerces a single raw value. Rules apply in order: `null`, booleans
/// (case-insensitive), finite numbers, then the original string.
pub fn coerce(raw: &str) -> ConditionValue {
    if raw == "null" {
        return ConditionValue::Null;
    }
    if raw.eq_ignore_ascii_case("true") {
        return ConditionValue::Bool(true);
    }
    if raw.eq_ignore_ascii_case("false") {
        return ConditionValue::Bool(false);
    }
    if !raw.is_empty()
        && let Ok(n) = raw.parse::<f64>()
        && n.is_finite()
    {
        return ConditionValue::Number(n);
    }
    ConditionValue::String(raw.to_string())
}

/// Comma-separated list coercion; blank input gives an empty list.
pub fn coerce_list(raw: &str) -> ConditionValue {
    let items = raw
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(coerce)
        .collect();
    ConditionValue::List(items)
}

pub fn coerce_for(op: Operator, raw: &str) -> ConditionValue {
    if op.is_list() { coerce_list(raw) } else { coerce(raw) }
}
