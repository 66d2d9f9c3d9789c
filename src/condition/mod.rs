//! Typed predicates supplied by an operator: field, operator, and a coerced value.

mod coerce;
mod parse;
mod types;
mod validate;

pub use coerce::{coerce, coerce_for, coerce_list};
pub use types::{Condition, ConditionValue, Operator};
pub use validate::validate_conditions;
