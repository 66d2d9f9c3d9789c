use crate::errors::BulkError;
use crate::query::MAX_IN_SET;

use super::types::{Condition, ConditionValue};

/// Checks conditions before any I/O. Returns the first problem found.
///
/// # Errors
/// Returns [`BulkError::Validation`] when the list is empty, a field is blank,
/// a non-list operator has no value, or a list value holds more than [`MAX_IN_SET`] items.
pub fn validate_conditions(conditions: &[Condition]) -> Result<(), BulkError> {
    if conditions.is_empty() {
        return Err(BulkError::Validation("at least one condition is required".into()));
    }
    for (i, c) in conditions.iter().enumerate() {
        let n = i + 1;
        if c.field.trim().is_empty() {
            return Err(BulkError::Validation(format!("condition {n}: field must not be empty")));
        }
        if !c.operator.is_list() && c.value.is_empty() {
            return Err(BulkError::Validation(format!(
                "condition {n} ({}): operator '{}' requires a value",
                c.field, c.operator
            )));
        }
        if let ConditionValue::List(items) = &c.value {
            if items.len() > MAX_IN_SET {
                return Err(BulkError::Validation(format!(
                    "condition {n} ({}): list has {} values; at most {MAX_IN_SET} are allowed",
                    c.field,
                    items.len()
                )));
            }
        }
    }
    Ok(())
}
