use std::str::FromStr;

use crate::errors::BulkError;

use super::types::{Condition, Operator};

/// Parses `"<field> <op> <value>"`. The value is the rest of the line and may be
/// empty for list operators.
impl FromStr for Condition {
    type Err = BulkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim_start();
        let (field, rest) = s
            .split_once(char::is_whitespace)
            .ok_or_else(|| BulkError::Validation(format!("expected '<field> <op> <value>', got '{s}'")))?;
        let rest = rest.trim_start();
        let (op, raw) = match rest.split_once(char::is_whitespace) {
            Some((op, raw)) => (op, raw.trim()),
            None => (rest, ""),
        };
        let operator = Operator::from_str(op)?;
        Ok(Self::from_raw(field, operator, raw))
    }
}
