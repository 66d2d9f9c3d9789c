use bson::Bson;

use crate::condition::{Condition, ConditionValue, Operator, validate_conditions};
use crate::errors::BulkError;

use super::types::{CmpOp, Predicate, Query};

/// Translates conditions into a [`Query`]. Fails before any I/O on invalid input.
///
/// # Errors
/// Returns [`BulkError::Validation`] for a blank collection name or invalid conditions.
pub fn build_query(collection: &str, conditions: &[Condition]) -> Result<Query, BulkError> {
    if collection.trim().is_empty() {
        return Err(BulkError::Validation("collection name must not be empty".into()));
    }
    validate_conditions(conditions)?;
    let predicates = conditions.iter().map(to_predicate).collect();
    Ok(Query { collection: collection.to_string(), predicates })
}

fn to_predicate(c: &Condition) -> Predicate {
    let path = c.field.trim().to_string();
    let cmp = |op| Predicate::Cmp { path: path.clone(), op, value: c.value.to_bson() };
    match c.operator {
        Operator::Eq => cmp(CmpOp::Eq),
        Operator::Ne => cmp(CmpOp::Ne),
        Operator::Lt => cmp(CmpOp::Lt),
        Operator::Lte => cmp(CmpOp::Lte),
        Operator::Gt => cmp(CmpOp::Gt),
        Operator::Gte => cmp(CmpOp::Gte),
        Operator::ArrayContains => Predicate::ArrayContains { path, value: c.value.to_bson() },
        Operator::In => Predicate::In { path, values: list_values(&c.value) },
        Operator::NotIn => Predicate::Nin { path, values: list_values(&c.value) },
        Operator::ArrayContainsAny => {
            Predicate::ArrayContainsAny { path, values: list_values(&c.value) }
        }
    }
}

// A scalar given to a list operator behaves as a one-element list.
fn list_values(v: &ConditionValue) -> Vec<Bson> {
    match v {
        ConditionValue::List(items) => items.iter().map(ConditionValue::to_bson).collect(),
        other => vec![other.to_bson()],
    }
}
