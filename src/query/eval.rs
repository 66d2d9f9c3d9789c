use bson::{Bson, Document as BsonDocument};
use std::cmp::Ordering;

use super::types::{CmpOp, MAX_PATH_DEPTH, Predicate, Query};

pub fn eval_query(doc: &BsonDocument, query: &Query) -> bool {
    query.predicates.iter().all(|p| eval_predicate(doc, p))
}

/// Evaluates one clause. A missing field never matches, `!=` and `not-in` included.
pub fn eval_predicate(doc: &BsonDocument, pred: &Predicate) -> bool {
    let Some(v) = get_path(doc, pred.path()) else {
        return false;
    };
    match pred {
        Predicate::Cmp { op, value, .. } => match op {
            CmpOp::Eq => bson_equal(v, value),
            CmpOp::Ne => !bson_equal(v, value),
            CmpOp::Gt => compare_bson(v, value) == Some(Ordering::Greater),
            CmpOp::Gte => {
                matches!(compare_bson(v, value), Some(Ordering::Greater | Ordering::Equal))
            }
            CmpOp::Lt => compare_bson(v, value) == Some(Ordering::Less),
            CmpOp::Lte => matches!(compare_bson(v, value), Some(Ordering::Less | Ordering::Equal)),
        },
        Predicate::ArrayContains { value, .. } => match v {
            Bson::Array(items) => items.iter().any(|x| bson_equal(x, value)),
            _ => false,
        },
        Predicate::In { values, .. } => is_in_set(v, values),
        Predicate::Nin { values, .. } => !is_in_set(v, values),
        Predicate::ArrayContainsAny { values, .. } => match v {
            Bson::Array(items) => items.iter().any(|x| is_in_set(x, values)),
            _ => false,
        },
    }
}

fn is_in_set(v: &Bson, set: &[Bson]) -> bool {
    set.iter().any(|x| bson_equal(v, x))
}

fn get_path<'a>(doc: &'a BsonDocument, path: &str) -> Option<&'a Bson> {
    if path.is_empty() || path.len() > 1024 {
        return None;
    }
    let mut cur = doc;
    let mut segs = 0usize;
    let mut parts = path.split('.').peekable();
    while let Some(part) = parts.next() {
        segs += 1;
        if segs > MAX_PATH_DEPTH {
            return None;
        }
        let v = cur.get(part)?;
        if parts.peek().is_none() {
            return Some(v);
        }
        match v {
            Bson::Document(d) => cur = d,
            _ => return None,
        }
    }
    None
}

fn as_f64_num(x: &Bson) -> Option<f64> {
    match x {
        Bson::Int32(i) => Some(f64::from(*i)),
        #[allow(clippy::cast_precision_loss)]
        Bson::Int64(i) => Some(*i as f64),
        Bson::Double(f) => Some(*f),
        Bson::Decimal128(d) => d.to_string().parse::<f64>().ok(),
        _ => None,
    }
}

/// Strict equality, except that all numeric BSON types compare by value.
pub fn bson_equal(a: &Bson, b: &Bson) -> bool {
    match (as_f64_num(a), as_f64_num(b)) {
        (Some(x), Some(y)) => x == y,
        _ => a == b,
    }
}

/// Ordering between values of the same kind; `None` when the kinds differ.
pub fn compare_bson(a: &Bson, b: &Bson) -> Option<Ordering> {
    if let (Some(x), Some(y)) = (as_f64_num(a), as_f64_num(b)) {
        return x.partial_cmp(&y);
    }
    match (a, b) {
        (Bson::String(x), Bson::String(y)) => Some(x.cmp(y)),
        (Bson::Boolean(x), Bson::Boolean(y)) => Some(x.cmp(y)),
        (Bson::DateTime(x), Bson::DateTime(y)) => Some(x.cmp(y)),
        _ => None,
    }
}
