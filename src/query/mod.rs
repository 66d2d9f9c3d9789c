//! Store-native queries built from operator conditions.

mod build;
mod eval;
mod types;

pub use build::build_query;
pub use eval::{bson_equal, compare_bson, eval_predicate, eval_query};
pub use types::{CmpOp, MAX_IN_SET, Predicate, Query};
