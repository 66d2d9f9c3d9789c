use bson::Bson;

// Safety limits to prevent resource abuse
pub(crate) const MAX_PATH_DEPTH: usize = 32;
pub const MAX_IN_SET: usize = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
}

/// One filter clause; a [`Query`] matches when every clause matches.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    Cmp { path: String, op: CmpOp, value: Bson },
    ArrayContains { path: String, value: Bson },
    In { path: String, values: Vec<Bson> },
    Nin { path: String, values: Vec<Bson> },
    ArrayContainsAny { path: String, values: Vec<Bson> },
}

impl Predicate {
    pub fn path(&self) -> &str {
        match self {
            Self::Cmp { path, .. }
            | Self::ArrayContains { path, .. }
            | Self::In { path, .. }
            | Self::Nin { path, .. }
            | Self::ArrayContainsAny { path, .. } => path,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub collection: String,
    pub predicates: Vec<Predicate>,
}
