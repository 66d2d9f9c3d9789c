use bson::Document as BsonDocument;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Opaque reference to a record inside a collection.
///
/// Stores hand out their own identifiers (imported `_id` values, generated UUIDs);
/// the engine never interprets them.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(pub String);

impl RecordId {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for RecordId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RecordId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for RecordId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// A stored record: identifier plus its field values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: RecordId,
    pub fields: BsonDocument,
}

impl Record {
    pub fn new(id: impl Into<RecordId>, fields: BsonDocument) -> Self {
        Self { id: id.into(), fields }
    }
}

/// A record as it looked when a query matched it.
///
/// The snapshot is taken once and never refreshed; deletion later acts on `id` alone.
pub type MatchedRecord = Record;

/// One mutation inside an atomic batch commit.
#[derive(Debug, Clone, PartialEq)]
pub enum WriteOp {
    Delete { id: RecordId },
    Set { id: RecordId, fields: BsonDocument },
}

impl WriteOp {
    pub fn id(&self) -> &RecordId {
        match self {
            Self::Delete { id } | Self::Set { id, .. } => id,
        }
    }
}
