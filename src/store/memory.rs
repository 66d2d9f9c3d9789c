use bson::Document as BsonDocument;
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};
use std::future::Future;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::errors::{BulkError, StoreError};
use crate::query::{Query, eval_query};
use crate::types::{Record, RecordId, WriteOp};

use super::{DocumentStore, MAX_BATCH_OPS};

/// Field holding the record id in NDJSON files.
const ID_FIELD: &str = "_id";

type CollectionMap = BTreeMap<RecordId, BsonDocument>;

/// In-process document store. Records iterate in id order.
pub struct MemoryStore {
    collections: RwLock<HashMap<String, CollectionMap>>,
    max_batch_ops: usize,
    commits: AtomicU64,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_max_batch_ops(MAX_BATCH_OPS)
    }

    pub fn with_max_batch_ops(max_batch_ops: usize) -> Self {
        Self {
            collections: RwLock::new(HashMap::new()),
            max_batch_ops,
            commits: AtomicU64::new(0),
        }
    }

    pub fn create_collection(&self, name: &str) {
        self.collections.write().entry(name.to_string()).or_default();
    }

    pub fn insert(&self, collection: &str, record: Record) {
        self.collections
            .write()
            .entry(collection.to_string())
            .or_default()
            .insert(record.id, record.fields);
    }

    pub fn insert_many(&self, collection: &str, records: impl IntoIterator<Item = Record>) {
        let mut cols = self.collections.write();
        let col = cols.entry(collection.to_string()).or_default();
        for r in records {
            col.insert(r.id, r.fields);
        }
    }

    pub fn get(&self, collection: &str, id: &RecordId) -> Option<Record> {
        let cols = self.collections.read();
        let fields = cols.get(collection)?.get(id)?.clone();
        Some(Record { id: id.clone(), fields })
    }

    pub fn len(&self, collection: &str) -> usize {
        self.collections.read().get(collection).map_or(0, BTreeMap::len)
    }

    pub fn is_empty(&self, collection: &str) -> bool {
        self.len(collection) == 0
    }

    pub fn records(&self, collection: &str) -> Vec<Record> {
        self.collections
            .read()
            .get(collection)
            .map(|col| {
                col.iter()
                    .map(|(id, fields)| Record { id: id.clone(), fields: fields.clone() })
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Number of successful `commit_batch` calls so far.
    pub fn commit_count(&self) -> u64 {
        self.commits.load(Ordering::Relaxed)
    }

    fn run_query(&self, query: &Query) -> Result<Vec<Record>, StoreError> {
        let cols = self.collections.read();
        let col = cols
            .get(&query.collection)
            .ok_or_else(|| StoreError::NoSuchCollection(query.collection.clone()))?;
        Ok(col
            .iter()
            .filter(|(_, fields)| eval_query(fields, query))
            .map(|(id, fields)| Record { id: id.clone(), fields: fields.clone() })
            .collect())
    }

    fn apply_batch(&self, collection: &str, ops: &[WriteOp]) -> Result<(), StoreError> {
        if ops.len() > self.max_batch_ops {
            return Err(StoreError::TooManyOperations {
                requested: ops.len(),
                max: self.max_batch_ops,
            });
        }
        // Single write lock for the whole batch keeps it all-or-nothing.
        let mut cols = self.collections.write();
        let col = cols.entry(collection.to_string()).or_default();
        for op in ops {
            match op {
                WriteOp::Delete { id } => {
                    col.remove(id);
                }
                WriteOp::Set { id, fields } => {
                    col.insert(id.clone(), fields.clone());
                }
            }
        }
        self.commits.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    /// Loads newline-delimited JSON objects into `collection`. A string or numeric
    /// `_id` becomes the record id; records without one get a generated id.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or a line is not a JSON object.
    pub fn load_ndjson(&self, path: &Path, collection: &str) -> Result<usize, BulkError> {
        let reader = BufReader::new(std::fs::File::open(path)?);
        let mut records = Vec::new();
        for line in reader.lines() {
            let line = line?;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let mut fields: BsonDocument = serde_json::from_str(line)?;
            let id = match fields.remove(ID_FIELD) {
                Some(bson::Bson::String(s)) => RecordId(s),
                Some(bson::Bson::Int32(i)) => RecordId(i.to_string()),
                Some(bson::Bson::Int64(i)) => RecordId(i.to_string()),
                _ => RecordId::new(),
            };
            records.push(Record { id, fields });
        }
        let n = records.len();
        self.create_collection(collection);
        self.insert_many(collection, records);
        log::info!("loaded {n} records into '{collection}' from {}", path.display());
        Ok(n)
    }

    /// Writes `collection` as NDJSON, replacing `path` via a temp file and rename.
    ///
    /// # Errors
    /// Returns an error if encoding or any file operation fails.
    pub fn save_ndjson(&self, path: &Path, collection: &str) -> Result<usize, BulkError> {
        let tmp = path.with_extension("ndjson.tmp");
        let records = self.records(collection);
        {
            let mut w = BufWriter::new(std::fs::File::create(&tmp)?);
            for r in &records {
                let mut doc = BsonDocument::new();
                doc.insert(ID_FIELD, r.id.0.clone());
                for (k, v) in &r.fields {
                    doc.insert(k.clone(), v.clone());
                }
                writeln!(w, "{}", serde_json::to_string(&doc)?)?;
            }
            w.flush()?;
        }
        std::fs::rename(&tmp, path)?;
        Ok(records.len())
    }
}

impl DocumentStore for MemoryStore {
    fn max_batch_ops(&self) -> usize {
        self.max_batch_ops
    }

    fn query(&self, query: &Query) -> impl Future<Output = Result<Vec<Record>, StoreError>> + Send {
        std::future::ready(self.run_query(query))
    }

    fn commit_batch(
        &self,
        collection: &str,
        ops: &[WriteOp],
    ) -> impl Future<Output = Result<(), StoreError>> + Send {
        std::future::ready(self.apply_batch(collection, ops))
    }
}
