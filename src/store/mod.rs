//! The narrow document-store interface the engine runs against, plus an
//! in-process implementation and a fault-injecting wrapper.

mod fault;
mod memory;

use std::future::Future;
use std::sync::Arc;

use crate::errors::StoreError;
use crate::query::Query;
use crate::types::{Record, WriteOp};

pub use fault::{CommitCall, FaultyStore};
pub use memory::MemoryStore;

/// Hard cap on operations per atomic commit.
pub const MAX_BATCH_OPS: usize = 500;

pub trait DocumentStore: Send + Sync {
    /// Largest number of operations accepted by one `commit_batch` call.
    fn max_batch_ops(&self) -> usize {
        MAX_BATCH_OPS
    }

    /// Read-only fetch of every record matching `query`.
    fn query(&self, query: &Query) -> impl Future<Output = Result<Vec<Record>, StoreError>> + Send;

    /// Applies `ops` atomically: either all of them take effect or none do.
    fn commit_batch(
        &self,
        collection: &str,
        ops: &[WriteOp],
    ) -> impl Future<Output = Result<(), StoreError>> + Send;
}

impl<S: DocumentStore> DocumentStore for Arc<S> {
    fn max_batch_ops(&self) -> usize {
        (**self).max_batch_ops()
    }

    fn query(&self, query: &Query) -> impl Future<Output = Result<Vec<Record>, StoreError>> + Send {
        (**self).query(query)
    }

    fn commit_batch(
        &self,
        collection: &str,
        ops: &[WriteOp],
    ) -> impl Future<Output = Result<(), StoreError>> + Send {
        (**self).commit_batch(collection, ops)
    }
}
