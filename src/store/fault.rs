use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::errors::StoreError;
use crate::query::Query;
use crate::types::{Record, WriteOp};

use super::DocumentStore;

/// What a commit rule sees for each `commit_batch` call.
pub struct CommitCall<'a> {
    /// 1-based count of commit calls made through this wrapper, retries included.
    pub call: usize,
    pub collection: &'a str,
    pub ops: &'a [WriteOp],
}

type CommitRule = Box<dyn Fn(&CommitCall<'_>) -> Option<StoreError> + Send + Sync>;

/// Wraps a store and injects failures, for exercising retry and partial-failure paths.
pub struct FaultyStore<S> {
    inner: S,
    commit_rule: Option<CommitRule>,
    query_error: Option<StoreError>,
    calls: AtomicUsize,
}

impl<S: DocumentStore> FaultyStore<S> {
    pub fn new(inner: S) -> Self {
        Self { inner, commit_rule: None, query_error: None, calls: AtomicUsize::new(0) }
    }

    /// Fails a commit whenever `rule` returns an error; the inner store is untouched then.
    #[must_use]
    pub fn fail_commits_when<F>(mut self, rule: F) -> Self
    where
        F: Fn(&CommitCall<'_>) -> Option<StoreError> + Send + Sync + 'static,
    {
        self.commit_rule = Some(Box::new(rule));
        self
    }

    /// Every query fails with `err`.
    #[must_use]
    pub fn fail_queries_with(mut self, err: StoreError) -> Self {
        self.query_error = Some(err);
        self
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    pub fn commit_calls(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }
}

impl<S: DocumentStore> DocumentStore for FaultyStore<S> {
    fn max_batch_ops(&self) -> usize {
        self.inner.max_batch_ops()
    }

    fn query(&self, query: &Query) -> impl Future<Output = Result<Vec<Record>, StoreError>> + Send {
        let injected = self.query_error.clone();
        let inner = &self.inner;
        async move {
            if let Some(e) = injected {
                return Err(e);
            }
            inner.query(query).await
        }
    }

    fn commit_batch(
        &self,
        collection: &str,
        ops: &[WriteOp],
    ) -> impl Future<Output = Result<(), StoreError>> + Send {
        let call = self.calls.fetch_add(1, Ordering::Relaxed) + 1;
        let injected = self
            .commit_rule
            .as_ref()
            .and_then(|rule| rule(&CommitCall { call, collection, ops }));
        let inner = &self.inner;
        // The inner call is deferred so an injected failure leaves the store untouched.
        async move {
            if let Some(e) = injected {
                return Err(e);
            }
            inner.commit_batch(collection, ops).await
        }
    }
}
