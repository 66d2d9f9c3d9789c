//! Partitions record references into commit-sized batches.

use crate::errors::BulkError;

/// Splits `items` into contiguous chunks of at most `batch_size`, preserving order.
///
/// Sizes above the store's per-commit cap are passed through untouched; the store
/// rejects the oversized commit and the failure shows up in the batch errors.
///
/// # Errors
/// Returns [`BulkError::Config`] when `batch_size` is zero.
pub fn plan<T: Clone>(items: &[T], batch_size: usize) -> Result<Vec<Vec<T>>, BulkError> {
    if batch_size == 0 {
        return Err(BulkError::Config("batch size must be at least 1".into()));
    }
    Ok(items.chunks(batch_size).map(<[T]>::to_vec).collect())
}

#[must_use]
pub fn batch_count(items: usize, batch_size: usize) -> usize {
    items.div_ceil(batch_size.max(1))
}
