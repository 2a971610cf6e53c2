//! Document store contract.
//!
//! The league services talk to storage only through [`DocumentStore`]: point
//! reads, filtered/ordered collection queries, and atomic write batches. Backends
//! live in `db::repositories`.

pub mod batch;
pub mod document;
pub mod error;
pub mod query;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use batch::{ChangeKind, DocumentChange, FieldValue, Fields, WriteBatch, WriteOp};
pub use document::{CollectionPath, Document, DocumentPath};
pub use error::{ErrorContext, RepositoryError, RepositoryResult};
pub use query::{compare_values, Direction, FieldPath, Filter, FilterOp, OrderBy, Query};

/// Capability limits of a store backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreLimits {
    /// Maximum number of values accepted by a single `in` filter.
    #[serde(default = "default_max_in_values")]
    pub max_in_values: usize,
    /// Maximum number of write operations in one batch.
    #[serde(default = "default_max_batch_writes")]
    pub max_batch_writes: usize,
}

fn default_max_in_values() -> usize {
    30
}

fn default_max_batch_writes() -> usize {
    500
}

impl Default for StoreLimits {
    fn default() -> Self {
        Self {
            max_in_values: default_max_in_values(),
            max_batch_writes: default_max_batch_writes(),
        }
    }
}

/// Transactional document storage.
///
/// # Thread Safety
/// Implementations must be `Send + Sync`; handlers share one instance behind an `Arc`.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Read a single document. Absence is `Ok(None)`.
    async fn get(&self, path: &DocumentPath) -> RepositoryResult<Option<Document>>;

    /// Run a filtered, ordered query over one collection.
    async fn query(&self, query: &Query) -> RepositoryResult<Vec<Document>>;

    /// Apply every operation of `batch` atomically.
    ///
    /// # Returns
    /// * `Ok(Vec<DocumentChange>)` - one entry per touched document, with the
    ///   snapshots before and after the commit
    /// * `Err(RepositoryError)` - nothing was written
    async fn commit(&self, batch: WriteBatch) -> RepositoryResult<Vec<DocumentChange>>;

    /// Check that the backend is reachable.
    async fn health_check(&self) -> RepositoryResult<bool>;

    /// Capability limits of this backend.
    fn limits(&self) -> StoreLimits {
        StoreLimits::default()
    }
}

/// Validate a batch against the store limits before touching data.
pub(crate) fn check_batch_limits(batch: &WriteBatch, limits: &StoreLimits) -> RepositoryResult<()> {
    if batch.len() > limits.max_batch_writes {
        return Err(RepositoryError::validation_with_context(
            format!(
                "batch has {} writes, limit is {}",
                batch.len(),
                limits.max_batch_writes
            ),
            ErrorContext::new("commit").with_entity("batch"),
        ));
    }
    Ok(())
}

/// Validate `in` filters against the store limits.
pub(crate) fn check_query_limits(query: &Query, limits: &StoreLimits) -> RepositoryResult<()> {
    for filter in query.filters() {
        if filter.op != FilterOp::In {
            continue;
        }
        let count = filter.value.as_array().map(Vec::len).ok_or_else(|| {
            RepositoryError::validation_with_context(
                "`in` filter requires an array value",
                ErrorContext::new("query").with_entity_id(query.collection_str()),
            )
        })?;
        if count > limits.max_in_values {
            return Err(RepositoryError::validation_with_context(
                format!(
                    "`in` filter has {} values, limit is {}",
                    count, limits.max_in_values
                ),
                ErrorContext::new("query").with_entity_id(query.collection_str()),
            ));
        }
    }
    Ok(())
}
