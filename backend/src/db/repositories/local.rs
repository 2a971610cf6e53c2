//! In-memory document store for unit tests and local development.
//!
//! Documents are kept in a single ordered map guarded by a `parking_lot`
//! lock. A commit resolves the whole batch while holding the write lock and
//! only then swaps the results in, so readers never observe half a batch.

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use crate::db::repository::batch::resolve_batch;
use crate::db::repository::{
    check_batch_limits, check_query_limits, Document, DocumentChange, DocumentPath,
    DocumentStore, ErrorContext, Query, RepositoryError, RepositoryResult, StoreLimits,
    WriteBatch,
};

type DocumentMap = BTreeMap<DocumentPath, Map<String, Value>>;

/// In-memory [`DocumentStore`].
///
/// Clones share the same underlying data.
#[derive(Clone, Debug, Default)]
pub struct LocalRepository {
    documents: Arc<RwLock<DocumentMap>>,
    limits: StoreLimits,
    fail_commits: Arc<AtomicBool>,
    commits: Arc<AtomicU64>,
}

impl LocalRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limits(limits: StoreLimits) -> Self {
        Self {
            limits,
            ..Self::default()
        }
    }

    /// Make every following commit fail with a transaction error.
    pub fn set_fail_commits(&self, fail: bool) {
        self.fail_commits.store(fail, Ordering::SeqCst);
    }

    /// Number of successful commits.
    pub fn commit_count(&self) -> u64 {
        self.commits.load(Ordering::SeqCst)
    }

    pub fn len(&self) -> usize {
        self.documents.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.read().is_empty()
    }

    /// Remove every document.
    pub fn clear(&self) {
        self.documents.write().clear();
    }
}

#[async_trait]
impl DocumentStore for LocalRepository {
    async fn get(&self, path: &DocumentPath) -> RepositoryResult<Option<Document>> {
        path.validate()?;
        let documents = self.documents.read();
        Ok(documents
            .get(path)
            .map(|data| Document::new(path.clone(), data.clone())))
    }

    async fn query(&self, query: &Query) -> RepositoryResult<Vec<Document>> {
        check_query_limits(query, &self.limits)?;
        let documents = self.documents.read();
        let candidates = documents
            .iter()
            .filter(|(path, _)| query.collection_path().contains(path))
            .map(|(path, data)| Document::new(path.clone(), data.clone()));
        Ok(query.apply(candidates))
    }

    async fn commit(&self, batch: WriteBatch) -> RepositoryResult<Vec<DocumentChange>> {
        check_batch_limits(&batch, &self.limits)?;
        if self.fail_commits.load(Ordering::SeqCst) {
            return Err(RepositoryError::TransactionError {
                message: "commit rejected by local store".to_string(),
                context: ErrorContext::new("commit").with_details(format!("writes={}", batch.len())),
            });
        }

        let mut documents = self.documents.write();
        let changes = resolve_batch(batch.ops(), Utc::now(), |path| {
            Ok(documents.get(path).cloned())
        })?;

        for change in &changes {
            match &change.after {
                Some(doc) => {
                    documents.insert(change.path.clone(), doc.data.clone());
                }
                None => {
                    documents.remove(&change.path);
                }
            }
        }
        self.commits.fetch_add(1, Ordering::SeqCst);
        Ok(changes)
    }

    async fn health_check(&self) -> RepositoryResult<bool> {
        Ok(true)
    }

    fn limits(&self) -> StoreLimits {
        self.limits
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::{CollectionPath, Direction, Fields};
    use serde_json::json;

    fn path(p: &str) -> DocumentPath {
        DocumentPath::parse(p).unwrap()
    }

    #[tokio::test]
    async fn test_commit_then_get() {
        let repo = LocalRepository::new();
        let mut batch = WriteBatch::new();
        batch.set(path("leagues/l1/teams/a"), Fields::new().set("name", "Hawks"));
        let changes = repo.commit(batch).await.unwrap();
        assert_eq!(changes.len(), 1);

        let doc = repo.get(&path("leagues/l1/teams/a")).await.unwrap().unwrap();
        assert_eq!(doc.get("name"), Some(&json!("Hawks")));
        assert!(repo.get(&path("leagues/l1/teams/b")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_failed_update_leaves_store_untouched() {
        let repo = LocalRepository::new();
        let mut batch = WriteBatch::new();
        batch.set(path("leagues/l1/teams/a"), Fields::new().set("name", "Hawks"));
        batch.update(path("leagues/l1/teams/missing"), Fields::new().set("name", "X"));

        let err = repo.commit(batch).await.unwrap_err();
        assert!(err.is_not_found());
        assert!(repo.is_empty());
        assert_eq!(repo.commit_count(), 0);
    }

    #[tokio::test]
    async fn test_injected_failure_rejects_commit() {
        let repo = LocalRepository::new();
        repo.set_fail_commits(true);
        let mut batch = WriteBatch::new();
        batch.set(path("leagues/l1/teams/a"), Fields::new().set("name", "Hawks"));
        assert!(repo.commit(batch).await.is_err());
        assert!(repo.is_empty());
    }

    #[tokio::test]
    async fn test_batch_write_limit() {
        let repo = LocalRepository::with_limits(StoreLimits {
            max_in_values: 30,
            max_batch_writes: 2,
        });
        let mut batch = WriteBatch::new();
        for id in ["a", "b", "c"] {
            batch.set(path(&format!("leagues/l1/teams/{}", id)), Fields::new());
        }
        let err = repo.commit(batch).await.unwrap_err();
        assert!(matches!(err, RepositoryError::ValidationError { .. }));
    }

    #[tokio::test]
    async fn test_query_respects_in_limit_and_ordering() {
        let repo = LocalRepository::with_limits(StoreLimits {
            max_in_values: 2,
            max_batch_writes: 500,
        });
        let mut batch = WriteBatch::new();
        for (id, n) in [("a", 3), ("b", 1), ("c", 2)] {
            batch.set(
                path(&format!("leagues/l1/players/{}", id)),
                Fields::new().set("number", n),
            );
        }
        repo.commit(batch).await.unwrap();

        let players = CollectionPath::parse("leagues/l1/players").unwrap();
        let sorted = repo
            .query(&Query::collection(players.clone()).order_by("number", Direction::Ascending))
            .await
            .unwrap();
        let ids: Vec<&str> = sorted.iter().map(|d| d.id()).collect();
        assert_eq!(ids, vec!["b", "c", "a"]);

        let too_many = Query::collection(players)
            .where_in("number", vec![json!(1), json!(2), json!(3)]);
        assert!(repo.query(&too_many).await.is_err());
    }
}
