//! Typed read helpers shared by every store backend.
//!
//! These functions work with any [`DocumentStore`] implementation and hide the
//! JSON decoding and the membership-query chunking from the league services.

use futures::future::try_join_all;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashSet;

use super::repository::{
    CollectionPath, Document, DocumentPath, DocumentStore, FieldPath, Query, RepositoryResult,
};
use crate::api::WithId;

/// Check store connectivity.
pub async fn health_check(store: &dyn DocumentStore) -> RepositoryResult<bool> {
    store.health_check().await
}

/// Read and decode one document.
pub async fn get_typed<T: DeserializeOwned>(
    store: &dyn DocumentStore,
    path: &DocumentPath,
) -> RepositoryResult<Option<WithId<T>>> {
    match store.get(path).await? {
        Some(doc) => Ok(Some(decode_with_id(&doc)?)),
        None => Ok(None),
    }
}

/// Run a query and decode every result.
pub async fn query_typed<T: DeserializeOwned>(
    store: &dyn DocumentStore,
    query: &Query,
) -> RepositoryResult<Vec<WithId<T>>> {
    store
        .query(query)
        .await?
        .iter()
        .map(decode_with_id)
        .collect()
}

pub fn decode_with_id<T: DeserializeOwned>(doc: &Document) -> RepositoryResult<WithId<T>> {
    Ok(WithId::new(doc.id(), doc.decode::<T>()?))
}

/// Membership query over an arbitrary number of values.
///
/// Values are de-duplicated and split into chunks of the store's
/// `max_in_values`; chunks run concurrently and their results are concatenated
/// in chunk order.
pub async fn query_in_chunks(
    store: &dyn DocumentStore,
    collection: &CollectionPath,
    field: FieldPath,
    values: Vec<Value>,
) -> RepositoryResult<Vec<Document>> {
    let mut seen = HashSet::new();
    let values: Vec<Value> = values
        .into_iter()
        .filter(|v| seen.insert(v.to_string()))
        .collect();
    if values.is_empty() {
        return Ok(Vec::new());
    }

    let chunk_size = store.limits().max_in_values.max(1);
    let queries: Vec<Query> = values
        .chunks(chunk_size)
        .map(|chunk| Query::collection(collection.clone()).where_in(field.clone(), chunk.to_vec()))
        .collect();

    let results = try_join_all(queries.iter().map(|q| store.query(q))).await?;
    Ok(results.into_iter().flatten().collect())
}
