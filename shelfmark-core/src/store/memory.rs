//! In-memory [`DocumentStore`] used by tests and demos.

use std::cmp::Ordering as CmpOrdering;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use tokio::sync::RwLock;

use super::{
    CollectionRef, Document, DocumentId, DocumentStore, Query, SortDirection,
    StoreError, StoreResult, StoredDocument,
};

/// Document store backed by process memory.
///
/// Semantics mirror the capability contract exactly: generated ids,
/// equality filters, single-field ordering, merge updates, idempotent
/// deletes. The server clock is strictly monotonic so that two writes in
/// the same process never share a timestamp, which keeps `order_by`
/// results stable.
#[derive(Debug, Default)]
pub struct MemoryDocumentStore {
    collections: RwLock<HashMap<CollectionRef, BTreeMap<DocumentId, Document>>>,
    last_time_ms: AtomicI64,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Total order over JSON values for `order_by`: null < bool < number <
/// string < array < object. Mixed-type comparisons are unusual in practice
/// (a field holds one shape per collection) but must not panic.
fn compare_values(a: &Value, b: &Value) -> CmpOrdering {
    fn rank(v: &Value) -> u8 {
        match v {
            Value::Null => 0,
            Value::Bool(_) => 1,
            Value::Number(_) => 2,
            Value::String(_) => 3,
            Value::Array(_) => 4,
            Value::Object(_) => 5,
        }
    }

    match (a, b) {
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Number(x), Value::Number(y)) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(CmpOrdering::Equal),
        (Value::String(x), Value::String(y)) => x.cmp(y),
        _ => rank(a).cmp(&rank(b)),
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn insert(
        &self,
        collection: &CollectionRef,
        fields: Document,
    ) -> StoreResult<DocumentId> {
        let id = DocumentId::generate();
        let mut collections = self.collections.write().await;
        collections
            .entry(collection.clone())
            .or_default()
            .insert(id, fields);
        Ok(id)
    }

    async fn get(
        &self,
        collection: &CollectionRef,
        id: &DocumentId,
    ) -> StoreResult<Option<Document>> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .and_then(|documents| documents.get(id))
            .cloned())
    }

    async fn update(
        &self,
        collection: &CollectionRef,
        id: &DocumentId,
        fields: Document,
    ) -> StoreResult<()> {
        let mut collections = self.collections.write().await;
        let document = collections
            .get_mut(collection)
            .and_then(|documents| documents.get_mut(id))
            .ok_or_else(|| {
                StoreError::MissingDocument(format!("{collection}/{id}"))
            })?;
        for (field, value) in fields {
            document.insert(field, value);
        }
        Ok(())
    }

    async fn delete(
        &self,
        collection: &CollectionRef,
        id: &DocumentId,
    ) -> StoreResult<()> {
        let mut collections = self.collections.write().await;
        if let Some(documents) = collections.get_mut(collection) {
            documents.remove(id);
        }
        Ok(())
    }

    async fn query(
        &self,
        collection: &CollectionRef,
        query: Query,
    ) -> StoreResult<Vec<StoredDocument>> {
        let collections = self.collections.read().await;
        let mut results: Vec<StoredDocument> = collections
            .get(collection)
            .map(|documents| {
                documents
                    .iter()
                    .filter(|(_, fields)| {
                        query.filters.iter().all(|filter| {
                            fields.get(&filter.field) == Some(&filter.equals)
                        })
                    })
                    .map(|(id, fields)| StoredDocument {
                        id: *id,
                        fields: fields.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default();

        if let Some((field, direction)) = &query.order_by {
            results.sort_by(|a, b| {
                let left = a.fields.get(field).unwrap_or(&Value::Null);
                let right = b.fields.get(field).unwrap_or(&Value::Null);
                let ordering = compare_values(left, right);
                match direction {
                    SortDirection::Ascending => ordering,
                    SortDirection::Descending => ordering.reverse(),
                }
            });
        }

        if let Some(limit) = query.limit {
            results.truncate(limit);
        }

        Ok(results)
    }

    fn server_time(&self) -> DateTime<Utc> {
        let now = Utc::now().timestamp_millis();
        let previous = match self.last_time_ms.fetch_update(
            Ordering::Relaxed,
            Ordering::Relaxed,
            |last| Some(now.max(last + 1)),
        ) {
            Ok(value) | Err(value) => value,
        };
        let millis = now.max(previous + 1);
        DateTime::from_timestamp_millis(millis).unwrap_or_else(Utc::now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(pairs: &[(&str, Value)]) -> Document {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), v.clone()))
            .collect()
    }

    #[tokio::test]
    async fn insert_then_get_round_trips() {
        let store = MemoryDocumentStore::new();
        let books = CollectionRef::root("books");
        let id = store
            .insert(&books, doc(&[("title", json!("Dune"))]))
            .await
            .unwrap();

        let fetched = store.get(&books, &id).await.unwrap().unwrap();
        assert_eq!(fetched.get("title"), Some(&json!("Dune")));
    }

    #[tokio::test]
    async fn get_missing_document_is_none() {
        let store = MemoryDocumentStore::new();
        let books = CollectionRef::root("books");
        let missing = store
            .get(&books, &DocumentId::generate())
            .await
            .unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn update_merges_fields_and_requires_existence() {
        let store = MemoryDocumentStore::new();
        let books = CollectionRef::root("books");
        let id = store
            .insert(
                &books,
                doc(&[("title", json!("Dune")), ("year", json!(1965))]),
            )
            .await
            .unwrap();

        store
            .update(&books, &id, doc(&[("year", json!(1966))]))
            .await
            .unwrap();
        let fetched = store.get(&books, &id).await.unwrap().unwrap();
        assert_eq!(fetched.get("title"), Some(&json!("Dune")));
        assert_eq!(fetched.get("year"), Some(&json!(1966)));

        let err = store
            .update(&books, &DocumentId::generate(), Document::new())
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::MissingDocument(_)));
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let store = MemoryDocumentStore::new();
        let books = CollectionRef::root("books");
        let id = store.insert(&books, Document::new()).await.unwrap();

        store.delete(&books, &id).await.unwrap();
        store.delete(&books, &id).await.unwrap();
        assert!(store.get(&books, &id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn query_applies_filters_order_and_limit() {
        let store = MemoryDocumentStore::new();
        let shelves = CollectionRef::root("user_shelves");
        for (user, ts) in [("u1", 3), ("u1", 1), ("u2", 2), ("u1", 2)] {
            store
                .insert(
                    &shelves,
                    doc(&[
                        ("user_id", json!(user)),
                        ("created_at", json!(ts)),
                    ]),
                )
                .await
                .unwrap();
        }

        let results = store
            .query(
                &shelves,
                Query::new()
                    .filter("user_id", json!("u1"))
                    .order_by("created_at", SortDirection::Descending)
                    .limit(2),
            )
            .await
            .unwrap();

        let timestamps: Vec<_> = results
            .iter()
            .map(|stored| stored.fields["created_at"].clone())
            .collect();
        assert_eq!(timestamps, vec![json!(3), json!(2)]);
    }

    #[tokio::test]
    async fn subcollections_are_independent() {
        let store = MemoryDocumentStore::new();
        let books = CollectionRef::root("books");
        let book = store.insert(&books, Document::new()).await.unwrap();
        let reviews = books.child(book.0, "reviews");

        store
            .insert(&reviews, doc(&[("rating", json!(5))]))
            .await
            .unwrap();

        assert_eq!(store.query(&books, Query::new()).await.unwrap().len(), 1);
        assert_eq!(
            store.query(&reviews, Query::new()).await.unwrap().len(),
            1
        );
    }

    #[test]
    fn server_time_is_strictly_monotonic() {
        let store = MemoryDocumentStore::new();
        let a = store.server_time();
        let b = store.server_time();
        let c = store.server_time();
        assert!(a < b && b < c);
    }

    #[test]
    fn value_comparison_orders_numbers_and_strings() {
        assert_eq!(
            compare_values(&json!(1), &json!(2)),
            CmpOrdering::Less
        );
        assert_eq!(
            compare_values(&json!("a"), &json!("b")),
            CmpOrdering::Less
        );
        assert_eq!(
            compare_values(&Value::Null, &json!(0)),
            CmpOrdering::Less
        );
    }
}
