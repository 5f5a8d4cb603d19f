#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use shelfmark_core::{
    Caller, CatalogService, CollectionRef, Document, DocumentId,
    DocumentStore, MemoryDocumentStore, Query, StoreError, StoreResult,
    StoredDocument,
};
use shelfmark_model::{BookDraft, UserID};
use uuid::Uuid;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn service() -> (CatalogService, Arc<MemoryDocumentStore>) {
    init_tracing();
    let store = Arc::new(MemoryDocumentStore::new());
    (CatalogService::new(store.clone()), store)
}

pub fn admin() -> Caller {
    Caller::new(UserID::from(Uuid::from_u128(1)), "Admin")
}

pub fn alice() -> Caller {
    Caller::new(UserID::from(Uuid::from_u128(2)), "Alice")
}

pub fn bob() -> Caller {
    Caller::new(UserID::from(Uuid::from_u128(3)), "Bob")
}

pub fn draft(title: &str, author: &str, genre: &str) -> BookDraft {
    BookDraft {
        title: title.to_owned(),
        author: author.to_owned(),
        genre: genre.to_owned(),
        description: format!("About {title}."),
        publish_year: 1965,
        cover_url: None,
    }
}

/// Build a document body from a `json!` object literal.
pub fn doc(value: serde_json::Value) -> Document {
    value
        .as_object()
        .expect("test document must be a JSON object")
        .clone()
}

/// Dump a collection for before/after comparisons.
pub async fn snapshot(
    store: &dyn DocumentStore,
    collection: &CollectionRef,
) -> Vec<(DocumentId, Document)> {
    store
        .query(collection, Query::new())
        .await
        .expect("snapshot query")
        .into_iter()
        .map(|stored| (stored.id, stored.fields))
        .collect()
}

/// Delegating store that fails inserts into one chosen collection,
/// simulating a backend fault between the steps of a multi-record write.
#[derive(Debug, Default)]
pub struct FlakyStore {
    inner: MemoryDocumentStore,
    deny_inserts_into: Mutex<Option<CollectionRef>>,
}

impl FlakyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn deny_inserts_into(&self, collection: CollectionRef) {
        *self.deny_inserts_into.lock().expect("flaky store lock") =
            Some(collection);
    }

    pub fn allow_all(&self) {
        *self.deny_inserts_into.lock().expect("flaky store lock") = None;
    }
}

#[async_trait]
impl DocumentStore for FlakyStore {
    async fn insert(
        &self,
        collection: &CollectionRef,
        fields: Document,
    ) -> StoreResult<DocumentId> {
        let denied = self
            .deny_inserts_into
            .lock()
            .expect("flaky store lock")
            .as_ref()
            .is_some_and(|target| target == collection);
        if denied {
            return Err(StoreError::Unavailable(
                "injected fault".to_owned(),
            ));
        }
        self.inner.insert(collection, fields).await
    }

    async fn get(
        &self,
        collection: &CollectionRef,
        id: &DocumentId,
    ) -> StoreResult<Option<Document>> {
        self.inner.get(collection, id).await
    }

    async fn update(
        &self,
        collection: &CollectionRef,
        id: &DocumentId,
        fields: Document,
    ) -> StoreResult<()> {
        self.inner.update(collection, id, fields).await
    }

    async fn delete(
        &self,
        collection: &CollectionRef,
        id: &DocumentId,
    ) -> StoreResult<()> {
        self.inner.delete(collection, id).await
    }

    async fn query(
        &self,
        collection: &CollectionRef,
        query: Query,
    ) -> StoreResult<Vec<StoredDocument>> {
        self.inner.query(collection, query).await
    }

    fn server_time(&self) -> DateTime<Utc> {
        self.inner.server_time()
    }
}
