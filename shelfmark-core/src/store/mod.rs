//! Store capability contract.
//!
//! Everything the synchronizer requires of its backing document store, and
//! nothing more: create with a generated id, point get, merge-update,
//! delete, and collection queries limited to field-equality filters, a
//! single ordering field, and a result limit. No transactions, no joins,
//! no full-text search. Backends that cannot meet even this contract are
//! out of scope; backends that offer more (conditional writes, real
//! indexes) are free to use it internally.
//!
//! Faults come back as the closed [`StoreError`] enum so the layers above
//! never sniff backend-specific error shapes.

mod memory;

pub use memory::MemoryDocumentStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

/// Faults a store adapter may surface.
#[derive(Error, Debug)]
pub enum StoreError {
    /// An update addressed a document that does not exist.
    #[error("document {0} does not exist")]
    MissingDocument(String),

    /// The backend could not be reached or failed the call.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Opaque, store-assigned document identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DocumentId(pub Uuid);

impl DocumentId {
    /// Mint a fresh id. Time-ordered so scans come back in insertion order.
    pub fn generate() -> Self {
        DocumentId(Uuid::now_v7())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl From<Uuid> for DocumentId {
    fn from(id: Uuid) -> Self {
        DocumentId(id)
    }
}

impl std::fmt::Display for DocumentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Path to a collection: a root collection, or a subcollection nested under
/// a specific document (`books/{id}/reviews`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CollectionRef {
    segments: Vec<String>,
}

impl CollectionRef {
    pub fn root(name: impl Into<String>) -> Self {
        Self {
            segments: vec![name.into()],
        }
    }

    /// Subcollection under `document` within this collection.
    pub fn child(&self, document: Uuid, name: impl Into<String>) -> Self {
        let mut segments = self.segments.clone();
        segments.push(document.to_string());
        segments.push(name.into());
        Self { segments }
    }
}

impl std::fmt::Display for CollectionRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.segments.join("/"))
    }
}

/// Schemaless document body. Ids are keys, never fields.
pub type Document = serde_json::Map<String, Value>;

/// Field-equality predicate.
#[derive(Debug, Clone)]
pub struct FieldFilter {
    pub field: String,
    pub equals: Value,
}

/// Sort order for a queried field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

/// Query against one collection. All filters are conjunctive equality
/// predicates; compound or disjunctive predicates are composed client-side
/// by the layer above.
#[derive(Debug, Clone, Default)]
pub struct Query {
    pub filters: Vec<FieldFilter>,
    pub order_by: Option<(String, SortDirection)>,
    pub limit: Option<usize>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(mut self, field: impl Into<String>, equals: Value) -> Self {
        self.filters.push(FieldFilter {
            field: field.into(),
            equals,
        });
        self
    }

    pub fn order_by(
        mut self,
        field: impl Into<String>,
        direction: SortDirection,
    ) -> Self {
        self.order_by = Some((field.into(), direction));
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// A document paired with its id, as returned from queries.
#[derive(Debug, Clone)]
pub struct StoredDocument {
    pub id: DocumentId,
    pub fields: Document,
}

/// The document-store port.
///
/// Calls against different collections are not ordered with respect to one
/// another by the store; the write coordinator imposes ordering only by
/// sequencing its own calls. Implementations must not retry internally -
/// retry policy belongs to callers who can reason about idempotence.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Create a document with a store-assigned id.
    async fn insert(
        &self,
        collection: &CollectionRef,
        fields: Document,
    ) -> StoreResult<DocumentId>;

    /// Point lookup. `Ok(None)` for a missing document; errors are reserved
    /// for backend faults.
    async fn get(
        &self,
        collection: &CollectionRef,
        id: &DocumentId,
    ) -> StoreResult<Option<Document>>;

    /// Merge `fields` into an existing document, leaving unnamed fields
    /// untouched. Fails with [`StoreError::MissingDocument`] if the
    /// document does not exist.
    async fn update(
        &self,
        collection: &CollectionRef,
        id: &DocumentId,
        fields: Document,
    ) -> StoreResult<()>;

    /// Delete a document. Idempotent: deleting a missing document succeeds.
    async fn delete(
        &self,
        collection: &CollectionRef,
        id: &DocumentId,
    ) -> StoreResult<()>;

    /// Scan a collection, applying equality filters, optional single-field
    /// ordering, and an optional result limit.
    async fn query(
        &self,
        collection: &CollectionRef,
        query: Query,
    ) -> StoreResult<Vec<StoredDocument>>;

    /// Server-assigned timestamp source used to stamp writes.
    fn server_time(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
