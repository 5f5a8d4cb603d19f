//! The denormalized read-model synchronizer.
//!
//! One service, three internal layers split across submodules:
//! [`queries`] composes primitive store calls into the logical reads the UI
//! needs, [`writes`] sequences every multi-record write with an explicit
//! partial-failure story, and [`reconcile`] restores the cross-collection
//! invariants those stories are allowed to bend.

mod queries;
mod reconcile;
mod writes;

pub use reconcile::SweepReport;

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{CatalogError, Result};
use crate::identity::Caller;
use crate::metrics::ConsistencyMetrics;
use crate::store::{Document, DocumentId, DocumentStore};

/// Collection layout. Reviews live in a subcollection under their book;
/// the two derived indexes are root collections so they can be queried by
/// user without touching the books tree.
pub(crate) mod collections {
    use shelfmark_model::BookID;

    use crate::store::CollectionRef;

    pub fn books() -> CollectionRef {
        CollectionRef::root("books")
    }

    pub fn reviews(book: &BookID) -> CollectionRef {
        books().child(book.to_uuid(), "reviews")
    }

    pub fn user_shelves() -> CollectionRef {
        CollectionRef::root("user_shelves")
    }

    pub fn user_reviews() -> CollectionRef {
        CollectionRef::root("user_reviews")
    }

    pub fn users() -> CollectionRef {
        CollectionRef::root("users")
    }
}

/// Data-access service for the catalog and its derived read models.
///
/// Holds only an injected store handle and a metrics handle; construct one
/// per backing store. All operations are async and impose no timeout or
/// retry policy of their own.
#[derive(Clone)]
pub struct CatalogService {
    store: Arc<dyn DocumentStore>,
    metrics: Arc<ConsistencyMetrics>,
}

impl CatalogService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self::with_metrics(store, Arc::new(ConsistencyMetrics::default()))
    }

    /// Construct with a caller-owned metrics handle, e.g. one shared with a
    /// monitoring endpoint.
    pub fn with_metrics(
        store: Arc<dyn DocumentStore>,
        metrics: Arc<ConsistencyMetrics>,
    ) -> Self {
        Self { store, metrics }
    }

    /// Handle to the inconsistency counters this service increments.
    pub fn metrics(&self) -> Arc<ConsistencyMetrics> {
        Arc::clone(&self.metrics)
    }

    pub(crate) fn store(&self) -> &dyn DocumentStore {
        self.store.as_ref()
    }

    pub(crate) fn require_caller<'a>(
        caller: Option<&'a Caller>,
    ) -> Result<&'a Caller> {
        caller.ok_or(CatalogError::Unauthenticated)
    }
}

impl fmt::Debug for CatalogService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CatalogService")
            .field("metrics", &self.metrics)
            .finish_non_exhaustive()
    }
}

/// Serialize a record into document fields. Ids are document keys, never
/// fields, so any `id` the record carries is stripped.
pub(crate) fn to_fields<T: Serialize>(record: &T) -> Result<Document> {
    match serde_json::to_value(record)? {
        Value::Object(mut fields) => {
            fields.remove("id");
            Ok(fields)
        }
        other => Err(CatalogError::Validation(format!(
            "record serialized to non-object value: {other}"
        ))),
    }
}

/// Decode document fields into a record, reattaching the document id.
pub(crate) fn from_fields<T: DeserializeOwned>(
    id: &DocumentId,
    mut fields: Document,
) -> Result<T> {
    fields.insert("id".to_owned(), Value::String(id.0.to_string()));
    Ok(serde_json::from_value(Value::Object(fields))?)
}
