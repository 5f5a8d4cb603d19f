//! Consistency-aware data access for a book catalog stored in a document
//! database that offers no joins and no multi-document transactions.
//!
//! The catalog spans four physically independent record sets: canonical
//! books, per-book review subcollections, and two derived indexes
//! (user shelves and user reviews) that exist only to answer query patterns
//! the store cannot. [`catalog::CatalogService`] keeps them in step:
//!
//! - the query side composes primitive store calls and joins client-side,
//!   degrading gracefully when an index entry outlives its source record;
//! - the write side orders multi-record writes explicitly and accepts
//!   bounded inconsistency windows instead of pretending the store is
//!   transactional;
//! - an idempotent reconciliation sweep repairs whatever those windows
//!   leave behind.
//!
//! The backing store is reached only through the [`store::DocumentStore`]
//! capability trait; [`store::MemoryDocumentStore`] implements it in memory
//! for tests and demos.

pub mod catalog;
pub mod error;
pub mod identity;
pub mod metrics;
pub mod store;

pub use catalog::{CatalogService, SweepReport};
pub use error::{CatalogError, Result};
pub use identity::Caller;
pub use metrics::ConsistencyMetrics;
pub use store::{
    CollectionRef, Document, DocumentId, DocumentStore, FieldFilter,
    MemoryDocumentStore, Query, SortDirection, StoreError, StoreResult,
    StoredDocument,
};
