use thiserror::Error;

use crate::store::StoreError;

/// Errors surfaced by the catalog data layer.
///
/// `Validation` and `Unauthenticated` are checked before any store call, so
/// a failed precondition never leaves partial state. Store faults always
/// propagate; this layer never retries or masks a backend outage.
/// Inconsistency observations are deliberately *not* errors - they go
/// through [`crate::metrics::ConsistencyMetrics`] instead.
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("caller is not authenticated")]
    Unauthenticated,

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, CatalogError>;
