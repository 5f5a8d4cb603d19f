//! Core data model definitions shared across Shelfmark crates.
#![allow(missing_docs)]

pub mod book;
pub mod error;
pub mod ids;
pub mod prelude;
pub mod review;
pub mod shelf;
pub mod user;

// Intentionally curated re-exports for downstream consumers.
pub use book::{Book, BookDraft};
pub use error::{ModelError, Result as ModelResult};
pub use ids::{BookID, ReviewID, ReviewIndexEntryID, ShelfEntryID, UserID};
pub use review::{Review, ReviewIndexEntry, UserReview};
pub use shelf::{ShelfEntry, ShelfItem, ShelfStatus};
pub use user::UserAccount;
