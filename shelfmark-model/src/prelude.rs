//! Convenience re-exports for downstream crates.

pub use crate::book::{Book, BookDraft};
pub use crate::error::ModelError;
pub use crate::ids::{
    BookID, ReviewID, ReviewIndexEntryID, ShelfEntryID, UserID,
};
pub use crate::review::{Review, ReviewIndexEntry, UserReview};
pub use crate::shelf::{ShelfEntry, ShelfItem, ShelfStatus};
pub use crate::user::UserAccount;
