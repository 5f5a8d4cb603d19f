use chrono::{DateTime, Utc};

use crate::ids::{BookID, ReviewID, ReviewIndexEntryID, UserID};

/// A review, owned by and nested under a book.
///
/// The author's display name is a snapshot taken at write time; it is not
/// kept in sync with later profile changes.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Review {
    pub id: ReviewID,
    /// Integer rating, validated to 1..=5 before any write.
    pub rating: u8,
    pub comment: String,
    pub user_id: UserID,
    pub user_name: String,
    #[cfg_attr(
        feature = "serde",
        serde(with = "chrono::serde::ts_milliseconds")
    )]
    pub created_at: DateTime<Utc>,
}

/// Derived index record mirroring a [`Review`], stored in its own root
/// collection so "all reviews by user U" never scans every book's
/// subcollection.
///
/// Must stay 1:1 with its source review: created together, deleted together,
/// repaired by the reconciliation sweep when a partial failure leaves one
/// side behind.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ReviewIndexEntry {
    pub id: ReviewIndexEntryID,
    /// Back-reference to the source review under `book_id`.
    pub review_id: ReviewID,
    pub book_id: BookID,
    pub user_id: UserID,
    pub rating: u8,
    pub comment: String,
    #[cfg_attr(
        feature = "serde",
        serde(with = "chrono::serde::ts_milliseconds")
    )]
    pub created_at: DateTime<Utc>,
}

/// A review index entry joined with the title of the book it refers to.
#[derive(Debug, Clone, PartialEq)]
pub struct UserReview {
    pub entry: ReviewIndexEntry,
    pub book_title: String,
}
