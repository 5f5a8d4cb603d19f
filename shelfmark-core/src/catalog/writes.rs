//! Write coordination: every write touching more than one record set is a
//! fixed ordered sequence of primitive store calls with an explicit
//! partial-failure story. Nothing here retries automatically - `add_review`
//! in particular would duplicate both records if replayed blindly, so
//! retries are the caller's deliberate choice.

use serde_json::{json, to_value};
use shelfmark_model::{
    Book, BookDraft, BookID, Review, ReviewID, ReviewIndexEntry,
    ReviewIndexEntryID, ShelfEntry, ShelfEntryID, ShelfStatus, UserID,
};
use tracing::{debug, warn};

use super::{CatalogService, collections, to_fields};
use crate::error::{CatalogError, Result};
use crate::identity::Caller;
use crate::store::{Document, DocumentId, Query};

impl CatalogService {
    /// Create a review under `book_id` and its matching index entry.
    ///
    /// Ordering: the subcollection review is written first and is the
    /// source of truth; the index entry follows. If the index write fails
    /// the call still succeeds - the review is durable and the sweep will
    /// backfill the entry - so the index lags for a bounded window instead
    /// of losing the review.
    pub async fn add_review(
        &self,
        caller: Option<&Caller>,
        book_id: &BookID,
        rating: u8,
        comment: &str,
    ) -> Result<ReviewID> {
        let caller = Self::require_caller(caller)?;
        if !(1..=5).contains(&rating) {
            return Err(CatalogError::Validation(format!(
                "rating must be between 1 and 5, got {rating}"
            )));
        }

        let now = self.store().server_time();
        let review = Review {
            id: ReviewID::new(),
            rating,
            comment: comment.to_owned(),
            user_id: caller.user_id,
            user_name: caller.display_name.clone(),
            created_at: now,
        };
        let doc_id = self
            .store()
            .insert(&collections::reviews(book_id), to_fields(&review)?)
            .await?;
        let review_id = ReviewID::from(doc_id.0);
        debug!(book = %book_id, review = %review_id, "review written");

        let entry = ReviewIndexEntry {
            id: ReviewIndexEntryID::new(),
            review_id,
            book_id: *book_id,
            user_id: caller.user_id,
            rating,
            comment: comment.to_owned(),
            created_at: now,
        };
        match self
            .store()
            .insert(&collections::user_reviews(), to_fields(&entry)?)
            .await
        {
            Ok(_) => debug!(review = %review_id, "review index entry written"),
            Err(err) => {
                warn!(
                    review = %review_id,
                    error = %err,
                    "review index write failed; sweep will backfill"
                );
                self.metrics.record_index_write_failure();
            }
        }

        Ok(review_id)
    }

    /// Delete a review and its index entry.
    ///
    /// The subcollection review is the source of truth and is deleted
    /// first, unconditionally. The index is then located by back-reference;
    /// finding zero or multiple entries is an inconsistency observation,
    /// not a failure, and every match found is deleted.
    pub async fn delete_review(
        &self,
        caller: Option<&Caller>,
        book_id: &BookID,
        review_id: &ReviewID,
    ) -> Result<()> {
        Self::require_caller(caller)?;

        self.store()
            .delete(
                &collections::reviews(book_id),
                &DocumentId::from(review_id.to_uuid()),
            )
            .await?;

        let matches = self
            .store()
            .query(
                &collections::user_reviews(),
                Query::new().filter("review_id", to_value(review_id)?),
            )
            .await?;
        if matches.len() != 1 {
            warn!(
                review = %review_id,
                matches = matches.len(),
                "review index lookup did not find exactly one entry"
            );
            self.metrics.record_index_delete_anomaly();
        }
        for entry in matches {
            self.store()
                .delete(&collections::user_reviews(), &entry.id)
                .await?;
        }

        Ok(())
    }

    /// Put a book on the caller's shelf, or change its status if already
    /// shelved.
    ///
    /// Read-then-write: not atomic against a concurrent call for the same
    /// (user, book) pair, which can transiently duplicate entries. The
    /// target concurrency profile (one human, one device, serialized by
    /// the UI) makes that race rare; the sweep collapses any duplicates.
    pub async fn set_shelf_status(
        &self,
        caller: Option<&Caller>,
        book_id: &BookID,
        status: ShelfStatus,
    ) -> Result<()> {
        let caller = Self::require_caller(caller)?;
        let existing = self.find_shelf_entry(&caller.user_id, book_id).await?;
        let now = self.store().server_time();

        match existing {
            None => {
                let entry = ShelfEntry {
                    id: ShelfEntryID::new(),
                    user_id: caller.user_id,
                    book_id: *book_id,
                    status,
                    added_at: now,
                    updated_at: None,
                };
                self.store()
                    .insert(&collections::user_shelves(), to_fields(&entry)?)
                    .await?;
                debug!(user = %caller.user_id, book = %book_id, %status, "shelf entry created");
            }
            Some(doc_id) => {
                self.update_shelf_entry(&doc_id, status, now.timestamp_millis())
                    .await?;
                debug!(user = %caller.user_id, book = %book_id, %status, "shelf entry updated");
            }
        }
        Ok(())
    }

    /// Change the status of an existing shelf entry. Unlike
    /// [`Self::set_shelf_status`] this is deliberately not an upsert:
    /// a book the caller never shelved is `NotFound`.
    pub async fn update_shelf_status(
        &self,
        caller: Option<&Caller>,
        book_id: &BookID,
        status: ShelfStatus,
    ) -> Result<()> {
        let caller = Self::require_caller(caller)?;
        let doc_id = self
            .find_shelf_entry(&caller.user_id, book_id)
            .await?
            .ok_or_else(|| {
                CatalogError::NotFound(format!(
                    "shelf entry for book {book_id}"
                ))
            })?;
        let now = self.store().server_time();
        self.update_shelf_entry(&doc_id, status, now.timestamp_millis())
            .await?;
        Ok(())
    }

    /// Add a catalog entry. Admin surface; timestamps come from the store
    /// clock.
    pub async fn add_book(
        &self,
        caller: Option<&Caller>,
        draft: &BookDraft,
    ) -> Result<BookID> {
        Self::require_caller(caller)?;
        validate_draft(draft)?;

        let now = self.store().server_time();
        let book = Book {
            id: BookID::new(),
            title: draft.title.clone(),
            author: draft.author.clone(),
            genre: draft.genre.clone(),
            description: draft.description.clone(),
            publish_year: draft.publish_year,
            cover_url: draft.cover_url.clone(),
            created_at: now,
            updated_at: now,
        };
        let doc_id = self
            .store()
            .insert(&collections::books(), to_fields(&book)?)
            .await?;
        Ok(BookID::from(doc_id.0))
    }

    /// Replace a catalog entry's editable fields, refreshing `updated_at`.
    pub async fn update_book(
        &self,
        caller: Option<&Caller>,
        book_id: &BookID,
        draft: &BookDraft,
    ) -> Result<()> {
        Self::require_caller(caller)?;
        validate_draft(draft)?;

        let doc_id = DocumentId::from(book_id.to_uuid());
        let existing = self.store().get(&collections::books(), &doc_id).await?;
        if existing.is_none() {
            return Err(CatalogError::NotFound(format!("book {book_id}")));
        }

        let mut fields = to_fields(draft)?;
        fields.insert(
            "updated_at".to_owned(),
            json!(self.store().server_time().timestamp_millis()),
        );
        self.store()
            .update(&collections::books(), &doc_id, fields)
            .await?;
        Ok(())
    }

    /// Remove a catalog entry. Reviews and shelf entries referencing it are
    /// not cascaded, matching the store's lack of cross-collection deletes;
    /// joins drop them and the sweep clears their index records.
    pub async fn delete_book(
        &self,
        caller: Option<&Caller>,
        book_id: &BookID,
    ) -> Result<()> {
        Self::require_caller(caller)?;
        self.store()
            .delete(
                &collections::books(),
                &DocumentId::from(book_id.to_uuid()),
            )
            .await?;
        Ok(())
    }

    /// First shelf entry for the (user, book) pair, if any. Duplicates
    /// beyond the first are left for the sweep.
    async fn find_shelf_entry(
        &self,
        user_id: &UserID,
        book_id: &BookID,
    ) -> Result<Option<DocumentId>> {
        let matches = self
            .store()
            .query(
                &collections::user_shelves(),
                Query::new()
                    .filter("user_id", to_value(user_id)?)
                    .filter("book_id", to_value(book_id)?)
                    .limit(1),
            )
            .await?;
        Ok(matches.first().map(|stored| stored.id))
    }

    async fn update_shelf_entry(
        &self,
        doc_id: &DocumentId,
        status: ShelfStatus,
        updated_at_ms: i64,
    ) -> Result<()> {
        let mut fields = Document::new();
        fields.insert("status".to_owned(), to_value(status)?);
        fields.insert("updated_at".to_owned(), json!(updated_at_ms));
        self.store()
            .update(&collections::user_shelves(), doc_id, fields)
            .await?;
        Ok(())
    }
}

fn validate_draft(draft: &BookDraft) -> Result<()> {
    if draft.title.trim().is_empty() {
        return Err(CatalogError::Validation(
            "book title must not be empty".to_owned(),
        ));
    }
    if draft.author.trim().is_empty() {
        return Err(CatalogError::Validation(
            "book author must not be empty".to_owned(),
        ));
    }
    Ok(())
}
