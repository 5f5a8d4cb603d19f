//! Query composition: logical reads expressed as primitive store calls
//! plus client-side post-filtering and joins.

use futures::future;
use serde_json::to_value;
use shelfmark_model::{
    Book, BookID, Review, ReviewIndexEntry, ShelfEntry, ShelfItem,
    UserAccount, UserID, UserReview,
};
use tracing::warn;

use super::{CatalogService, collections, from_fields};
use crate::error::{CatalogError, Result};
use crate::store::{DocumentId, Query, SortDirection};

impl CatalogService {
    /// Every book in the catalog. Full scan, unordered.
    pub async fn list_books(&self) -> Result<Vec<Book>> {
        let stored = self
            .store()
            .query(&collections::books(), Query::new())
            .await?;
        stored
            .into_iter()
            .map(|doc| from_fields(&doc.id, doc.fields))
            .collect()
    }

    /// Point lookup by id.
    pub async fn find_book(&self, id: &BookID) -> Result<Book> {
        let doc_id = DocumentId::from(id.to_uuid());
        match self.store().get(&collections::books(), &doc_id).await? {
            Some(fields) => from_fields(&doc_id, fields),
            None => Err(CatalogError::NotFound(format!("book {id}"))),
        }
    }

    /// Case-insensitive substring search across title, author, and genre.
    ///
    /// The store has no full-text or OR-predicate capability, so this is a
    /// full scan filtered client-side: O(total books) per call. Acceptable
    /// only while the catalog fits comfortably in memory; a real search
    /// index is the upgrade path beyond that.
    pub async fn search_books(&self, term: &str) -> Result<Vec<Book>> {
        let needle = term.to_lowercase();
        let books = self.list_books().await?;
        Ok(books
            .into_iter()
            .filter(|book| book.matches_search(&needle))
            .collect())
    }

    /// All shelf entries for a user, joined with their books.
    ///
    /// Entries whose book no longer exists are dropped from the result
    /// rather than failing the call; each drop is logged and counted as an
    /// inconsistency observation.
    pub async fn shelf_for_user(
        &self,
        user_id: &UserID,
    ) -> Result<Vec<ShelfItem>> {
        let entries = self
            .store()
            .query(
                &collections::user_shelves(),
                Query::new().filter("user_id", to_value(user_id)?),
            )
            .await?;

        let resolved =
            future::try_join_all(entries.into_iter().map(|stored| async move {
                let entry: ShelfEntry =
                    from_fields(&stored.id, stored.fields)?;
                self.resolve_shelf_entry(entry).await
            }))
            .await?;

        Ok(resolved.into_iter().flatten().collect())
    }

    /// All reviews written by a user, newest first, joined with each book's
    /// title. Same drop-on-miss policy as [`Self::shelf_for_user`].
    pub async fn reviews_for_user(
        &self,
        user_id: &UserID,
    ) -> Result<Vec<UserReview>> {
        let entries = self
            .store()
            .query(
                &collections::user_reviews(),
                Query::new()
                    .filter("user_id", to_value(user_id)?)
                    .order_by("created_at", SortDirection::Descending),
            )
            .await?;

        let resolved =
            future::try_join_all(entries.into_iter().map(|stored| async move {
                let entry: ReviewIndexEntry =
                    from_fields(&stored.id, stored.fields)?;
                self.resolve_user_review(entry).await
            }))
            .await?;

        Ok(resolved.into_iter().flatten().collect())
    }

    /// All reviews under one book's subcollection.
    pub async fn reviews_for_book(
        &self,
        book_id: &BookID,
    ) -> Result<Vec<Review>> {
        let stored = self
            .store()
            .query(&collections::reviews(book_id), Query::new())
            .await?;
        stored
            .into_iter()
            .map(|doc| from_fields(&doc.id, doc.fields))
            .collect()
    }

    /// Every provisioned user account. Admin surface only.
    pub async fn list_users(&self) -> Result<Vec<UserAccount>> {
        let stored = self
            .store()
            .query(&collections::users(), Query::new())
            .await?;
        stored
            .into_iter()
            .map(|doc| from_fields(&doc.id, doc.fields))
            .collect()
    }

    async fn resolve_shelf_entry(
        &self,
        entry: ShelfEntry,
    ) -> Result<Option<ShelfItem>> {
        let book_doc = DocumentId::from(entry.book_id.to_uuid());
        match self.store().get(&collections::books(), &book_doc).await? {
            Some(fields) => {
                let book: Book = from_fields(&book_doc, fields)?;
                Ok(Some(ShelfItem {
                    book,
                    status: entry.status,
                    added_at: entry.added_at,
                }))
            }
            None => {
                warn!(
                    user = %entry.user_id,
                    book = %entry.book_id,
                    "dropping shelf entry whose book is gone"
                );
                self.metrics.record_shelf_entry_dropped();
                Ok(None)
            }
        }
    }

    async fn resolve_user_review(
        &self,
        entry: ReviewIndexEntry,
    ) -> Result<Option<UserReview>> {
        let book_doc = DocumentId::from(entry.book_id.to_uuid());
        match self.store().get(&collections::books(), &book_doc).await? {
            Some(fields) => {
                let book: Book = from_fields(&book_doc, fields)?;
                Ok(Some(UserReview {
                    entry,
                    book_title: book.title,
                }))
            }
            None => {
                warn!(
                    user = %entry.user_id,
                    book = %entry.book_id,
                    review = %entry.review_id,
                    "dropping review index entry whose book is gone"
                );
                self.metrics.record_review_entry_dropped();
                Ok(None)
            }
        }
    }
}
