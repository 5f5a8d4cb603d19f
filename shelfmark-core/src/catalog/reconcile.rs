//! Reconciliation rules: an idempotent, out-of-band sweep that restores the
//! cross-collection invariants after partial-failure windows.
//!
//! Three repairs, in order:
//! 1. index entries whose review or book no longer exists are deleted,
//!    along with any review stranded under a deleted book;
//! 2. reviews with no surviving index entry get one synthesized from their
//!    own fields;
//! 3. duplicate shelf entries per (user, book) collapse to the one touched
//!    most recently.
//!
//! Running the sweep twice with no intervening writes changes nothing the
//! second time.

use std::collections::HashMap;

use shelfmark_model::{
    BookID, Review, ReviewID, ReviewIndexEntry, ReviewIndexEntryID,
    ShelfEntry,
};
use tracing::{info, warn};
use uuid::Uuid;

use super::{CatalogService, collections, from_fields, to_fields};
use crate::error::Result;
use crate::store::{DocumentId, Query};

/// What one reconciliation pass changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Index entries deleted because their review no longer exists.
    pub orphan_index_entries_removed: u64,
    /// Index entries synthesized for reviews that had none.
    pub index_entries_backfilled: u64,
    /// Duplicate shelf entries deleted, keeping the most recent per pair.
    pub duplicate_shelf_entries_removed: u64,
}

impl SweepReport {
    /// True when the sweep found nothing to repair.
    pub fn is_clean(&self) -> bool {
        *self == SweepReport::default()
    }
}

impl CatalogService {
    /// Run one reconciliation sweep over all record sets.
    ///
    /// Out of band from request latency by design: callers schedule it
    /// periodically or after suspected partial failures, never inline with
    /// user-facing writes.
    pub async fn reconcile(&self) -> Result<SweepReport> {
        let mut report = SweepReport::default();

        let live_reviews = self.sweep_orphan_index_entries(&mut report).await?;
        self.sweep_missing_index_entries(&live_reviews, &mut report)
            .await?;
        self.sweep_duplicate_shelf_entries(&mut report).await?;

        info!(
            orphan_index_entries_removed = report.orphan_index_entries_removed,
            index_entries_backfilled = report.index_entries_backfilled,
            duplicate_shelf_entries_removed =
                report.duplicate_shelf_entries_removed,
            "reconciliation sweep finished"
        );
        Ok(report)
    }

    /// Pass 1: resolve every index entry's back-reference; delete the ones
    /// pointing at nothing. An entry whose book was deleted is orphaned
    /// too, even though its review document lingers in the dead book's
    /// subcollection where no listing can reach it; the stranded review is
    /// deleted along with the entry. Returns the review ids that still have
    /// a live index entry, so pass 2 knows what not to backfill.
    async fn sweep_orphan_index_entries(
        &self,
        report: &mut SweepReport,
    ) -> Result<Vec<Uuid>> {
        let mut live = Vec::new();
        let mut book_exists: HashMap<Uuid, bool> = HashMap::new();
        let stored = self
            .store()
            .query(&collections::user_reviews(), Query::new())
            .await?;

        for doc in stored {
            let entry: ReviewIndexEntry = from_fields(&doc.id, doc.fields)?;
            let book = entry.book_id.to_uuid();
            let book_known = match book_exists.get(&book) {
                Some(known) => *known,
                None => {
                    let found = self
                        .store()
                        .get(&collections::books(), &DocumentId::from(book))
                        .await?
                        .is_some();
                    book_exists.insert(book, found);
                    found
                }
            };
            let review_doc =
                DocumentId::from(entry.review_id.to_uuid());

            if !book_known {
                warn!(
                    review = %entry.review_id,
                    book = %entry.book_id,
                    "removing index entry and stranded review of a deleted book"
                );
                self.store()
                    .delete(&collections::reviews(&entry.book_id), &review_doc)
                    .await?;
                self.store()
                    .delete(&collections::user_reviews(), &doc.id)
                    .await?;
                report.orphan_index_entries_removed += 1;
                continue;
            }

            let exists = self
                .store()
                .get(&collections::reviews(&entry.book_id), &review_doc)
                .await?
                .is_some();

            if exists {
                live.push(entry.review_id.to_uuid());
            } else {
                warn!(
                    review = %entry.review_id,
                    book = %entry.book_id,
                    "removing orphan review index entry"
                );
                self.store()
                    .delete(&collections::user_reviews(), &doc.id)
                    .await?;
                report.orphan_index_entries_removed += 1;
            }
        }
        Ok(live)
    }

    /// Pass 2: walk every book's review subcollection and synthesize index
    /// entries for reviews that lost theirs. Only live books are scanned,
    /// so nothing under a deleted book is ever backfilled; pass 1 already
    /// removed stranded reviews that still had an index entry pointing at
    /// them.
    async fn sweep_missing_index_entries(
        &self,
        live_reviews: &[Uuid],
        report: &mut SweepReport,
    ) -> Result<()> {
        let books = self
            .store()
            .query(&collections::books(), Query::new())
            .await?;

        for book in books {
            let book_id = BookID::from(book.id.0);
            let reviews = self
                .store()
                .query(&collections::reviews(&book_id), Query::new())
                .await?;

            for doc in reviews {
                if live_reviews.contains(doc.id.as_uuid()) {
                    continue;
                }
                let review: Review = from_fields(&doc.id, doc.fields)?;
                let entry = ReviewIndexEntry {
                    id: ReviewIndexEntryID::new(),
                    review_id: ReviewID::from(doc.id.0),
                    book_id,
                    user_id: review.user_id,
                    rating: review.rating,
                    comment: review.comment,
                    created_at: review.created_at,
                };
                warn!(
                    review = %entry.review_id,
                    book = %book_id,
                    "backfilling missing review index entry"
                );
                self.store()
                    .insert(&collections::user_reviews(), to_fields(&entry)?)
                    .await?;
                report.index_entries_backfilled += 1;
            }
        }
        Ok(())
    }

    /// Pass 3: group shelf entries by (user, book) and collapse each group
    /// to the entry touched most recently, falling back to the document id
    /// (time-ordered) to break exact ties deterministically.
    async fn sweep_duplicate_shelf_entries(
        &self,
        report: &mut SweepReport,
    ) -> Result<()> {
        let stored = self
            .store()
            .query(&collections::user_shelves(), Query::new())
            .await?;

        let mut grouped: HashMap<(Uuid, Uuid), Vec<(DocumentId, ShelfEntry)>> =
            HashMap::new();
        for doc in stored {
            let entry: ShelfEntry = from_fields(&doc.id, doc.fields)?;
            grouped
                .entry((entry.user_id.to_uuid(), entry.book_id.to_uuid()))
                .or_default()
                .push((doc.id, entry));
        }

        for ((user, book), mut entries) in grouped {
            if entries.len() < 2 {
                continue;
            }
            entries.sort_by_key(|(doc_id, entry)| {
                (entry.last_touched(), *doc_id)
            });
            // Last after the sort is the keeper.
            entries.pop();
            warn!(
                user = %user,
                book = %book,
                duplicates = entries.len(),
                "collapsing duplicate shelf entries"
            );
            for (doc_id, _) in entries {
                self.store()
                    .delete(&collections::user_shelves(), &doc_id)
                    .await?;
                report.duplicate_shelf_entries_removed += 1;
            }
        }
        Ok(())
    }
}
