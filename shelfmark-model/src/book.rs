use chrono::{DateTime, Utc};

use crate::ids::BookID;

/// Canonical catalog record. Owned by the catalog, mutated only through
/// administrative operations, never deleted implicitly.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Book {
    pub id: BookID,
    pub title: String,
    pub author: String,
    pub genre: String,
    pub description: String,
    pub publish_year: i32,
    #[cfg_attr(feature = "serde", serde(default))]
    pub cover_url: Option<String>,
    #[cfg_attr(
        feature = "serde",
        serde(with = "chrono::serde::ts_milliseconds")
    )]
    pub created_at: DateTime<Utc>,
    #[cfg_attr(
        feature = "serde",
        serde(with = "chrono::serde::ts_milliseconds")
    )]
    pub updated_at: DateTime<Utc>,
}

impl Book {
    /// Case-insensitive substring match across title, author, and genre.
    ///
    /// `needle` must already be lowercased; callers lowercase once per search
    /// rather than once per book.
    pub fn matches_search(&self, needle: &str) -> bool {
        self.title.to_lowercase().contains(needle)
            || self.author.to_lowercase().contains(needle)
            || self.genre.to_lowercase().contains(needle)
    }
}

/// Fields supplied when creating or editing a catalog entry. Timestamps are
/// assigned by the data layer from the store clock.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BookDraft {
    pub title: String,
    pub author: String,
    pub genre: String,
    pub description: String,
    pub publish_year: i32,
    #[cfg_attr(feature = "serde", serde(default))]
    pub cover_url: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn book(title: &str, author: &str, genre: &str) -> Book {
        Book {
            id: BookID::new(),
            title: title.to_owned(),
            author: author.to_owned(),
            genre: genre.to_owned(),
            description: String::new(),
            publish_year: 1965,
            cover_url: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn search_matches_any_field_case_insensitively() {
        let b = book("Dune", "Frank Herbert", "Science Fiction");
        assert!(b.matches_search("dun"));
        assert!(b.matches_search("herbert"));
        assert!(b.matches_search("science"));
        assert!(!b.matches_search("fantasy"));
    }

    #[test]
    fn search_does_not_match_description() {
        let mut b = book("Foo", "Bar", "Baz");
        b.description = "dune-adjacent".to_owned();
        assert!(!b.matches_search("dune"));
    }
}
