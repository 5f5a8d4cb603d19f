use std::str::FromStr;

use chrono::{DateTime, Utc};

use crate::book::Book;
use crate::error::ModelError;
use crate::ids::{BookID, ShelfEntryID, UserID};

/// Reading state of a book on a user's shelf.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ShelfStatus {
    Reading,
    WantToRead,
    Read,
}

impl std::fmt::Display for ShelfStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            ShelfStatus::Reading => "reading",
            ShelfStatus::WantToRead => "want_to_read",
            ShelfStatus::Read => "read",
        };
        write!(f, "{label}")
    }
}

impl FromStr for ShelfStatus {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "reading" => Ok(ShelfStatus::Reading),
            "want_to_read" => Ok(ShelfStatus::WantToRead),
            "read" => Ok(ShelfStatus::Read),
            other => Err(ModelError::InvalidStatus(other.to_owned())),
        }
    }
}

/// Derived index record: one user's reading state for one book.
///
/// The (user, book) pair is a logical key. The store does not enforce its
/// uniqueness; the write coordinator does, modulo a tolerated race collapsed
/// by the reconciliation sweep.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ShelfEntry {
    pub id: ShelfEntryID,
    pub user_id: UserID,
    pub book_id: BookID,
    pub status: ShelfStatus,
    #[cfg_attr(
        feature = "serde",
        serde(with = "chrono::serde::ts_milliseconds")
    )]
    pub added_at: DateTime<Utc>,
    /// Set on every status update, absent on freshly created entries.
    #[cfg_attr(
        feature = "serde",
        serde(default, with = "chrono::serde::ts_milliseconds_option")
    )]
    pub updated_at: Option<DateTime<Utc>>,
}

impl ShelfEntry {
    /// Most recent write to this entry. Duplicate collapse keeps the entry
    /// with the latest value.
    pub fn last_touched(&self) -> DateTime<Utc> {
        self.updated_at.unwrap_or(self.added_at)
    }
}

/// A shelf entry joined with the book it refers to.
#[derive(Debug, Clone, PartialEq)]
pub struct ShelfItem {
    pub book: Book,
    pub status: ShelfStatus,
    pub added_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips_through_display() {
        for status in [
            ShelfStatus::Reading,
            ShelfStatus::WantToRead,
            ShelfStatus::Read,
        ] {
            let parsed: ShelfStatus =
                status.to_string().parse().expect("round trip");
            assert_eq!(parsed, status);
        }
    }

    #[test]
    fn unknown_status_is_rejected() {
        assert!("abandoned".parse::<ShelfStatus>().is_err());
    }

    #[test]
    fn last_touched_prefers_updated_at() {
        let added = Utc::now();
        let updated = added + chrono::Duration::seconds(5);
        let mut entry = ShelfEntry {
            id: ShelfEntryID::new(),
            user_id: UserID::new(),
            book_id: BookID::new(),
            status: ShelfStatus::Reading,
            added_at: added,
            updated_at: None,
        };
        assert_eq!(entry.last_touched(), added);
        entry.updated_at = Some(updated);
        assert_eq!(entry.last_touched(), updated);
    }
}
