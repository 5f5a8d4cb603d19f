use chrono::{DateTime, Utc};

use crate::ids::UserID;

/// Account record provisioned by the auth provider. Read-only to the data
/// layer; listed for the admin surface.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct UserAccount {
    pub id: UserID,
    #[cfg_attr(feature = "serde", serde(default))]
    pub display_name: Option<String>,
    pub email: String,
    #[cfg_attr(
        feature = "serde",
        serde(with = "chrono::serde::ts_milliseconds")
    )]
    pub created_at: DateTime<Utc>,
}
