use shelfmark_model::UserID;

/// Caller identity handed in by the auth provider.
///
/// All this layer needs from authentication is a stable user id and a
/// display name to snapshot into reviews. Role checks (admin or otherwise)
/// are the presentation layer's concern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    pub user_id: UserID,
    pub display_name: String,
}

impl Caller {
    pub fn new(user_id: UserID, display_name: impl Into<String>) -> Self {
        Self {
            user_id,
            display_name: display_name.into(),
        }
    }
}
