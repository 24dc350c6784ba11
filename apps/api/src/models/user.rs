use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Account is usable.
pub const STATUS_ACTIVE: i16 = 1;
/// Account is disabled; login is refused.
pub const STATUS_DISABLED: i16 = 0;

#[derive(Debug, Clone, FromRow)]
pub struct UserRow {
    pub user_id: i64,
    pub username: String,
    pub password_hash: String,
    pub province: String,
    pub school_name: String,
    pub status: i16,
    pub created_at: DateTime<Utc>,
}

/// Public view of a user; also the profile carried inside issued tokens.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub user_id: i64,
    pub username: String,
    pub province: String,
    pub school_name: String,
}

impl From<&UserRow> for UserProfile {
    fn from(row: &UserRow) -> Self {
        Self {
            user_id: row.user_id,
            username: row.username.clone(),
            province: row.province.clone(),
            school_name: row.school_name.clone(),
        }
    }
}
