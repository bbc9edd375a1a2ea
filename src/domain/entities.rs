//! Domain entities mirrored from persistent storage.

use serde::Serialize;
use time::OffsetDateTime;

/// A blog post as stored, serialized as `{id, body, user_id, timestamp}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PostRecord {
    pub id: i64,
    pub body: String,
    pub user_id: i64,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserRecord {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub about_me: Option<String>,
    #[serde(with = "time::serde::rfc3339::option")]
    pub last_seen: Option<OffsetDateTime>,
}
