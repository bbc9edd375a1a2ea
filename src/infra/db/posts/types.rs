use time::OffsetDateTime;

use crate::domain::entities::PostRecord;

#[derive(sqlx::FromRow)]
pub(crate) struct PostRow {
    pub(crate) id: i64,
    pub(crate) body: String,
    pub(crate) user_id: i64,
    pub(crate) timestamp: OffsetDateTime,
}

impl From<PostRow> for PostRecord {
    fn from(row: PostRow) -> Self {
        Self {
            id: row.id,
            body: row.body,
            user_id: row.user_id,
            timestamp: row.timestamp,
        }
    }
}
