use async_trait::async_trait;

use crate::application::pagination::{OffsetPage, PageRequest};
use crate::application::repos::{PostsRepo, RepoError};
use crate::domain::entities::PostRecord;

use super::PostgresRepositories;
use super::types::PostRow;
use crate::infra::db::map_sqlx_error;
use crate::infra::db::util::convert_count;

#[async_trait]
impl PostsRepo for PostgresRepositories {
    async fn list_posts(&self, page: PageRequest) -> Result<OffsetPage<PostRecord>, RepoError> {
        let total = self.count_posts().await?;

        let sql = format!(
            "SELECT {} FROM posts ORDER BY timestamp DESC, id DESC LIMIT $1 OFFSET $2",
            Self::post_columns()
        );
        let limit = i64::try_from(page.limit()).unwrap_or(i64::MAX);
        let offset = i64::try_from(page.offset()).unwrap_or(i64::MAX);
        let rows: Vec<PostRow> = sqlx::query_as(&sql)
            .bind(limit)
            .bind(offset)
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        let items = rows.into_iter().map(PostRecord::from).collect();
        Ok(OffsetPage::new(items, total, page))
    }

    async fn find_post(&self, id: i64) -> Result<Option<PostRecord>, RepoError> {
        let sql = format!("SELECT {} FROM posts WHERE id = $1", Self::post_columns());
        let row: Option<PostRow> = sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(row.map(PostRecord::from))
    }

    async fn count_posts(&self) -> Result<u64, RepoError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM posts")
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        convert_count(count)
    }
}
