use async_trait::async_trait;

use crate::application::repos::{CreatePostParams, PostsWriteRepo, RepoError, UpdatePostParams};
use crate::domain::entities::PostRecord;

use super::PostgresRepositories;
use super::types::PostRow;
use crate::infra::db::map_sqlx_error;

#[async_trait]
impl PostsWriteRepo for PostgresRepositories {
    async fn create_post(&self, params: CreatePostParams) -> Result<PostRecord, RepoError> {
        let CreatePostParams { body, user_id } = params;

        let sql = format!(
            "INSERT INTO posts (body, user_id) VALUES ($1, $2) RETURNING {}",
            Self::post_columns()
        );
        let row: PostRow = sqlx::query_as(&sql)
            .bind(body)
            .bind(user_id)
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(PostRecord::from(row))
    }

    async fn update_post(&self, params: UpdatePostParams) -> Result<PostRecord, RepoError> {
        let UpdatePostParams { id, body } = params;

        let sql = format!(
            "UPDATE posts SET body = COALESCE($2, body) WHERE id = $1 RETURNING {}",
            Self::post_columns()
        );
        let row: Option<PostRow> = sqlx::query_as(&sql)
            .bind(id)
            .bind(body)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        row.map(PostRecord::from).ok_or(RepoError::NotFound)
    }

    async fn delete_post(&self, id: i64) -> Result<(), RepoError> {
        let result = sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }
}
