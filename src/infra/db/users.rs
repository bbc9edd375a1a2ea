use async_trait::async_trait;
use time::OffsetDateTime;

use crate::application::repos::{CreateUserParams, RepoError, UsersRepo, UsersWriteRepo};
use crate::domain::entities::UserRecord;

use super::PostgresRepositories;
use super::map_sqlx_error;
use super::util::convert_count;

const USER_COLUMNS: &str = "id, username, email, about_me, last_seen";

#[derive(sqlx::FromRow)]
struct UserRow {
    id: i64,
    username: String,
    email: String,
    about_me: Option<String>,
    last_seen: Option<OffsetDateTime>,
}

impl From<UserRow> for UserRecord {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            username: row.username,
            email: row.email,
            about_me: row.about_me,
            last_seen: row.last_seen,
        }
    }
}

#[async_trait]
impl UsersRepo for PostgresRepositories {
    async fn list_users(&self) -> Result<Vec<UserRecord>, RepoError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users ORDER BY id");
        let rows: Vec<UserRow> = sqlx::query_as(&sql)
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(UserRecord::from).collect())
    }

    async fn find_user(&self, id: i64) -> Result<Option<UserRecord>, RepoError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        let row: Option<UserRow> = sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(row.map(UserRecord::from))
    }

    async fn count_users(&self) -> Result<u64, RepoError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        convert_count(count)
    }
}

#[async_trait]
impl UsersWriteRepo for PostgresRepositories {
    async fn create_user(&self, params: CreateUserParams) -> Result<UserRecord, RepoError> {
        let CreateUserParams {
            username,
            email,
            about_me,
        } = params;

        let sql = format!(
            "INSERT INTO users (username, email, about_me) VALUES ($1, $2, $3) \
             RETURNING {USER_COLUMNS}"
        );
        let row: UserRow = sqlx::query_as(&sql)
            .bind(username)
            .bind(email)
            .bind(about_me)
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(UserRecord::from(row))
    }
}
