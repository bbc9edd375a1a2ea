mod read;
mod types;
mod write;

use super::PostgresRepositories;

const POST_COLUMNS: &str = "id, body, user_id, timestamp";

impl PostgresRepositories {
    pub(super) fn post_columns() -> &'static str {
        POST_COLUMNS
    }
}
