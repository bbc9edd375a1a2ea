//! User reads. Users are created from the command line, never over HTTP.

use std::sync::Arc;

use thiserror::Error;

use crate::application::repos::{CreateUserParams, RepoError, UsersRepo, UsersWriteRepo};
use crate::domain::entities::UserRecord;

#[derive(Debug, Error)]
pub enum UserError {
    #[error("user not found")]
    NotFound,
    #[error("{field} must not be empty")]
    MissingField { field: &'static str },
    #[error(transparent)]
    Repo(#[from] RepoError),
}

#[derive(Clone)]
pub struct UserService {
    reader: Arc<dyn UsersRepo>,
}

impl UserService {
    pub fn new(reader: Arc<dyn UsersRepo>) -> Self {
        Self { reader }
    }

    pub async fn list(&self) -> Result<Vec<UserRecord>, UserError> {
        Ok(self.reader.list_users().await?)
    }

    pub async fn get(&self, id: i64) -> Result<UserRecord, UserError> {
        self.reader.find_user(id).await?.ok_or(UserError::NotFound)
    }
}

/// Insert a user after trimming and checking the required fields.
pub async fn register_user(
    writer: &dyn UsersWriteRepo,
    params: CreateUserParams,
) -> Result<UserRecord, UserError> {
    let username = params.username.trim().to_string();
    let email = params.email.trim().to_string();
    if username.is_empty() {
        return Err(UserError::MissingField { field: "username" });
    }
    if email.is_empty() {
        return Err(UserError::MissingField { field: "email" });
    }
    let about_me = params
        .about_me
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty());

    Ok(writer
        .create_user(CreateUserParams {
            username,
            email,
            about_me,
        })
        .await?)
}
