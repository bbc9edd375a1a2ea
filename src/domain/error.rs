use thiserror::Error;

/// Invariant violations detected before anything is persisted.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("post body must not be blank")]
    BlankPostBody,
}
