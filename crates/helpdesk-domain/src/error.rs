use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HelpdeskError {
    #[error("not authenticated; sign in again")]
    Unauthenticated,
    #[error("validation failed: {0}")]
    ValidationFailed(String),
    #[error("sign-in failed: {0}")]
    LoginFailed(String),
    #[error("ticket fetch failed: {0}")]
    FetchFailed(String),
    #[error("ticket creation failed: {0}")]
    CreateFailed(String),
    #[error("ticket update failed: {0}")]
    UpdateFailed(String),
    #[error("comment creation failed: {0}")]
    CommentFailed(String),
    #[error("no ticket with id `{0}`")]
    NotFound(String),
}
