//! Business logic sitting between the HTTP handlers and the repositories.

use thiserror::Error;

use crate::domain::types::TypeConstraintError;
use crate::repository::errors::RepositoryError;

pub mod bot_detection;
pub mod campaigns;
pub mod notifications;
pub mod tools;
pub mod tracking;
pub mod uploads;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("not found")]
    NotFound,

    /// Invalid user input; the message is safe to show to the caller.
    #[error("{0}")]
    Form(String),

    /// Operation is not allowed in the current state of the entity.
    #[error("{0}")]
    Conflict(String),

    #[error("repository error: {0}")]
    Repository(RepositoryError),

    #[error("type constraint violated: {0}")]
    TypeConstraint(String),

    #[error("analysis failed: {0}")]
    Analysis(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<RepositoryError> for ServiceError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound => ServiceError::NotFound,
            other => ServiceError::Repository(other),
        }
    }
}

impl From<TypeConstraintError> for ServiceError {
    fn from(err: TypeConstraintError) -> Self {
        ServiceError::TypeConstraint(err.to_string())
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;
