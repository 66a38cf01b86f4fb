//! Request bodies accepted by the HTTP routes.

use thiserror::Error;
use validator::ValidationErrors;

pub mod api;
pub mod campaigns;

#[derive(Debug, Error)]
/// Errors that can occur when processing form data.
pub enum FormError {
    #[error("validation errors: {0}")]
    Validation(#[from] ValidationErrors),

    #[error("invalid email address")]
    InvalidEmail,

    #[error("invalid url")]
    InvalidUrl,

    #[error("invalid name")]
    InvalidName,

    #[error("invalid subject")]
    InvalidSubject,

    #[error("missing required column: {0}")]
    MissingColumn(&'static str),

    #[error("row {row}: invalid email address {email:?}")]
    InvalidRow { row: u64, email: String },

    #[error("invalid JSON body: {0}")]
    Json(#[from] serde_json::Error),

    #[error("request body must be a JSON object")]
    NotAnObject,

    #[error("invalid form body: {0}")]
    Encoded(String),

    #[error("failed to read CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("failed to read upload: {0}")]
    Io(#[from] std::io::Error),
}
