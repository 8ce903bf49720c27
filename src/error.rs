use thiserror::Error;

use crate::fields::ValidationError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Field {field} rejected: {reason}")]
    Validation { field: String, reason: String },

    #[error("Precondition failed: {0}")]
    Precondition(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn validation(field: impl Into<String>, err: ValidationError) -> Self {
        AppError::Validation {
            field: field.into(),
            reason: err.to_string(),
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;
