use thiserror::Error;
use tracing::{error, warn};

#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error("email already registered")]
    DuplicateIdentity,

    #[error("invalid email or password")]
    InvalidCredentials,

    #[error("record not found")]
    NotFound,

    #[error("store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("constraint violation: {0}")]
    ConstraintViolation(String),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Message shown to the user in place of the error.
    pub fn notice(&self) -> String {
        match self {
            AppError::Validation(msg) => msg.clone(),
            AppError::DuplicateIdentity => "Email already exists.".into(),
            AppError::InvalidCredentials => "Invalid email or password.".into(),
            AppError::NotFound => "Student not found.".into(),
            AppError::StoreUnavailable(_) => "Database not connected.".into(),
            AppError::ConstraintViolation(msg) => msg.clone(),
            AppError::Internal(_) => "Something went wrong. Please try again.".into(),
        }
    }

    /// Logs at the route boundary, before the error becomes a notice.
    pub fn log(&self, action: &str) {
        match self {
            AppError::Internal(_) | AppError::StoreUnavailable(_) => {
                error!(error = %self, action, "request failed")
            }
            _ => warn!(error = %self, action, "request rejected"),
        }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        if crate::db::is_connection_error(&err) {
            AppError::StoreUnavailable(err.to_string())
        } else {
            AppError::Internal(err.into())
        }
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
