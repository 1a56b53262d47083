use crate::domain::{DomainError, ValidationErrors};
use crate::ports::{ConfigError, RepositoryError};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AppError {
    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Domain(#[from] DomainError),

    #[error("Validation failed: {0}")]
    Validation(ValidationErrors),

    #[error("Application error: {0}")]
    Application(String),

    #[error("Authentication required, run `creator-desk login` first")]
    AuthenticationRequired,
}

pub type AppResult<T> = Result<T, AppError>;
