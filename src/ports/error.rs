use thiserror::Error;

/// Message shown when the backend could not be reached or gave no reason.
pub const NETWORK_ERROR_MESSAGE: &str = "Network error, please try again.";

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RepositoryError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Cannot read {path}: {message}")]
    Io { path: String, message: String },
}

impl RepositoryError {
    /// Text suitable for showing to the user: the server's own message when
    /// it sent one, otherwise a generic network message.
    pub fn user_message(&self) -> String {
        match self {
            RepositoryError::Authentication(message)
            | RepositoryError::NotFound(message)
            | RepositoryError::Api { message, .. } => message.clone(),
            RepositoryError::Network(_) | RepositoryError::Serialization(_) => {
                NETWORK_ERROR_MESSAGE.to_string()
            }
            RepositoryError::Io { path, .. } => format!("Could not read file {path}"),
        }
    }
}

pub type RepositoryResult<T> = Result<T, RepositoryError>;
