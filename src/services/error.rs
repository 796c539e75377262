use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Object not found: {0}")]
    NotFound(String),

    #[error("Authentication failed: {0}")]
    Unauthorized(String),

    #[error("Precondition failed: {0}")]
    PreconditionFailed(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Invalid credentials: {0}")]
    InvalidCredentials(String),

    #[error("Storage provider error: {0}")]
    ProviderError(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl StorageError {
    /// Maps a non-success HTTP status from the object store.
    pub fn from_status(status: reqwest::StatusCode, context: String) -> Self {
        match status.as_u16() {
            404 => StorageError::NotFound(context),
            401 | 403 => StorageError::Unauthorized(context),
            412 => StorageError::PreconditionFailed(context),
            _ => StorageError::ProviderError(format!("{} (status {})", context, status)),
        }
    }
}

impl From<reqwest::Error> for StorageError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            StorageError::NetworkError("Request timeout".to_string())
        } else if error.is_connect() {
            StorageError::NetworkError(format!("Connection failed: {}", error))
        } else if let Some(status) = error.status() {
            StorageError::from_status(status, error.to_string())
        } else {
            StorageError::InternalError(error.to_string())
        }
    }
}
