use thiserror::Error;

pub type Result<T> = std::result::Result<T, UserStoreError>;

#[derive(Debug, Error)]
pub enum UserStoreError {
    #[error("user '{0}' not found")]
    NotFound(String),

    #[error("invalid user id '{0}'")]
    InvalidUserId(String),

    #[error("file with key '{0}' is already registered")]
    DuplicateFile(String),

    #[error("file with key '{0}' not found")]
    FileNotFound(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("object storage error{}: {message}", .status.map(|s| format!(" (HTTP {s})")).unwrap_or_default())]
    Storage { status: Option<u16>, message: String },
}
