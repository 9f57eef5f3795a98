use rag_store::RagError;
use thiserror::Error;
use user_store::UserStoreError;

pub type Result<T> = std::result::Result<T, ForgeError>;

#[derive(Debug, Error)]
pub enum ForgeError {
    /// Rejected before any stage started.
    #[error("invalid request: {0}")]
    Validation(String),

    #[error("parsing failed{}: {message}", .status.map(|s| format!(" (HTTP {s})")).unwrap_or_default())]
    Parsing { status: Option<u16>, message: String },

    #[error("parser returned no content for '{0}'")]
    EmptyDocument(String),

    #[error("'{0}' is already being processed")]
    AlreadyProcessing(String),

    #[error("file '{0}' is not registered for this user")]
    UnknownFile(String),

    #[error(transparent)]
    Store(#[from] RagError),

    #[error(transparent)]
    User(#[from] UserStoreError),

    #[error("client disconnected")]
    Disconnected,
}
