use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use forge::ForgeError;
use rag_store::RagError;
use thiserror::Error;
use tracing::error;
use user_store::UserStoreError;

use crate::core::http::response_envelope::ApiResponse;

/// Public application error type.
#[derive(Debug, Error)]
pub enum AppError {
    // --- Boot / config ---
    #[error("configuration error: {0}")]
    Config(String),

    // --- IO / network / server ---
    #[error("failed to bind listener")]
    Bind(#[source] std::io::Error),

    #[error("server error")]
    Server(#[source] std::io::Error),

    // --- Request / routing ---
    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("authentication required")]
    Unauthorized,

    #[error("userId does not match the authenticated user")]
    Forbidden,

    #[error("not found: {0}")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    /// Rich HTTP error mapped from lower layers with specific status & code.
    #[error("{message}")]
    Http {
        status: StatusCode,
        code: &'static str,
        message: String,
    },
}

impl AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR, // startup-only
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Http { status, .. } => *status,
            AppError::Bind(_) | AppError::Server(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            AppError::Config(_) => "CONFIG_ERROR",
            AppError::Bind(_) => "BIND_ERROR",
            AppError::Server(_) => "SERVER_ERROR",
            AppError::BadRequest(_) => "BAD_REQUEST",
            AppError::Unauthorized => "UNAUTHORIZED",
            AppError::Forbidden => "FORBIDDEN",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Conflict(_) => "CONFLICT",
            AppError::Http { code, .. } => code,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!(target: "api", error = %self, "request failed");
        }
        ApiResponse::<()>::error(self.error_code(), self.to_string(), Vec::new())
            .into_response_with_status(status)
    }
}

/// Handy result alias used across handlers.
pub type AppResult<T> = Result<T, AppError>;

impl From<axum::extract::rejection::JsonRejection> for AppError {
    fn from(err: axum::extract::rejection::JsonRejection) -> Self {
        AppError::BadRequest(err.body_text())
    }
}

impl From<axum::extract::rejection::QueryRejection> for AppError {
    fn from(err: axum::extract::rejection::QueryRejection) -> Self {
        AppError::BadRequest(err.body_text())
    }
}

impl From<axum::extract::multipart::MultipartError> for AppError {
    fn from(err: axum::extract::multipart::MultipartError) -> Self {
        AppError::BadRequest(err.body_text())
    }
}

impl From<UserStoreError> for AppError {
    fn from(err: UserStoreError) -> Self {
        match err {
            UserStoreError::NotFound(_) | UserStoreError::FileNotFound(_) => {
                AppError::NotFound(err.to_string())
            }
            UserStoreError::DuplicateFile(_) => AppError::Conflict(err.to_string()),
            UserStoreError::InvalidUserId(_) => AppError::BadRequest(err.to_string()),
            UserStoreError::Storage { .. } => AppError::Http {
                status: StatusCode::BAD_GATEWAY,
                code: "STORAGE_ERROR",
                message: err.to_string(),
            },
            UserStoreError::Io(_) | UserStoreError::Json(_) => AppError::Http {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                code: "USER_STORE_ERROR",
                message: err.to_string(),
            },
        }
    }
}

impl From<ForgeError> for AppError {
    fn from(err: ForgeError) -> Self {
        match err {
            ForgeError::Validation(msg) => AppError::BadRequest(msg),
            ForgeError::User(e) => e.into(),
            ForgeError::Store(RagError::ProviderUnavailable(kind)) => AppError::Http {
                status: StatusCode::SERVICE_UNAVAILABLE,
                code: "VECTOR_STORE_UNAVAILABLE",
                message: format!("vector store provider '{kind}' is not configured"),
            },
            other => AppError::Http {
                status: StatusCode::BAD_GATEWAY,
                code: "UPSTREAM_ERROR",
                message: other.to_string(),
            },
        }
    }
}
