//! Knowledgebase file registration and deletion.

use std::sync::Arc;

use axum::{Json, extract::State, http::StatusCode, response::Response};
use chrono::Utc;
use forge::DeletionReport;
use tracing::info;
use user_store::KnowledgebaseFile;

use crate::{
    core::{app_state::AppState, http::response_envelope::ApiResponse, session::SessionUser},
    error_handler::{AppError, AppResult},
    routes::knowledgebase::files_request::{DeleteFilesRequest, RegisterFileRequest},
};

/// Handler: POST /knowledgebase/files
///
/// Registers an uploaded file as not yet processed. A key that is already
/// registered answers 409.
pub async fn register_file(
    State(state): State<Arc<AppState>>,
    session: SessionUser,
    Json(body): Json<RegisterFileRequest>,
) -> AppResult<Response> {
    session.authorize(&body.user_id)?;
    for (field, value) in [("name", &body.name), ("url", &body.url), ("key", &body.key)] {
        if value.trim().is_empty() {
            return Err(AppError::BadRequest(format!("{field} is required")));
        }
    }

    let file = KnowledgebaseFile {
        name: body.name,
        url: body.url,
        size: body.size,
        key: body.key,
        date_uploaded: Utc::now(),
        date_processed: None,
    };
    state.users.append_file(session.id(), file.clone()).await?;

    info!(target: "api::files", user_id = %session.id(), key = %file.key, "file registered");
    Ok(ApiResponse::success(file).into_response_with_status(StatusCode::CREATED))
}

/// Handler: DELETE /knowledgebase/files
///
/// `deleted < requested` in the response means some files may remain.
pub async fn delete_files(
    State(state): State<Arc<AppState>>,
    session: SessionUser,
    Json(body): Json<DeleteFilesRequest>,
) -> AppResult<ApiResponse<DeletionReport>> {
    session.authorize(&body.user_id)?;
    let report = state
        .deletion
        .delete_files(session.id(), &body.file_keys)
        .await?;
    Ok(ApiResponse::success(report))
}
