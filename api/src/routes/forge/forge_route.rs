//! POST /forge: ingest selected knowledgebase files, streaming progress.

use std::{convert::Infallible, sync::Arc};

use axum::{
    extract::{Multipart, State},
    response::sse::{Event, Sse},
};
use tokio_stream::Stream;
use tracing::info;

use crate::{
    core::{app_state::AppState, http::sse::event_stream, session::SessionUser},
    error_handler::AppResult,
    routes::forge::forge_request::ForgeRequest,
};

/// Handler: POST /forge
///
/// # Example
/// ```bash
/// curl -N -X POST http://127.0.0.1:8080/forge \
///   -H 'x-authenticated-user: u1' \
///   -F userId=u1 -F 'fileIds=["key1","key2"]'
/// ```
pub async fn forge(
    State(state): State<Arc<AppState>>,
    session: SessionUser,
    multipart: Multipart,
) -> AppResult<Sse<impl Stream<Item = Result<Event, Infallible>>>> {
    let req = ForgeRequest::from_multipart(multipart).await?;
    session.authorize(&req.user_id)?;

    info!(target: "api::forge", user_id = %session.id(), files = req.file_ids.len(), "ingestion requested");
    let rx = state
        .ingestion
        .clone()
        .spawn(session.id().to_string(), req.file_ids);
    Ok(event_stream(rx))
}
