//! GET /knowledgebase/query: retrieval context for one chat turn.

use std::{convert::Infallible, sync::Arc};

use axum::{
    extract::{Query, State},
    response::sse::{Event, Sse},
};
use serde::Deserialize;
use tokio_stream::Stream;

use crate::{
    core::{app_state::AppState, http::sse::event_stream, session::SessionUser},
    error_handler::{AppError, AppResult},
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryParams {
    pub user_id: String,
    pub message: String,
}

/// Handler: GET /knowledgebase/query?userId=..&message=..
pub async fn query_knowledgebase(
    State(state): State<Arc<AppState>>,
    session: SessionUser,
    Query(params): Query<QueryParams>,
) -> AppResult<Sse<impl Stream<Item = Result<Event, Infallible>>>> {
    session.authorize(&params.user_id)?;
    if params.message.trim().is_empty() {
        return Err(AppError::BadRequest("message is required".into()));
    }

    let rx = state
        .retrieval
        .clone()
        .spawn(session.id().to_string(), params.message);
    Ok(event_stream(rx))
}
