//! HTTP surface of the Atlas backend.
//!
//! - `POST /forge` (multipart `userId`, `fileIds`): ingestion progress as SSE
//! - `GET /knowledgebase/query?userId&message`: retrieval progress as SSE
//! - `POST /knowledgebase/files`: register an uploaded file
//! - `DELETE /knowledgebase/files`: delete files, `{requested, deleted}`
//! - `GET /health`

pub mod core;
pub mod error_handler;
mod middleware_layer;
mod routes;

use std::sync::Arc;

use axum::{
    Router, middleware,
    routing::{get, post},
};
use tokio::signal;
use tracing::{info, warn};

pub use crate::core::{app_state::AppState, config::ApiConfig, session::SessionUser};
pub use error_handler::{AppError, AppResult};

use crate::routes::{
    forge::forge_route::forge,
    health_route::health,
    knowledgebase::{
        files_route::{delete_files, register_file},
        query_route::query_knowledgebase,
    },
};

/// Builds the router over an already wired state.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/forge", post(forge))
        .route("/knowledgebase/query", get(query_knowledgebase))
        .route(
            "/knowledgebase/files",
            post(register_file).delete(delete_files),
        )
        .layer(middleware::from_fn(
            middleware_layer::json_extractor::json_error_mapper,
        ))
        .with_state(state)
}

/// Wires state from the environment and serves until Ctrl+C.
///
/// # Errors
/// Configuration, bind and server failures.
pub async fn start(config: ApiConfig) -> Result<(), AppError> {
    let address = config.address.clone();
    let state = Arc::new(AppState::from_env(config)?);
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .map_err(AppError::Bind)?;
    info!(target: "api", %address, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(AppError::Server)?;

    info!(target: "api", "server stopped");
    Ok(())
}

/// Resolves when Ctrl+C is pressed.
async fn shutdown_signal() {
    if let Err(e) = signal::ctrl_c().await {
        warn!(target: "api", error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
