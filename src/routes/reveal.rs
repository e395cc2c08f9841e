//! Handles `GET /s/{token}`.

use axum::extract::rejection::PathRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Response;

use crate::render::reveal;
use crate::state::AppState;

/// Look up the entry shared under `token`. Unknown tokens, undecodable paths
/// and failed lookups look the same to the visitor.
pub async fn reveal(
    State(state): State<AppState>,
    token: std::result::Result<Path<String>, PathRejection>,
) -> Response {
    let Ok(Path(token)) = token else {
        tracing::debug!("reveal: undecodable token");
        return super::html(StatusCode::NOT_FOUND, reveal::not_found());
    };

    match state.store.find_by_token(token).await {
        Ok(Some(entry)) => super::html(StatusCode::OK, reveal::found(&entry)),
        Ok(None) => {
            tracing::debug!("reveal: no entry for token");
            super::html(StatusCode::NOT_FOUND, reveal::not_found())
        }
        Err(err) => {
            tracing::warn!(error = %err, "reveal lookup failed");
            super::html(StatusCode::NOT_FOUND, reveal::not_found())
        }
    }
}
