//! Login link request, verification and logout.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect, Response};
use axum::Form;
use serde::Deserialize;

use super::gate::{clear_session_cookie, session_cookie, SessionGate};
use crate::error::Result;
use crate::guard::{Rejection, SubmissionGuard};
use crate::render::{login, Notice};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginInput {
    #[serde(default)]
    pub request_id: String,
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct VerifyQuery {
    pub token: Option<String>,
}

/// The login form, shown wherever a session is required but missing.
pub(crate) fn login_page(email: &str, notice: Option<&Notice>) -> Response {
    let request_id = SubmissionGuard::new_request_id();
    super::html(StatusCode::OK, login::render(email, notice, &request_id))
}

pub async fn login(State(state): State<AppState>, Form(input): Form<LoginInput>) -> Response {
    let _permit = match state.guard.begin(&input.request_id) {
        Ok(permit) => permit,
        Err(Rejection::InFlight) => {
            return login_page(&input.email, Some(&Notice::error("Sending... please wait")));
        }
        Err(Rejection::AlreadyDone) => {
            return login_page(
                &input.email,
                Some(&Notice::error("This request was already submitted")),
            );
        }
    };

    let notice = match state.auth.request_login_link(&input.email).await {
        Ok(()) => Notice::success(login::LINK_SENT_MESSAGE),
        Err(err) => {
            tracing::info!(error = %err, "login link request failed");
            Notice::error(err.to_string())
        }
    };
    login_page(&input.email, Some(&notice))
}

/// Consume a login link and land on the dashboard.
pub async fn verify(
    State(state): State<AppState>,
    Query(query): Query<VerifyQuery>,
) -> Result<Response> {
    let token = query.token.unwrap_or_default();
    match state.auth.verify_login_link(&token).await {
        Ok(issued) => {
            let cookie = session_cookie(&state.config, &issued.token)?;
            Ok(([cookie], Redirect::to("/admin")).into_response())
        }
        Err(err) => {
            tracing::info!(error = %err, "login link rejected");
            Ok(login_page("", Some(&Notice::error(err.to_string()))))
        }
    }
}

pub async fn logout(State(state): State<AppState>, gate: SessionGate) -> Result<Response> {
    if let Some(token) = &gate.token {
        if let Err(err) = state.auth.sign_out(token).await {
            tracing::warn!(error = %err, "sign out failed");
        }
    }
    let cookie = clear_session_cookie(&state.config)?;
    Ok(([cookie], Redirect::to("/admin")).into_response())
}
