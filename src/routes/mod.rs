//! Route definitions for the diary service.
//!
//! ## Routes
//!
//! - `GET /` - Landing page
//! - `GET /health` - Health check (JSON)
//! - `GET /s/{token}` - Public reveal page for a shared entry
//! - `GET /admin` - Dashboard, or the login form without a session
//! - `POST /admin/login` - Request a magic login link
//! - `POST /admin/logout` - End the session
//! - `POST /admin/entries` - Create or update an entry
//! - `GET|POST /admin/entries/{id}/delete` - Confirm, then delete an entry
//! - `GET /auth/verify` - Consume a magic login link

mod admin;
mod auth;
pub mod gate;
mod reveal;

use axum::http::header::{CACHE_CONTROL, X_CONTENT_TYPE_OPTIONS, X_FRAME_OPTIONS};
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use maud::Markup;
use serde::Serialize;

use crate::render;
use crate::state::AppState;

/// Build the complete router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(home))
        .route("/health", get(health))
        .route("/s/{token}", get(reveal::reveal))
        .route("/admin", get(admin::dashboard))
        .route("/admin/login", post(auth::login))
        .route("/admin/logout", post(auth::logout))
        .route("/admin/entries", post(admin::save_entry))
        .route(
            "/admin/entries/{id}/delete",
            get(admin::confirm_delete).post(admin::delete_entry),
        )
        .route("/auth/verify", get(auth::verify))
        .with_state(state)
}

async fn home() -> Response {
    html(StatusCode::OK, render::landing::render())
}

#[derive(Serialize)]
struct Health {
    status: &'static str,
}

async fn health() -> Json<Health> {
    Json(Health { status: "ok" })
}

/// HTML response with the security headers every page carries.
pub(crate) fn html(status: StatusCode, markup: Markup) -> Response {
    let mut response = (status, markup).into_response();
    let headers = response.headers_mut();
    headers.insert(X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff"));
    headers.insert(X_FRAME_OPTIONS, HeaderValue::from_static("DENY"));
    headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-store"));
    response
}
