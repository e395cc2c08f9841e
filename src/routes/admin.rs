//! Dashboard handlers. Every handler renders the login form when the session
//! gate finds no session.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect, Response};
use axum::Form;
use serde::Deserialize;

use super::auth::login_page;
use super::gate::SessionGate;
use crate::error::{DiaryError, Result};
use crate::guard::{Rejection, SubmissionGuard};
use crate::models::{EntryDraft, Session};
use crate::render::dashboard::{self, Dashboard, EntryForm};
use crate::render::Notice;
use crate::state::AppState;

const ALREADY_SUBMITTED: &str = "This request was already submitted";

#[derive(Debug, Default, Deserialize)]
pub struct DashboardQuery {
    pub edit: Option<i64>,
    pub link: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct EntryInput {
    #[serde(default)]
    pub request_id: String,
    pub id: Option<i64>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub relationship: String,
    #[serde(default)]
    pub thoughts: String,
}

#[derive(Debug, Deserialize)]
pub struct DeleteInput {
    #[serde(default)]
    pub request_id: String,
    pub confirm: Option<String>,
}

/// Re-list entries and render the dashboard around `form` and `notice`.
async fn render_dashboard(
    state: &AppState,
    session: &Session,
    form: &EntryForm,
    notice: Option<&Notice>,
) -> Result<Response> {
    let entries = state.store.list_entries().await?;
    let request_id = SubmissionGuard::new_request_id();
    let markup = dashboard::render(&Dashboard {
        email: &session.email,
        entries: &entries,
        form,
        notice,
        request_id: &request_id,
        config: &state.config,
    });
    Ok(super::html(StatusCode::OK, markup))
}

fn rejection_notice(rejection: Rejection) -> Notice {
    match rejection {
        Rejection::InFlight => Notice::error("Saving... please wait"),
        Rejection::AlreadyDone => Notice::error(ALREADY_SUBMITTED),
    }
}

pub async fn dashboard(
    State(state): State<AppState>,
    gate: SessionGate,
    Query(query): Query<DashboardQuery>,
) -> Result<Response> {
    let Some(session) = gate.session else {
        return Ok(login_page("", None));
    };

    let mut form = EntryForm::default();
    let mut notice = None;

    if let Some(id) = query.edit {
        match state.store.get_entry(id).await? {
            Some(entry) => form = EntryForm::edit(&entry),
            None => notice = Some(Notice::error(DiaryError::EntryNotFound(id).to_string())),
        }
    } else if let Some(id) = query.link {
        notice = Some(match state.store.get_entry(id).await? {
            Some(entry) => Notice::success("Secret link ready to copy 🔗")
                .with_copy(state.config.share_link(&entry.secret_token)),
            None => Notice::error(DiaryError::EntryNotFound(id).to_string()),
        });
    }

    render_dashboard(&state, &session, &form, notice.as_ref()).await
}

/// Create a new entry, or update the one named by `id`.
pub async fn save_entry(
    State(state): State<AppState>,
    gate: SessionGate,
    Form(input): Form<EntryInput>,
) -> Result<Response> {
    let Some(session) = gate.session else {
        return Ok(login_page("", None));
    };

    let submitted = EntryForm {
        id: input.id,
        name: input.name,
        relationship: input.relationship,
        thoughts: input.thoughts,
    };

    let _permit = match state.guard.begin(&input.request_id) {
        Ok(permit) => permit,
        Err(rejection) => {
            let notice = rejection_notice(rejection);
            return render_dashboard(&state, &session, &EntryForm::default(), Some(&notice)).await;
        }
    };

    let (prefix, result) = match submitted.id {
        Some(id) => ("Error updating: ", update(&state, id, &submitted).await),
        None => ("Error saving: ", create(&state, &submitted).await),
    };

    match result {
        Ok(message) => {
            let notice = Notice::success(message);
            render_dashboard(&state, &session, &EntryForm::default(), Some(&notice)).await
        }
        Err(err) => {
            tracing::info!(error = %err, "entry not saved");
            let notice = Notice::error(format!("{}{}", prefix, err));
            render_dashboard(&state, &session, &submitted, Some(&notice)).await
        }
    }
}

async fn create(state: &AppState, form: &EntryForm) -> Result<&'static str> {
    let draft = EntryDraft::new(&form.name, Some(&form.relationship), &form.thoughts)?;
    let entry = state.store.create_entry(draft).await?;
    tracing::info!(id = entry.id, "entry created");
    Ok("New entry created! 🎉")
}

async fn update(state: &AppState, id: i64, form: &EntryForm) -> Result<&'static str> {
    let draft = EntryDraft::new(&form.name, Some(&form.relationship), &form.thoughts)?;
    if state.store.update_entry(id, draft).await? == 0 {
        return Err(DiaryError::EntryNotFound(id));
    }
    tracing::info!(id, "entry updated");
    Ok("Entry updated successfully! ✨")
}

/// Confirmation step shown before deleting.
pub async fn confirm_delete(
    State(state): State<AppState>,
    gate: SessionGate,
    Path(id): Path<i64>,
) -> Result<Response> {
    let Some(session) = gate.session else {
        return Ok(login_page("", None));
    };

    match state.store.get_entry(id).await? {
        Some(entry) => {
            let request_id = SubmissionGuard::new_request_id();
            Ok(super::html(
                StatusCode::OK,
                dashboard::confirm_delete(&entry, &request_id),
            ))
        }
        None => {
            let notice = Notice::error(format!(
                "Error deleting entry: {}",
                DiaryError::EntryNotFound(id)
            ));
            render_dashboard(&state, &session, &EntryForm::default(), Some(&notice)).await
        }
    }
}

pub async fn delete_entry(
    State(state): State<AppState>,
    gate: SessionGate,
    Path(id): Path<i64>,
    Form(input): Form<DeleteInput>,
) -> Result<Response> {
    let Some(session) = gate.session else {
        return Ok(login_page("", None));
    };

    if input.confirm.as_deref() != Some("yes") {
        return Ok(Redirect::to("/admin").into_response());
    }

    let _permit = match state.guard.begin(&input.request_id) {
        Ok(permit) => permit,
        Err(rejection) => {
            let notice = rejection_notice(rejection);
            return render_dashboard(&state, &session, &EntryForm::default(), Some(&notice)).await;
        }
    };

    let notice = match state.store.delete_entry(id).await {
        Ok(0) => Notice::error(format!(
            "Error deleting entry: {}",
            DiaryError::EntryNotFound(id)
        )),
        Ok(_) => {
            tracing::info!(id, "entry deleted");
            Notice::success("Entry deleted successfully")
        }
        Err(err) => Notice::error(format!("Error deleting entry: {}", err)),
    };
    render_dashboard(&state, &session, &EntryForm::default(), Some(&notice)).await
}
