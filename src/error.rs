// src/error.rs

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DiaryError {
    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Database Error: {0}")]
    Sql(#[from] rusqlite::Error),

    #[error("Home directory not found")]
    HomeDirNotFound,

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Entry {0} not found")]
    EntryNotFound(i64),

    #[error("Invalid email address: {0}")]
    InvalidEmail(String),

    #[error("Signups not allowed for this email")]
    SignupsNotAllowed,

    #[error("Email link is invalid or has expired")]
    InvalidLoginLink,

    #[error("Failed to send email: {0}")]
    Mail(String),

    #[error("Background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, DiaryError>;

impl DiaryError {
    /// True when the store rejected a write because of a UNIQUE constraint.
    pub fn is_unique_violation(&self) -> bool {
        matches!(
            self,
            DiaryError::Sql(rusqlite::Error::SqliteFailure(err, _))
                if err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
        )
    }
}

/// Unexpected failures render a generic HTML error page; the cause only goes to the log.
impl IntoResponse for DiaryError {
    fn into_response(self) -> Response {
        let (status, title, message) = match &self {
            DiaryError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, "Bad Request", msg.clone()),
            DiaryError::EntryNotFound(_) => (StatusCode::NOT_FOUND, "Not Found", self.to_string()),
            err => {
                tracing::error!(error = %err, "request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Something went wrong",
                    "An internal error occurred. Please try again later.".to_string(),
                )
            }
        };

        (status, crate::render::error_page(title, &message)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_keeps_backend_text() {
        let err = DiaryError::InvalidEmail("not-an-address".to_string());
        assert_eq!(err.to_string(), "Invalid email address: not-an-address");
        assert_eq!(
            DiaryError::InvalidLoginLink.to_string(),
            "Email link is invalid or has expired"
        );
    }

    #[test]
    fn unique_violation_is_detected() {
        let conn = rusqlite::Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE t (v TEXT UNIQUE); INSERT INTO t VALUES ('a');")
            .unwrap();
        let err: DiaryError = conn
            .execute("INSERT INTO t VALUES ('a')", [])
            .unwrap_err()
            .into();
        assert!(err.is_unique_violation());
        assert!(!DiaryError::HomeDirNotFound.is_unique_violation());
    }

    #[test]
    fn status_codes() {
        let response = DiaryError::EntryNotFound(3).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = DiaryError::Config("boom".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
