//! sdiary - a secret diary with shareable links.
//!
//! An admin signs in with an emailed magic link, writes short entries about
//! people, and hands each person an unguessable link (`/s/{token}`) that
//! reveals their entry without an account.
//!
//! # Architecture
//!
//! - **db / store**: SQLite queries and the shared async handle running them
//! - **auth**: login links, sessions, and session-change notifications
//! - **routes**: axum handlers, including the session gate extractor
//! - **render**: maud templates for every page
//! - **guard**: single-flight protection for form submissions

pub mod auth;
pub mod cli;
pub mod commands;
pub mod config;
pub mod db;
pub mod error;
pub mod guard;
pub mod models;
pub mod render;
pub mod routes;
pub mod state;
pub mod store;
pub mod token;

pub use config::Config;
pub use error::{DiaryError, Result};
pub use routes::router;
pub use state::AppState;
pub use store::Store;
