// src/commands.rs

use crate::auth::mailer;
use crate::config::Config;
use crate::db;
use crate::error::{DiaryError, Result};
use crate::models::display_date;
use crate::routes;
use crate::state::AppState;
use crate::store::Store;
use axum::http::Request;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;
use tracing::Level;

/// `--db`, then `SDIARY_DB_PATH`, then the default location.
pub fn resolve_db_path(flag: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(path) = flag {
        return Ok(path);
    }
    match std::env::var("SDIARY_DB_PATH") {
        Ok(path) if !path.trim().is_empty() => Ok(PathBuf::from(path)),
        _ => db::get_db_path(),
    }
}

/// Handle 'init'
pub fn handle_init(db_path: PathBuf) -> Result<()> {
    let conn = db::initialize_db(&db_path)?;
    println!("✓ Database initialized successfully at: {:?}", db_path);

    let entries = db::list_entries(&conn)?;
    println!("✓ {} entr{} stored.", entries.len(), if entries.len() == 1 { "y" } else { "ies" });
    Ok(())
}

/// Handle 'list'
pub fn handle_list(config: &Config, num: Option<usize>) -> Result<()> {
    let conn = db::initialize_db(&config.db_path)?;
    let entries = db::list_entries(&conn)?;

    if entries.is_empty() {
        println!("No entries yet.");
        return Ok(());
    }

    for entry in entries.iter().take(num.unwrap_or(usize::MAX)) {
        let relationship = entry
            .relationship
            .as_ref()
            .map_or("".to_string(), |r| format!(" ({})", r));
        println!(
            "[{}] {}{} | {}",
            entry.id,
            entry.name,
            relationship,
            display_date(&entry.created_at)
        );
        println!("  └─ {}", config.share_link(&entry.secret_token));
        println!("{}", entry.thoughts.trim_end());
        println!("{}", "─".repeat(40));
    }
    Ok(())
}

/// Handle 'link'
pub fn handle_link(config: &Config, id: i64) -> Result<()> {
    let conn = db::initialize_db(&config.db_path)?;
    let entry = db::get_entry(&conn, id)?.ok_or(DiaryError::EntryNotFound(id))?;
    println!("{}", config.share_link(&entry.secret_token));
    Ok(())
}

/// Handle 'serve': run until ctrl-c, then stop the server and the session watcher.
pub async fn handle_serve(mut config: Config, bind: Option<String>) -> Result<()> {
    if let Some(bind) = bind {
        config.bind_addr = bind;
    }
    let bind_addr = config.bind_addr.clone();

    let store = Store::open(&config.db_path)?;
    let mailer = mailer::from_config(&config)?;
    let state = AppState::new(config, store, mailer);

    let shutdown = CancellationToken::new();
    let watcher = state.auth.clone().spawn_watcher(shutdown.clone());

    let app = routes::router(state).layer(TraceLayer::new_for_http().make_span_with(
        |request: &Request<_>| {
            tracing::span!(
                Level::INFO,
                "http_request",
                method = %request.method(),
                path = %request.uri().path(),
            )
        },
    ));

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!(addr = %bind_addr, "starting server");

    let signal = shutdown.clone();
    tokio::spawn(async move {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %err, "failed to listen for ctrl-c");
            return;
        }
        tracing::info!("shutting down");
        signal.cancel();
    });

    let stopped = shutdown.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move { stopped.cancelled().await })
        .await?;

    shutdown.cancel();
    watcher.await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::EntryDraft;

    #[test]
    fn db_flag_wins() {
        let path = resolve_db_path(Some(PathBuf::from("/tmp/flag.db"))).unwrap();
        assert_eq!(path, PathBuf::from("/tmp/flag.db"));
    }

    #[test]
    fn link_for_missing_entry_fails() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::local(dir.path().join("sdiary.db"));
        handle_init(config.db_path.clone()).unwrap();
        assert!(matches!(
            handle_link(&config, 99),
            Err(DiaryError::EntryNotFound(99))
        ));
    }

    #[test]
    fn list_and_link_existing_entry() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::local(dir.path().join("sdiary.db"));
        let conn = db::initialize_db(&config.db_path).unwrap();
        let entry = db::insert_entry(
            &conn,
            &EntryDraft::new("Sam", Some("friend"), "You matter.").unwrap(),
            "AbCdEfGhIj",
        )
        .unwrap();
        drop(conn);

        handle_list(&config, Some(1)).unwrap();
        handle_link(&config, entry.id).unwrap();
    }
}
