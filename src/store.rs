//! Shared async handle over the SQLite connection.
//!
//! Every query in [`crate::db`] is synchronous; the store runs them on the
//! blocking pool behind a single mutex-guarded connection.

use std::path::Path;
use std::sync::Arc;

use parking_lot::Mutex;
use rusqlite::Connection;

use crate::db;
use crate::error::Result;
use crate::models::{Entry, EntryDraft, RevealedEntry};
use crate::token;

/// How many fresh tokens to try when a new share token collides.
const TOKEN_ATTEMPTS: usize = 3;

#[derive(Clone)]
pub struct Store {
    conn: Arc<Mutex<Connection>>,
}

impl Store {
    /// Open (and initialize) the database file at `path`.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = db::initialize_db(path)?;
        tracing::info!(path = %path.display(), "database opened");
        Ok(Self::from_connection(conn))
    }

    /// Fresh in-memory database, used by tests.
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        db::create_schema(&conn)?;
        Ok(Self::from_connection(conn))
    }

    pub fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
        }
    }

    /// Run a synchronous query against the connection on the blocking pool.
    pub async fn run<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || {
            let conn = conn.lock();
            f(&conn)
        })
        .await?
    }

    /// Insert a new entry under a freshly generated share token.
    pub async fn create_entry(&self, draft: EntryDraft) -> Result<Entry> {
        self.create_entry_with(draft, token::secret_token).await
    }

    /// Insert a new entry, drawing share tokens from `next_token`. A token
    /// that collides is replaced, up to `TOKEN_ATTEMPTS` tries in total.
    pub async fn create_entry_with<G>(&self, draft: EntryDraft, mut next_token: G) -> Result<Entry>
    where
        G: FnMut() -> String + Send + 'static,
    {
        self.run(move |conn| {
            let mut attempt = 1;
            loop {
                let secret_token = next_token();
                match db::insert_entry(conn, &draft, &secret_token) {
                    Err(err) if err.is_unique_violation() && attempt < TOKEN_ATTEMPTS => {
                        tracing::warn!(attempt, "share token collision, regenerating");
                        attempt += 1;
                    }
                    result => return result,
                }
            }
        })
        .await
    }

    pub async fn list_entries(&self) -> Result<Vec<Entry>> {
        self.run(db::list_entries).await
    }

    pub async fn get_entry(&self, id: i64) -> Result<Option<Entry>> {
        self.run(move |conn| db::get_entry(conn, id)).await
    }

    pub async fn update_entry(&self, id: i64, draft: EntryDraft) -> Result<usize> {
        self.run(move |conn| db::update_entry(conn, id, &draft)).await
    }

    pub async fn delete_entry(&self, id: i64) -> Result<usize> {
        self.run(move |conn| db::delete_entry(conn, id)).await
    }

    pub async fn find_by_token(&self, secret_token: String) -> Result<Option<RevealedEntry>> {
        self.run(move |conn| db::find_by_token(conn, &secret_token))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn created_entries_get_distinct_tokens() {
        let store = Store::in_memory().unwrap();
        let mut tokens = HashSet::new();
        for i in 0..50 {
            let draft = EntryDraft::new(&format!("n{i}"), None, "t").unwrap();
            let entry = store.create_entry(draft).await.unwrap();
            assert_eq!(entry.secret_token.len(), token::SECRET_TOKEN_LEN);
            tokens.insert(entry.secret_token);
        }
        assert_eq!(tokens.len(), 50);
    }

    #[tokio::test]
    async fn colliding_token_is_regenerated() {
        let store = Store::in_memory().unwrap();
        store
            .create_entry_with(EntryDraft::new("Ana", None, "t").unwrap(), || "TAKEN00000".to_string())
            .await
            .unwrap();

        let mut tokens = vec!["FRESH00000", "TAKEN00000"];
        let entry = store
            .create_entry_with(EntryDraft::new("Sam", None, "t").unwrap(), move || {
                tokens.pop().unwrap().to_string()
            })
            .await
            .unwrap();
        assert_eq!(entry.secret_token, "FRESH00000");
    }

    #[tokio::test]
    async fn collisions_give_up_after_limit() {
        let store = Store::in_memory().unwrap();
        store
            .create_entry_with(EntryDraft::new("Ana", None, "t").unwrap(), || "TAKEN00000".to_string())
            .await
            .unwrap();

        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let err = store
            .create_entry_with(EntryDraft::new("Sam", None, "t").unwrap(), move || {
                counter.fetch_add(1, Ordering::SeqCst);
                "TAKEN00000".to_string()
            })
            .await
            .unwrap_err();
        assert!(err.is_unique_violation());
        assert_eq!(calls.load(Ordering::SeqCst), TOKEN_ATTEMPTS);
        assert_eq!(store.list_entries().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn edits_preserve_token() {
        let store = Store::in_memory().unwrap();
        let entry = store
            .create_entry(EntryDraft::new("Sam", Some("friend"), "You matter.").unwrap())
            .await
            .unwrap();

        store
            .update_entry(entry.id, EntryDraft::new("Samuel", None, "Still true.").unwrap())
            .await
            .unwrap();

        let after = store.get_entry(entry.id).await.unwrap().unwrap();
        assert_eq!(after.secret_token, entry.secret_token);
        assert_eq!(after.created_at, entry.created_at);
        assert_eq!(after.name, "Samuel");
    }

    #[tokio::test]
    async fn reveal_after_delete_is_empty() {
        let store = Store::in_memory().unwrap();
        let entry = store
            .create_entry(EntryDraft::new("Sam", None, "hi").unwrap())
            .await
            .unwrap();
        assert!(store
            .find_by_token(entry.secret_token.clone())
            .await
            .unwrap()
            .is_some());

        assert_eq!(store.delete_entry(entry.id).await.unwrap(), 1);
        assert!(store
            .find_by_token(entry.secret_token)
            .await
            .unwrap()
            .is_none());
        assert!(store.list_entries().await.unwrap().is_empty());
    }
}
