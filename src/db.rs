// src/db.rs

use crate::error::{DiaryError, Result};
use crate::models::{Entry, EntryDraft, RevealedEntry, Session};
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::{Path, PathBuf};

/// Default database location (~/.config/sdiary/sdiary.db)
pub fn get_db_path() -> Result<PathBuf> {
    let home_dir = dirs::home_dir().ok_or(DiaryError::HomeDirNotFound)?;
    Ok(home_dir.join(".config/sdiary/sdiary.db"))
}

/// Open the database at `path`, creating its directory and schema if needed.
pub fn initialize_db(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let conn = Connection::open(path)?;
    create_schema(&conn)?;
    Ok(conn)
}

pub fn create_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS entries (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            relationship TEXT,
            thoughts TEXT NOT NULL,
            secret_token TEXT NOT NULL,
            created_at TEXT NOT NULL
        );
        CREATE UNIQUE INDEX IF NOT EXISTS entries_secret_token ON entries (secret_token);
        CREATE TABLE IF NOT EXISTS login_links (
            token_hash TEXT PRIMARY KEY,
            email TEXT NOT NULL,
            created_at TEXT NOT NULL,
            expires_at TEXT NOT NULL
        );
        CREATE TABLE IF NOT EXISTS sessions (
            token_hash TEXT PRIMARY KEY,
            email TEXT NOT NULL,
            created_at TEXT NOT NULL,
            expires_at TEXT NOT NULL
        );",
    )?;
    Ok(())
}

/// Fixed-width RFC 3339 so stored timestamps sort lexically.
pub fn format_timestamp(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(s: &str) -> Result<DateTime<Utc>> {
    s.parse::<DateTime<Utc>>()
        .map_err(|e| DiaryError::InvalidInput(format!("Invalid timestamp {}: {}", s, e)))
}

fn entry_from_row(row: &Row<'_>) -> rusqlite::Result<Entry> {
    Ok(Entry {
        id: row.get(0)?,
        name: row.get(1)?,
        relationship: row.get(2)?,
        thoughts: row.get(3)?,
        secret_token: row.get(4)?,
        created_at: row.get(5)?,
    })
}

/// Insert a new entry with the given share token.
pub fn insert_entry(conn: &Connection, draft: &EntryDraft, secret_token: &str) -> Result<Entry> {
    let created_at = format_timestamp(Utc::now());
    conn.execute(
        "INSERT INTO entries (name, relationship, thoughts, secret_token, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            draft.name,
            draft.relationship,
            draft.thoughts,
            secret_token,
            created_at
        ],
    )?;
    Ok(Entry {
        id: conn.last_insert_rowid(),
        name: draft.name.clone(),
        relationship: draft.relationship.clone(),
        thoughts: draft.thoughts.clone(),
        secret_token: secret_token.to_string(),
        created_at,
    })
}

/// All entries, newest first.
pub fn list_entries(conn: &Connection) -> Result<Vec<Entry>> {
    let mut stmt = conn.prepare(
        "SELECT id, name, relationship, thoughts, secret_token, created_at
         FROM entries ORDER BY created_at DESC, id DESC",
    )?;
    let entries = stmt
        .query_map([], entry_from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(entries)
}

pub fn get_entry(conn: &Connection, id: i64) -> Result<Option<Entry>> {
    let entry = conn
        .query_row(
            "SELECT id, name, relationship, thoughts, secret_token, created_at
             FROM entries WHERE id = ?",
            [id],
            entry_from_row,
        )
        .optional()?;
    Ok(entry)
}

/// Update the editable fields of an entry. The token and timestamp are never touched.
pub fn update_entry(conn: &Connection, id: i64, draft: &EntryDraft) -> Result<usize> {
    let count = conn.execute(
        "UPDATE entries SET name = ?1, relationship = ?2, thoughts = ?3 WHERE id = ?4",
        params![draft.name, draft.relationship, draft.thoughts, id],
    )?;
    Ok(count)
}

pub fn delete_entry(conn: &Connection, id: i64) -> Result<usize> {
    let count = conn.execute("DELETE FROM entries WHERE id = ?", [id])?;
    Ok(count)
}

/// Public lookup by share token; selects display fields only.
pub fn find_by_token(conn: &Connection, secret_token: &str) -> Result<Option<RevealedEntry>> {
    let entry = conn
        .query_row(
            "SELECT name, relationship, thoughts, created_at
             FROM entries WHERE secret_token = ?",
            [secret_token],
            |row| {
                Ok(RevealedEntry {
                    name: row.get(0)?,
                    relationship: row.get(1)?,
                    thoughts: row.get(2)?,
                    created_at: row.get(3)?,
                })
            },
        )
        .optional()?;
    Ok(entry)
}

pub fn insert_login_link(
    conn: &Connection,
    token_hash: &str,
    email: &str,
    expires_at: DateTime<Utc>,
) -> Result<()> {
    conn.execute(
        "INSERT INTO login_links (token_hash, email, created_at, expires_at) VALUES (?1, ?2, ?3, ?4)",
        params![
            token_hash,
            email,
            format_timestamp(Utc::now()),
            format_timestamp(expires_at)
        ],
    )?;
    Ok(())
}

/// Consume a login link. Returns the email it was issued to if it exists and has
/// not expired at `now`; the link is removed either way.
pub fn take_login_link(
    conn: &Connection,
    token_hash: &str,
    now: DateTime<Utc>,
) -> Result<Option<String>> {
    let link: Option<(String, String)> = conn
        .query_row(
            "SELECT email, expires_at FROM login_links WHERE token_hash = ?",
            [token_hash],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .optional()?;
    let Some((email, expires_at)) = link else {
        return Ok(None);
    };

    conn.execute("DELETE FROM login_links WHERE token_hash = ?", [token_hash])?;

    if parse_timestamp(&expires_at)? <= now {
        return Ok(None);
    }
    Ok(Some(email))
}

pub fn insert_session(conn: &Connection, token_hash: &str, session: &Session) -> Result<()> {
    conn.execute(
        "INSERT INTO sessions (token_hash, email, created_at, expires_at) VALUES (?1, ?2, ?3, ?4)",
        params![
            token_hash,
            session.email,
            format_timestamp(session.created_at),
            format_timestamp(session.expires_at)
        ],
    )?;
    Ok(())
}

/// Look up a session that is still valid at `now`.
pub fn get_session(
    conn: &Connection,
    token_hash: &str,
    now: DateTime<Utc>,
) -> Result<Option<Session>> {
    let row: Option<(String, String, String)> = conn
        .query_row(
            "SELECT email, created_at, expires_at FROM sessions
             WHERE token_hash = ?1 AND expires_at > ?2",
            params![token_hash, format_timestamp(now)],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        )
        .optional()?;

    row.map(|(email, created_at, expires_at)| {
        Ok(Session {
            email,
            created_at: parse_timestamp(&created_at)?,
            expires_at: parse_timestamp(&expires_at)?,
        })
    })
    .transpose()
}

/// Remove a session, returning its email if it existed.
pub fn delete_session(conn: &Connection, token_hash: &str) -> Result<Option<String>> {
    let email: Option<String> = conn
        .query_row(
            "SELECT email FROM sessions WHERE token_hash = ?",
            [token_hash],
            |row| row.get(0),
        )
        .optional()?;
    if email.is_some() {
        conn.execute("DELETE FROM sessions WHERE token_hash = ?", [token_hash])?;
    }
    Ok(email)
}

/// Drop expired sessions and login links. Returns the emails of the expired sessions.
pub fn purge_expired(conn: &Connection, now: DateTime<Utc>) -> Result<Vec<String>> {
    let now = format_timestamp(now);
    let mut stmt = conn.prepare("SELECT email FROM sessions WHERE expires_at <= ?")?;
    let emails = stmt
        .query_map([&now], |row| row.get(0))?
        .collect::<std::result::Result<Vec<String>, _>>()?;

    conn.execute("DELETE FROM sessions WHERE expires_at <= ?", [&now])?;
    conn.execute("DELETE FROM login_links WHERE expires_at <= ?", [&now])?;
    Ok(emails)
}
