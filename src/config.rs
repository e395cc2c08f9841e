//! Application configuration loaded from environment variables.

use std::collections::HashSet;
use std::path::PathBuf;

use chrono::Duration;

use crate::error::{DiaryError, Result};

/// SMTP settings for delivering login links.
#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub from: String,
    pub starttls: bool,
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server bind address (e.g., "127.0.0.1:3000").
    pub bind_addr: String,

    /// Path to the SQLite database file.
    pub db_path: PathBuf,

    /// Public origin used to build share links and login links, without trailing slash.
    pub public_url: String,

    /// Addresses allowed to sign in. Empty means any address.
    pub admin_emails: HashSet<String>,

    /// Lifetime of an emailed login link.
    pub login_link_ttl: Duration,

    /// Lifetime of a signed-in session.
    pub session_ttl: Duration,

    /// SMTP transport; `None` logs login links instead of mailing them.
    pub smtp: Option<SmtpConfig>,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Optional:
    /// - `SDIARY_BIND_ADDR`: Server bind address (default: "127.0.0.1:3000")
    /// - `SDIARY_PUBLIC_URL`: Public origin (default: "http://localhost:3000")
    /// - `SDIARY_ADMIN_EMAILS`: Comma-separated sign-in allow-list
    /// - `SDIARY_LOGIN_LINK_TTL_SECS`: Login link lifetime (default: 3600)
    /// - `SDIARY_SESSION_TTL_SECS`: Session lifetime (default: 604800)
    /// - `SDIARY_SMTP_HOST`, `SDIARY_SMTP_PORT`, `SDIARY_SMTP_USERNAME`,
    ///   `SDIARY_SMTP_PASSWORD`, `SDIARY_SMTP_FROM`, `SDIARY_SMTP_STARTTLS`
    pub fn from_env(db_path: PathBuf) -> Result<Self> {
        let bind_addr =
            std::env::var("SDIARY_BIND_ADDR").unwrap_or_else(|_| "127.0.0.1:3000".to_string());

        let public_url = std::env::var("SDIARY_PUBLIC_URL")
            .unwrap_or_else(|_| "http://localhost:3000".to_string())
            .trim_end_matches('/')
            .to_string();

        let admin_emails = parse_email_list(&std::env::var("SDIARY_ADMIN_EMAILS").unwrap_or_default());

        let login_link_ttl = env_ttl("SDIARY_LOGIN_LINK_TTL_SECS", 3600)?;
        let session_ttl = env_ttl("SDIARY_SESSION_TTL_SECS", 604_800)?;

        let smtp = match std::env::var("SDIARY_SMTP_HOST") {
            Ok(host) if !host.trim().is_empty() => {
                let from = std::env::var("SDIARY_SMTP_FROM").map_err(|_| {
                    DiaryError::Config("SDIARY_SMTP_FROM is required with SDIARY_SMTP_HOST".to_string())
                })?;
                Some(SmtpConfig {
                    host: host.trim().to_string(),
                    port: env_number("SDIARY_SMTP_PORT", 587)?,
                    username: std::env::var("SDIARY_SMTP_USERNAME").ok(),
                    password: std::env::var("SDIARY_SMTP_PASSWORD").ok(),
                    from,
                    starttls: std::env::var("SDIARY_SMTP_STARTTLS")
                        .map(|v| !matches!(v.trim(), "0" | "false" | "no"))
                        .unwrap_or(true),
                })
            }
            _ => None,
        };

        tracing::info!(
            bind_addr = %bind_addr,
            public_url = %public_url,
            db_path = %db_path.display(),
            admin_count = admin_emails.len(),
            smtp = smtp.is_some(),
            "configuration loaded"
        );

        Ok(Self {
            bind_addr,
            db_path,
            public_url,
            admin_emails,
            login_link_ttl,
            session_ttl,
            smtp,
        })
    }

    /// Defaults for local use and tests: no SMTP, any address may sign in.
    pub fn local(db_path: PathBuf) -> Self {
        Self {
            bind_addr: "127.0.0.1:3000".to_string(),
            db_path,
            public_url: "http://localhost:3000".to_string(),
            admin_emails: HashSet::new(),
            login_link_ttl: Duration::hours(1),
            session_ttl: Duration::days(7),
            smtp: None,
        }
    }

    /// Absolute share link for a token.
    pub fn share_link(&self, secret_token: &str) -> String {
        format!("{}/s/{}", self.public_url, secret_token)
    }

    /// Absolute login link for a one-time token. Verification always lands on `/admin`.
    pub fn login_link(&self, token: &str) -> String {
        format!("{}/auth/verify?token={}", self.public_url, token)
    }

    pub fn secure_cookies(&self) -> bool {
        self.public_url.starts_with("https://")
    }

    pub fn is_admin_email(&self, email: &str) -> bool {
        self.admin_emails.is_empty() || self.admin_emails.contains(&email.to_lowercase())
    }
}

fn parse_email_list(raw: &str) -> HashSet<String> {
    raw.split(',')
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Longest accepted lifetime for login links and sessions (ten years).
const MAX_TTL_SECS: i64 = 10 * 365 * 24 * 60 * 60;

fn env_ttl(key: &str, default: i64) -> Result<Duration> {
    let raw = std::env::var(key).ok();
    parse_ttl(key, raw.as_deref(), default)
}

/// Parse a lifetime in seconds. Must be positive and at most [`MAX_TTL_SECS`].
fn parse_ttl(key: &str, raw: Option<&str>, default: i64) -> Result<Duration> {
    let secs = match raw {
        Some(value) => value
            .trim()
            .parse::<i64>()
            .map_err(|_| DiaryError::Config(format!("{} must be a number, got {:?}", key, value)))?,
        None => default,
    };
    if !(1..=MAX_TTL_SECS).contains(&secs) {
        return Err(DiaryError::Config(format!(
            "{} must be between 1 and {} seconds, got {}",
            key, MAX_TTL_SECS, secs
        )));
    }
    Duration::try_seconds(secs)
        .ok_or_else(|| DiaryError::Config(format!("{} is out of range", key)))
}

fn env_number<T: std::str::FromStr>(key: &str, default: T) -> Result<T> {
    match std::env::var(key) {
        Ok(value) => value
            .trim()
            .parse()
            .map_err(|_| DiaryError::Config(format!("{} must be a number, got {:?}", key, value))),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn links_use_public_url() {
        let config = Config::local(PathBuf::from("x.db"));
        assert_eq!(config.share_link("AbC123xyZ0"), "http://localhost:3000/s/AbC123xyZ0");
        assert_eq!(
            config.login_link("tok"),
            "http://localhost:3000/auth/verify?token=tok"
        );
        assert!(!config.secure_cookies());
    }

    #[test]
    fn ttl_defaults_and_overrides() {
        assert_eq!(parse_ttl("TTL", None, 3600).unwrap(), Duration::hours(1));
        assert_eq!(parse_ttl("TTL", Some(" 60 "), 3600).unwrap(), Duration::minutes(1));
        assert_eq!(
            parse_ttl("TTL", Some(&MAX_TTL_SECS.to_string()), 3600).unwrap(),
            Duration::seconds(MAX_TTL_SECS)
        );
    }

    #[test]
    fn ttl_out_of_range_is_a_config_error() {
        for raw in ["0", "-5", "1000000000000", "9223372036854775807", "soon"] {
            assert!(
                matches!(parse_ttl("TTL", Some(raw), 3600), Err(DiaryError::Config(_))),
                "accepted {raw}"
            );
        }
    }

    #[test]
    fn allow_list_is_case_insensitive() {
        let mut config = Config::local(PathBuf::from("x.db"));
        assert!(config.is_admin_email("anyone@example.com"));

        config.admin_emails = parse_email_list(" Me@Example.com , ,other@example.com");
        assert_eq!(config.admin_emails.len(), 2);
        assert!(config.is_admin_email("me@example.com"));
        assert!(config.is_admin_email("ME@example.COM"));
        assert!(!config.is_admin_email("stranger@example.com"));
    }
}
