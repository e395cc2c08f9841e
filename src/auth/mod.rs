//! Passwordless authentication: emailed one-time login links and sessions.
//!
//! The [`AuthService`] is the single owner of session state for the process.
//! Every transition (sign-in, sign-out, expiry) is published on a broadcast
//! channel; the server keeps one watcher subscribed for its whole lifetime
//! and cancels it on shutdown.

pub mod mailer;

use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::{DateTime, Duration, Utc};
use lettre::Address;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::db;
use crate::error::{DiaryError, Result};
use crate::models::Session;
use crate::store::Store;
use crate::token;

pub use mailer::Mailer;

const EVENT_CAPACITY: usize = 64;
const SWEEP_INTERVAL: StdDuration = StdDuration::from_secs(300);

fn expiry(now: DateTime<Utc>, ttl: Duration) -> Result<DateTime<Utc>> {
    now.checked_add_signed(ttl)
        .ok_or_else(|| DiaryError::Config(format!("lifetime of {}s is out of range", ttl.num_seconds())))
}

/// A change in session state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    SignedIn { email: String },
    SignedOut { email: String },
    Expired { email: String },
}

/// A freshly created session together with the raw token for the cookie.
#[derive(Debug, Clone)]
pub struct IssuedSession {
    pub token: String,
    pub session: Session,
}

pub struct AuthService {
    store: Store,
    config: Arc<Config>,
    mailer: Arc<dyn Mailer>,
    events: broadcast::Sender<SessionEvent>,
}

impl AuthService {
    pub fn new(store: Store, config: Arc<Config>, mailer: Arc<dyn Mailer>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            store,
            config,
            mailer,
            events,
        }
    }

    /// Email a one-time login link. The link always lands on `/admin`.
    pub async fn request_login_link(&self, email: &str) -> Result<()> {
        let email = email.trim();
        let address: Address = email
            .parse()
            .map_err(|_| DiaryError::InvalidEmail(email.to_string()))?;

        if !self.config.is_admin_email(email) {
            tracing::warn!(email = %email, "login link refused: address not allowed");
            return Err(DiaryError::SignupsNotAllowed);
        }

        let raw = token::generate(token::AUTH_TOKEN_LEN);
        let token_hash = token::digest(&raw);
        let expires_at = expiry(Utc::now(), self.config.login_link_ttl)?;
        let owner = email.to_lowercase();
        self.store
            .run(move |conn| db::insert_login_link(conn, &token_hash, &owner, expires_at))
            .await?;

        let link = self.config.login_link(&raw);
        self.mailer.send_login_link(&address, &link).await?;
        tracing::info!(email = %email, "login link requested");
        Ok(())
    }

    /// Consume a login link and open a session for its owner.
    pub async fn verify_login_link(&self, raw: &str) -> Result<IssuedSession> {
        let token_hash = token::digest(raw);
        let email = self
            .store
            .run(move |conn| db::take_login_link(conn, &token_hash, Utc::now()))
            .await?
            .ok_or(DiaryError::InvalidLoginLink)?;

        let now = Utc::now();
        let session = Session {
            email: email.clone(),
            created_at: now,
            expires_at: expiry(now, self.config.session_ttl)?,
        };
        let session_token = token::generate(token::AUTH_TOKEN_LEN);
        let session_hash = token::digest(&session_token);
        let stored = session.clone();
        self.store
            .run(move |conn| db::insert_session(conn, &session_hash, &stored))
            .await?;

        self.publish(SessionEvent::SignedIn { email });
        Ok(IssuedSession {
            token: session_token,
            session,
        })
    }

    /// Resolve the session behind a raw session token.
    pub async fn current_session(&self, raw: &str) -> Result<Option<Session>> {
        let token_hash = token::digest(raw);
        self.store
            .run(move |conn| db::get_session(conn, &token_hash, Utc::now()))
            .await
    }

    pub async fn sign_out(&self, raw: &str) -> Result<()> {
        let token_hash = token::digest(raw);
        let email = self
            .store
            .run(move |conn| db::delete_session(conn, &token_hash))
            .await?;
        if let Some(email) = email {
            self.publish(SessionEvent::SignedOut { email });
        }
        Ok(())
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    /// Remove expired sessions and login links, publishing an event per expired session.
    pub async fn sweep_expired(&self) -> Result<usize> {
        let emails = self
            .store
            .run(|conn| db::purge_expired(conn, Utc::now()))
            .await?;
        let count = emails.len();
        for email in emails {
            self.publish(SessionEvent::Expired { email });
        }
        Ok(count)
    }

    fn publish(&self, event: SessionEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }

    /// Watch session events for the lifetime of the server, sweeping expired
    /// state periodically. Stops when `shutdown` is cancelled.
    pub fn spawn_watcher(self: Arc<Self>, shutdown: CancellationToken) -> JoinHandle<()> {
        let mut events = self.subscribe();
        tokio::spawn(async move {
            let mut sweep = tokio::time::interval(SWEEP_INTERVAL);
            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => break,
                    event = events.recv() => match event {
                        Ok(SessionEvent::SignedIn { email }) => tracing::info!(email = %email, "session started"),
                        Ok(SessionEvent::SignedOut { email }) => tracing::info!(email = %email, "session ended"),
                        Ok(SessionEvent::Expired { email }) => tracing::info!(email = %email, "session expired"),
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            tracing::warn!(skipped, "session watcher lagged");
                        }
                        Err(broadcast::error::RecvError::Closed) => break,
                    },
                    _ = sweep.tick() => {
                        if let Err(err) = self.sweep_expired().await {
                            tracing::warn!(error = %err, "failed to sweep expired sessions");
                        }
                    }
                }
            }
            tracing::debug!("session watcher stopped");
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::path::PathBuf;

    #[derive(Default)]
    struct RecordingMailer {
        sent: Mutex<Vec<(String, String)>>,
    }

    impl RecordingMailer {
        fn last_token(&self) -> String {
            let sent = self.sent.lock();
            let (_, link) = sent.last().expect("no mail sent");
            link.split("token=").nth(1).unwrap().to_string()
        }
    }

    #[async_trait]
    impl Mailer for RecordingMailer {
        async fn send_login_link(&self, to: &Address, link: &str) -> Result<()> {
            self.sent.lock().push((to.to_string(), link.to_string()));
            Ok(())
        }
    }

    struct FailingMailer;

    #[async_trait]
    impl Mailer for FailingMailer {
        async fn send_login_link(&self, _to: &Address, _link: &str) -> Result<()> {
            Err(DiaryError::Mail("connection refused".to_string()))
        }
    }

    fn service_with(config: Config, mailer: Arc<dyn Mailer>) -> AuthService {
        AuthService::new(Store::in_memory().unwrap(), Arc::new(config), mailer)
    }

    #[tokio::test]
    async fn login_link_round_trip() {
        let mailer = Arc::new(RecordingMailer::default());
        let auth = service_with(Config::local(PathBuf::from(":memory:")), mailer.clone());
        let mut events = auth.subscribe();

        auth.request_login_link("  me@example.com ").await.unwrap();
        {
            let sent = mailer.sent.lock();
            assert_eq!(sent.len(), 1);
            assert_eq!(sent[0].0, "me@example.com");
            assert!(sent[0].1.starts_with("http://localhost:3000/auth/verify?token="));
        }

        let issued = auth.verify_login_link(&mailer.last_token()).await.unwrap();
        assert_eq!(issued.session.email, "me@example.com");
        assert_eq!(
            events.recv().await.unwrap(),
            SessionEvent::SignedIn {
                email: "me@example.com".to_string()
            }
        );

        let session = auth.current_session(&issued.token).await.unwrap();
        assert_eq!(session.map(|s| s.email).as_deref(), Some("me@example.com"));
    }

    #[tokio::test]
    async fn login_link_cannot_be_reused() {
        let mailer = Arc::new(RecordingMailer::default());
        let auth = service_with(Config::local(PathBuf::from(":memory:")), mailer.clone());
        auth.request_login_link("me@example.com").await.unwrap();
        let raw = mailer.last_token();

        auth.verify_login_link(&raw).await.unwrap();
        assert!(matches!(
            auth.verify_login_link(&raw).await,
            Err(DiaryError::InvalidLoginLink)
        ));
        assert!(matches!(
            auth.verify_login_link("made-up").await,
            Err(DiaryError::InvalidLoginLink)
        ));
    }

    #[tokio::test]
    async fn invalid_and_disallowed_addresses() {
        let mut config = Config::local(PathBuf::from(":memory:"));
        config.admin_emails.insert("me@example.com".to_string());
        let mailer = Arc::new(RecordingMailer::default());
        let auth = service_with(config, mailer.clone());

        assert!(matches!(
            auth.request_login_link("nope").await,
            Err(DiaryError::InvalidEmail(_))
        ));
        assert!(matches!(
            auth.request_login_link("stranger@example.com").await,
            Err(DiaryError::SignupsNotAllowed)
        ));
        assert!(mailer.sent.lock().is_empty());

        auth.request_login_link("Me@Example.com").await.unwrap();
        assert_eq!(mailer.sent.lock().len(), 1);
    }

    #[tokio::test]
    async fn mail_failure_is_reported() {
        let auth = service_with(
            Config::local(PathBuf::from(":memory:")),
            Arc::new(FailingMailer),
        );
        let err = auth.request_login_link("me@example.com").await.unwrap_err();
        assert_eq!(err.to_string(), "Failed to send email: connection refused");
    }

    #[tokio::test]
    async fn sign_out_ends_session_and_notifies() {
        let mailer = Arc::new(RecordingMailer::default());
        let auth = service_with(Config::local(PathBuf::from(":memory:")), mailer.clone());
        auth.request_login_link("me@example.com").await.unwrap();
        let issued = auth.verify_login_link(&mailer.last_token()).await.unwrap();

        let mut events = auth.subscribe();
        auth.sign_out(&issued.token).await.unwrap();
        assert_eq!(
            events.recv().await.unwrap(),
            SessionEvent::SignedOut {
                email: "me@example.com".to_string()
            }
        );
        assert!(auth.current_session(&issued.token).await.unwrap().is_none());

        // Signing out twice is harmless.
        auth.sign_out(&issued.token).await.unwrap();
    }

    #[tokio::test]
    async fn expired_sessions_are_swept() {
        let mut config = Config::local(PathBuf::from(":memory:"));
        config.session_ttl = chrono::Duration::seconds(-1);
        let mailer = Arc::new(RecordingMailer::default());
        let auth = service_with(config, mailer.clone());
        auth.request_login_link("me@example.com").await.unwrap();
        let issued = auth.verify_login_link(&mailer.last_token()).await.unwrap();
        assert!(auth.current_session(&issued.token).await.unwrap().is_none());

        let mut events = auth.subscribe();
        assert_eq!(auth.sweep_expired().await.unwrap(), 1);
        assert_eq!(
            events.recv().await.unwrap(),
            SessionEvent::Expired {
                email: "me@example.com".to_string()
            }
        );
    }

    #[tokio::test]
    async fn oversized_session_lifetime_is_an_error() {
        let mut config = Config::local(PathBuf::from(":memory:"));
        config.session_ttl = Duration::try_days(100_000_000).unwrap();
        let mailer = Arc::new(RecordingMailer::default());
        let auth = service_with(config, mailer.clone());
        auth.request_login_link("me@example.com").await.unwrap();
        assert!(matches!(
            auth.verify_login_link(&mailer.last_token()).await,
            Err(DiaryError::Config(_))
        ));
    }

    #[tokio::test]
    async fn watcher_stops_on_shutdown() {
        let auth = Arc::new(service_with(
            Config::local(PathBuf::from(":memory:")),
            Arc::new(RecordingMailer::default()),
        ));
        let shutdown = CancellationToken::new();
        let handle = auth.clone().spawn_watcher(shutdown.clone());
        shutdown.cancel();
        tokio::time::timeout(StdDuration::from_secs(5), handle)
            .await
            .unwrap()
            .unwrap();
    }
}
