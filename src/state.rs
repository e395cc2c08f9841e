//! Application state shared across all request handlers.

use std::sync::Arc;

use crate::auth::{AuthService, Mailer};
use crate::config::Config;
use crate::guard::SubmissionGuard;
use crate::store::Store;

/// Shared application state available to all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Arc<Config>,

    /// Entry and session storage.
    pub store: Store,

    /// Login links, sessions and session-change notifications.
    pub auth: Arc<AuthService>,

    /// Single-flight guard for admin form submissions.
    pub guard: SubmissionGuard,
}

impl AppState {
    pub fn new(config: Config, store: Store, mailer: Arc<dyn Mailer>) -> Self {
        let config = Arc::new(config);
        let auth = Arc::new(AuthService::new(store.clone(), config.clone(), mailer));
        Self {
            config,
            store,
            auth,
            guard: SubmissionGuard::new(),
        }
    }
}
