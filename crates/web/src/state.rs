//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::BlogConfig;
use crate::github::GithubClient;
use crate::services::admin::AdminGate;
use crate::uploads::UploadStore;

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`. Holds the pool, the GitHub client, the
/// admin gate (and with it the login cache) for the life of the process.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: BlogConfig,
    pool: PgPool,
    github: GithubClient,
    admin_gate: AdminGate<GithubClient>,
    uploads: UploadStore,
    http: reqwest::Client,
}

impl AppState {
    /// Create a new application state.
    #[must_use]
    pub fn new(config: BlogConfig, pool: PgPool) -> Self {
        let github = GithubClient::new(&config.github);
        let admin_gate = AdminGate::new(config.github.admin_username.clone(), github.clone());
        let uploads = UploadStore::new(config.uploads.dir.clone());

        Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                github,
                admin_gate,
                uploads,
                http: reqwest::Client::new(),
            }),
        }
    }

    /// Get a reference to the blog configuration.
    #[must_use]
    pub fn config(&self) -> &BlogConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Get a reference to the GitHub client.
    #[must_use]
    pub fn github(&self) -> &GithubClient {
        &self.inner.github
    }

    /// The admin check, with its process-wide login cache.
    #[must_use]
    pub fn admin_gate(&self) -> &AdminGate<GithubClient> {
        &self.inner.admin_gate
    }

    /// Get a reference to the upload directory.
    #[must_use]
    pub fn uploads(&self) -> &UploadStore {
        &self.inner.uploads
    }

    /// Plain HTTP client for the image proxy.
    #[must_use]
    pub fn http(&self) -> &reqwest::Client {
        &self.inner.http
    }
}
