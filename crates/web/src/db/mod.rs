//! Database operations for the blog `PostgreSQL` database.
//!
//! ## Tables
//!
//! - `users` - Local users, created on first GitHub sign-in
//! - `accounts` - Linked OAuth identities (`provider`, `provider_account_id`)
//! - `categories` - Post categories with unique name and slug
//! - `posts` - Markdown posts, draft or published
//! - `tags` / `post_tags` - Free-form tags, created on first use
//! - `tower_sessions.session` - Session storage (managed by `tower-sessions-sqlx-store`)
//!
//! # Migrations
//!
//! Migrations are stored in `crates/web/migrations/` and run via:
//! ```bash
//! cargo run -p techblog-cli -- migrate
//! ```
//!
//! Queries are checked at runtime (`sqlx::query_as::<_, Row>`) so the crate
//! builds without a live database.

pub mod accounts;
pub mod categories;
pub mod posts;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::error::ErrorKind;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use accounts::AccountRepository;
pub use categories::CategoryRepository;
pub use posts::{AdminPostQuery, AdminSort, PostRepository, PostStats, SortDirection};

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., duplicate slug, unknown category).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Map unique and foreign-key violations to [`RepositoryError::Conflict`].
///
/// `what` names the thing that already exists, e.g. `"slug"`.
pub(crate) fn map_constraint_error(err: sqlx::Error, what: &str) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = err {
        match db_err.kind() {
            ErrorKind::UniqueViolation => {
                return RepositoryError::Conflict(format!("{what} already exists"));
            }
            ErrorKind::ForeignKeyViolation => {
                return RepositoryError::Conflict("referenced row does not exist".to_owned());
            }
            _ => {}
        }
    }
    RepositoryError::Database(err)
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
