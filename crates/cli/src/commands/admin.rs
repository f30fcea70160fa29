//! Admin check diagnostics.
//!
//! ```bash
//! techblog-cli admin check 583231
//! techblog-cli admin user 1
//! ```
//!
//! # Environment Variables
//!
//! - `AUTH_GITHUB_ID` / `AUTH_GITHUB_SECRET` - OAuth app credentials
//! - `GITHUB_API_URL` - REST API root (default `https://api.github.com`)
//! - `ADMIN_GITHUB_USERNAME` - the admin login
//! - `BLOG_DATABASE_URL` - only for `admin user`

use thiserror::Error;

use techblog_core::UserId;
use techblog_web::config::{ConfigError, GithubConfig};
use techblog_web::db::{AccountRepository, RepositoryError};
use techblog_web::github::GithubClient;
use techblog_web::services::admin::{AdminDenied, AdminGate};

use super::{CommandError, connect};

#[derive(Debug, Error)]
pub enum AdminError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Not the admin: {0}")]
    Denied(#[from] AdminDenied),

    #[error(transparent)]
    Command(#[from] CommandError),

    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),

    #[error("No user with id {0}")]
    UnknownUser(UserId),
}

/// Resolve `account_id` through GitHub and compare it to the admin login.
///
/// Runs with an empty cache, so a GitHub failure is reported as such.
///
/// # Errors
///
/// Returns `AdminError::Denied` with the reason when the account is not the admin.
pub async fn check(account_id: &str) -> Result<(), AdminError> {
    dotenvy::dotenv().ok();

    let config = GithubConfig::from_env()?;
    let github = GithubClient::new(&config);
    let gate = AdminGate::new(config.admin_username.clone(), github);

    let login = gate.resolve_login(account_id).await?;
    tracing::info!(%account_id, %login, "resolved GitHub login");

    gate.check_account(account_id).await?;

    #[allow(clippy::print_stdout)]
    {
        println!("{account_id} -> {login}: admin");
    }
    Ok(())
}

/// Run the same check for a local user, going through its linked account.
///
/// # Errors
///
/// Returns `AdminError::UnknownUser` for a missing user and
/// `AdminError::Denied` when the user is not the admin.
pub async fn check_user(user_id: i32) -> Result<(), AdminError> {
    let pool = connect().await?;
    let accounts = AccountRepository::new(&pool);

    let user_id = UserId::new(user_id);
    let user = accounts
        .get_user(user_id)
        .await?
        .ok_or(AdminError::UnknownUser(user_id))?;
    tracing::info!(
        user_id = %user.id,
        name = user.name.as_deref().unwrap_or("-"),
        "found user"
    );

    let account_id = accounts
        .find_github_account_id(user.id)
        .await?
        .ok_or(AdminDenied::NoLinkedAccount)?;

    check(&account_id).await
}
