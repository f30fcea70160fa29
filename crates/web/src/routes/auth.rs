//! GitHub OAuth route handlers.
//!
//! - Login: stores a CSRF state and redirects to GitHub
//! - Callback: checks the state, exchanges the code, links the account and
//!   stores the user in the session
//! - Logout: flushes the session

use axum::{
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use rand::Rng;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use techblog_core::Email;

use crate::db::AccountRepository;
use crate::error::{clear_sentry_user, set_sentry_user};
use crate::github::{GithubClient, GithubError, preferred_email};
use crate::middleware::{clear_current_user, set_current_user};
use crate::models::session::keys;
use crate::models::{CurrentUser, GithubIdentity};
use crate::state::AppState;

/// Where a successful sign-in lands when no admin page was requested.
const DEFAULT_RETURN_TO: &str = "/admin";

const STATE_LENGTH: usize = 32;

/// Query parameters from the GitHub OAuth callback.
#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

/// Random alphanumeric string for the OAuth `state`.
fn generate_state() -> String {
    rand::rng()
        .sample_iter(rand::distr::Alphanumeric)
        .take(STATE_LENGTH)
        .map(char::from)
        .collect()
}

fn redirect_uri(state: &AppState) -> String {
    format!("{}/auth/github/callback", state.config().base_url)
}

fn error_redirect(code: &str) -> Response {
    Redirect::to(&format!("/?error={code}")).into_response()
}

/// Only same-site absolute paths are followed after sign-in.
fn safe_return_to(target: Option<String>) -> String {
    target
        .filter(|t| t.starts_with('/') && !t.starts_with("//") && !t.contains('\\'))
        .unwrap_or_else(|| DEFAULT_RETURN_TO.to_owned())
}

/// Start GitHub sign-in.
///
/// # Route
///
/// `GET /auth/github/login`
#[instrument(skip_all)]
pub async fn login(State(state): State<AppState>, session: Session) -> Response {
    let oauth_state = generate_state();

    if let Err(e) = session.insert(keys::GITHUB_OAUTH_STATE, &oauth_state).await {
        tracing::error!(error = %e, "failed to store OAuth state in session");
        return error_redirect("session");
    }

    let url = state
        .github()
        .authorization_url(&redirect_uri(&state), &oauth_state);
    Redirect::to(&url).into_response()
}

/// Handle the GitHub OAuth callback.
///
/// # Route
///
/// `GET /auth/github/callback`
#[instrument(skip_all)]
pub async fn callback(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<CallbackQuery>,
) -> Response {
    if let Some(error) = query.error {
        let description = query.error_description.unwrap_or_default();
        tracing::warn!(%error, %description, "GitHub OAuth error");
        return error_redirect("github_denied");
    }

    let Some(code) = query.code else {
        tracing::warn!("GitHub OAuth callback missing code");
        return error_redirect("missing_code");
    };

    let Some(returned_state) = query.state else {
        tracing::warn!("GitHub OAuth callback missing state");
        return error_redirect("missing_state");
    };

    let stored_state: Option<String> = session
        .remove(keys::GITHUB_OAUTH_STATE)
        .await
        .ok()
        .flatten();

    if stored_state.as_deref() != Some(returned_state.as_str()) {
        tracing::warn!("GitHub OAuth state mismatch");
        return error_redirect("invalid_state");
    }

    let identity = match fetch_identity(state.github(), &code, &redirect_uri(&state)).await {
        Ok(identity) => identity,
        Err(e) => {
            tracing::error!(error = %e, "GitHub sign-in failed");
            return error_redirect("token_exchange");
        }
    };

    let user = match AccountRepository::new(state.pool()).link_github(&identity).await {
        Ok(user) => user,
        Err(e) => {
            tracing::error!(error = %e, login = %identity.login, "failed to link GitHub account");
            return error_redirect("account");
        }
    };

    let current = CurrentUser {
        id: user.id,
        email: user.email,
        name: user.name.or_else(|| Some(identity.login.clone())),
        avatar_url: user.image,
    };

    let return_to: Option<String> = session.remove(keys::RETURN_TO).await.ok().flatten();

    if let Err(e) = set_current_user(&session, &current).await {
        tracing::error!(error = %e, "failed to store user in session");
        return error_redirect("session");
    }

    set_sentry_user(&current.id, current.email.as_ref().map(Email::as_str));
    tracing::info!(user_id = %current.id, login = %identity.login, "signed in with GitHub");

    Redirect::to(&safe_return_to(return_to)).into_response()
}

/// Exchange the code and collect the profile.
async fn fetch_identity(
    github: &GithubClient,
    code: &str,
    redirect_uri: &str,
) -> Result<GithubIdentity, GithubError> {
    let token = github.exchange_code(code, redirect_uri).await?;
    let profile = github.current_user(&token).await?;

    let email = match profile.email.filter(|e| !e.is_empty()) {
        Some(email) => Some(email),
        None => match github.emails(&token).await {
            Ok(emails) => preferred_email(&emails).map(str::to_owned),
            Err(e) => {
                tracing::warn!(error = %e, "could not list GitHub emails");
                None
            }
        },
    };

    Ok(GithubIdentity {
        account_id: profile.id.to_string(),
        login: profile.login,
        name: profile.name.filter(|n| !n.trim().is_empty()),
        email: email.and_then(|e| Email::parse(&e).ok()),
        avatar_url: profile.avatar_url,
    })
}

/// Sign out.
///
/// # Route
///
/// `POST /auth/logout`
#[instrument(skip_all)]
pub async fn logout(session: Session) -> Response {
    if let Err(e) = clear_current_user(&session).await {
        tracing::warn!(error = %e, "failed to flush session on logout");
    }
    clear_sentry_user();
    Redirect::to("/").into_response()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_state() {
        let a = generate_state();
        let b = generate_state();
        assert_eq!(a.len(), STATE_LENGTH);
        assert!(a.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(a, b);
    }

    #[test]
    fn test_safe_return_to() {
        assert_eq!(safe_return_to(None), "/admin");
        assert_eq!(safe_return_to(Some("/admin/posts?status=draft".into())), "/admin/posts?status=draft");
        assert_eq!(safe_return_to(Some("//evil.example".into())), "/admin");
        assert_eq!(safe_return_to(Some("https://evil.example".into())), "/admin");
        assert_eq!(safe_return_to(Some("/\\evil.example".into())), "/admin");
    }

    #[test]
    fn test_error_redirect() {
        let response = error_redirect("invalid_state");
        assert_eq!(response.headers()["location"], "/?error=invalid_state");
    }
}
