//! GitHub OAuth and REST API client.
//!
//! Used for three things:
//! - the OAuth sign-in flow (authorize URL, code exchange)
//! - reading the signed-in user's profile and emails
//! - resolving a stable account ID to its current login for the admin check
//!
//! Every request carries a `User-Agent`; GitHub rejects requests without one.

pub mod types;

use std::sync::Arc;

use reqwest::header::{ACCEPT, AUTHORIZATION, USER_AGENT};
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use tracing::{debug, instrument};

use crate::config::GithubConfig;

pub use types::{GithubEmail, GithubUser, preferred_email};
use types::TokenResponse;

const OAUTH_AUTHORIZE_URL: &str = "https://github.com/login/oauth/authorize";
const OAUTH_TOKEN_URL: &str = "https://github.com/login/oauth/access_token";
const OAUTH_SCOPE: &str = "read:user user:email";
const CLIENT_USER_AGENT: &str = concat!("techblog/", env!("CARGO_PKG_VERSION"));
const API_ACCEPT: &str = "application/vnd.github+json";

/// Errors that can occur when talking to GitHub.
#[derive(Debug, Error)]
pub enum GithubError {
    /// Transport failure or undecodable body.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// GitHub answered with a non-success status.
    #[error("GitHub returned {0}")]
    Status(reqwest::StatusCode),

    /// The OAuth token exchange was refused.
    #[error("OAuth error: {0}")]
    OAuth(String),
}

/// Client for GitHub OAuth and the REST API.
#[derive(Clone)]
pub struct GithubClient {
    inner: Arc<GithubClientInner>,
}

struct GithubClientInner {
    client: reqwest::Client,
    client_id: String,
    client_secret: SecretString,
    api_url: String,
}

impl GithubClient {
    /// Create a new GitHub client.
    #[must_use]
    pub fn new(config: &GithubConfig) -> Self {
        Self {
            inner: Arc::new(GithubClientInner {
                client: reqwest::Client::new(),
                client_id: config.client_id.clone(),
                client_secret: config.client_secret.clone(),
                api_url: config.api_url.trim_end_matches('/').to_owned(),
            }),
        }
    }

    /// URL to send the browser to for sign-in.
    #[must_use]
    pub fn authorization_url(&self, redirect_uri: &str, state: &str) -> String {
        format!(
            "{OAUTH_AUTHORIZE_URL}?\
            client_id={}&\
            redirect_uri={}&\
            scope={}&\
            state={}",
            urlencoding::encode(&self.inner.client_id),
            urlencoding::encode(redirect_uri),
            urlencoding::encode(OAUTH_SCOPE),
            urlencoding::encode(state)
        )
    }

    /// Exchange an authorization code for an access token.
    ///
    /// # Errors
    ///
    /// Returns `GithubError::OAuth` if GitHub refuses the code.
    /// Returns `GithubError::Http` or `GithubError::Status` on transport failure.
    #[instrument(skip_all)]
    pub async fn exchange_code(
        &self,
        code: &str,
        redirect_uri: &str,
    ) -> Result<SecretString, GithubError> {
        let params = [
            ("client_id", self.inner.client_id.as_str()),
            ("client_secret", self.inner.client_secret.expose_secret()),
            ("code", code),
            ("redirect_uri", redirect_uri),
        ];

        let response = self
            .inner
            .client
            .post(OAUTH_TOKEN_URL)
            .header(ACCEPT, "application/json")
            .header(USER_AGENT, CLIENT_USER_AGENT)
            .form(&params)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(GithubError::Status(response.status()));
        }

        let body: TokenResponse = response.json().await?;
        match (body.access_token, body.error) {
            (Some(token), None) => Ok(SecretString::from(token)),
            (_, Some(error)) => Err(GithubError::OAuth(format!(
                "{error}: {}",
                body.error_description.unwrap_or_default()
            ))),
            (None, None) => Err(GithubError::OAuth("no access token in response".to_owned())),
        }
    }

    /// Profile of the user the token belongs to.
    ///
    /// # Errors
    ///
    /// Returns `GithubError` if the request fails or GitHub answers non-2xx.
    #[instrument(skip_all)]
    pub async fn current_user(&self, token: &SecretString) -> Result<GithubUser, GithubError> {
        let url = format!("{}/user", self.inner.api_url);
        let response = self
            .inner
            .client
            .get(&url)
            .header(ACCEPT, API_ACCEPT)
            .header(USER_AGENT, CLIENT_USER_AGENT)
            .header(AUTHORIZATION, format!("Bearer {}", token.expose_secret()))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(GithubError::Status(response.status()));
        }
        Ok(response.json().await?)
    }

    /// Email addresses of the user the token belongs to (needs `user:email`).
    ///
    /// # Errors
    ///
    /// Returns `GithubError` if the request fails or GitHub answers non-2xx.
    #[instrument(skip_all)]
    pub async fn emails(&self, token: &SecretString) -> Result<Vec<GithubEmail>, GithubError> {
        let url = format!("{}/user/emails", self.inner.api_url);
        let response = self
            .inner
            .client
            .get(&url)
            .header(ACCEPT, API_ACCEPT)
            .header(USER_AGENT, CLIENT_USER_AGENT)
            .header(AUTHORIZATION, format!("Bearer {}", token.expose_secret()))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(GithubError::Status(response.status()));
        }
        Ok(response.json().await?)
    }

    /// Current login of the account with the given numeric ID.
    ///
    /// Unauthenticated, so it counts against GitHub's anonymous rate limit.
    ///
    /// # Errors
    ///
    /// Returns `GithubError` if the request fails or GitHub answers non-2xx.
    #[instrument(skip(self))]
    pub async fn fetch_login(&self, account_id: &str) -> Result<String, GithubError> {
        let url = format!(
            "{}/user/{}",
            self.inner.api_url,
            urlencoding::encode(account_id)
        );
        let response = self
            .inner
            .client
            .get(&url)
            .header(ACCEPT, API_ACCEPT)
            .header(USER_AGENT, CLIENT_USER_AGENT)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(GithubError::Status(response.status()));
        }

        let user: GithubUser = response.json().await?;
        debug!(login = %user.login, "resolved GitHub login");
        Ok(user.login)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> GithubClient {
        GithubClient::new(&GithubConfig {
            client_id: "Iv1.abc123".to_owned(),
            client_secret: SecretString::from("s3cr3t-value".to_owned()),
            api_url: "https://api.github.com/".to_owned(),
            admin_username: None,
        })
    }

    #[test]
    fn test_authorization_url_encodes_params() {
        let url = client().authorization_url("http://localhost:3000/auth/github/callback", "xyz");
        assert!(url.starts_with("https://github.com/login/oauth/authorize?client_id=Iv1.abc123&"));
        assert!(url.contains("redirect_uri=http%3A%2F%2Flocalhost%3A3000%2Fauth%2Fgithub%2Fcallback"));
        assert!(url.contains("scope=read%3Auser%20user%3Aemail"));
        assert!(url.ends_with("&state=xyz"));
    }

    #[test]
    fn test_api_url_trailing_slash_trimmed() {
        assert_eq!(client().inner.api_url, "https://api.github.com");
    }

    #[test]
    fn test_user_agent_is_set() {
        assert!(CLIENT_USER_AGENT.starts_with("techblog/"));
    }
}
