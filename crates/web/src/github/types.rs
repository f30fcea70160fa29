//! GitHub REST API response types.

use serde::Deserialize;

/// `GET /user` and `GET /user/{id}`.
///
/// Only the fields the blog reads are declared.
#[derive(Debug, Clone, Deserialize)]
pub struct GithubUser {
    pub id: u64,
    pub login: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

/// One entry of `GET /user/emails`.
#[derive(Debug, Clone, Deserialize)]
pub struct GithubEmail {
    pub email: String,
    #[serde(default)]
    pub primary: bool,
    #[serde(default)]
    pub verified: bool,
}

/// Body of `POST https://github.com/login/oauth/access_token`.
///
/// GitHub answers `200 OK` even for a bad code; failures carry `error`.
#[derive(Debug, Deserialize)]
pub(crate) struct TokenResponse {
    pub access_token: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

/// Pick the address to store for a user whose profile email is hidden.
///
/// Prefers the primary verified address, then any verified one.
#[must_use]
pub fn preferred_email(emails: &[GithubEmail]) -> Option<&str> {
    emails
        .iter()
        .find(|e| e.primary && e.verified)
        .or_else(|| emails.iter().find(|e| e.verified))
        .map(|e| e.email.as_str())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_user_deserializes_with_missing_optionals() {
        let user: GithubUser =
            serde_json::from_str(r#"{"id": 583231, "login": "octocat"}"#).unwrap();
        assert_eq!(user.id, 583_231);
        assert_eq!(user.login, "octocat");
        assert!(user.email.is_none());
    }

    #[test]
    fn test_user_deserializes_null_name() {
        let user: GithubUser = serde_json::from_str(
            r#"{"id": 1, "login": "a", "name": null, "avatar_url": "https://avatars.githubusercontent.com/u/1"}"#,
        )
        .unwrap();
        assert!(user.name.is_none());
        assert!(user.avatar_url.is_some());
    }

    #[test]
    fn test_preferred_email() {
        let emails: Vec<GithubEmail> = serde_json::from_str(
            r#"[
                {"email": "old@example.com", "primary": false, "verified": true},
                {"email": "main@example.com", "primary": true, "verified": true}
            ]"#,
        )
        .unwrap();
        assert_eq!(preferred_email(&emails), Some("main@example.com"));
    }

    #[test]
    fn test_preferred_email_skips_unverified() {
        let emails = vec![GithubEmail {
            email: "x@example.com".into(),
            primary: true,
            verified: false,
        }];
        assert_eq!(preferred_email(&emails), None);
    }

    #[test]
    fn test_token_response_error() {
        let body: TokenResponse = serde_json::from_str(
            r#"{"error": "bad_verification_code", "error_description": "The code passed is incorrect or expired."}"#,
        )
        .unwrap();
        assert!(body.access_token.is_none());
        assert_eq!(body.error.as_deref(), Some("bad_verification_code"));
    }
}
