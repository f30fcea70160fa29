//! Email address type.
//!
//! GitHub is the only identity provider, so an email arrives either on the
//! public profile or from the `/user/emails` listing. Both paths go through
//! [`Email::parse`] before reaching the session or the `users` table.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing an [`Email`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum EmailError {
    #[error("email cannot be empty")]
    Empty,
    #[error("email must be at most {max} characters")]
    TooLong { max: usize },
    #[error("email must have the form local@domain")]
    Malformed,
}

/// A trimmed email address with a non-empty local part and domain.
///
/// ```
/// use techblog_core::Email;
///
/// assert!(Email::parse("octocat@github.com").is_ok());
/// assert!(Email::parse("  octocat@github.com ").is_ok());
/// assert!(Email::parse("octocat").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(feature = "postgres", sqlx(transparent))]
#[serde(transparent)]
pub struct Email(String);

impl Email {
    /// Maximum length of an email address (RFC 5321).
    pub const MAX_LENGTH: usize = 254;

    /// Domain GitHub uses for private "noreply" addresses.
    pub const GITHUB_NOREPLY_DOMAIN: &'static str = "users.noreply.github.com";

    /// Parse an `Email` from a string, trimming surrounding whitespace.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is empty, longer than 254 characters,
    /// or does not split into a non-empty local part and domain at its last `@`.
    pub fn parse(s: &str) -> Result<Self, EmailError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(EmailError::Empty);
        }
        if s.len() > Self::MAX_LENGTH {
            return Err(EmailError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }

        match s.rsplit_once('@') {
            Some((local, domain)) if !local.is_empty() && !domain.is_empty() => {
                Ok(Self(s.to_owned()))
            }
            _ => Err(EmailError::Malformed),
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }

    /// Returns the part after the last `@`.
    #[must_use]
    pub fn domain(&self) -> &str {
        self.0.rsplit_once('@').map_or("", |(_, domain)| domain)
    }

    /// Whether this is a GitHub-generated private address.
    #[must_use]
    pub fn is_github_noreply(&self) -> bool {
        self.domain().eq_ignore_ascii_case(Self::GITHUB_NOREPLY_DOMAIN)
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for Email {
    type Err = EmailError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<str> for Email {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_trims_whitespace() {
        let email = Email::parse("  octocat@github.com\n").unwrap();
        assert_eq!(email.as_str(), "octocat@github.com");
    }

    #[test]
    fn test_parse_rejects_empty_and_blank() {
        assert_eq!(Email::parse(""), Err(EmailError::Empty));
        assert_eq!(Email::parse("   "), Err(EmailError::Empty));
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert_eq!(Email::parse("octocat"), Err(EmailError::Malformed));
        assert_eq!(Email::parse("@github.com"), Err(EmailError::Malformed));
        assert_eq!(Email::parse("octocat@"), Err(EmailError::Malformed));
    }

    #[test]
    fn test_parse_rejects_too_long() {
        let long = format!("{}@github.com", "a".repeat(250));
        assert!(matches!(
            Email::parse(&long),
            Err(EmailError::TooLong { max: 254 })
        ));
    }

    #[test]
    fn test_domain_uses_last_at() {
        let email = Email::parse("\"odd@local\"@example.com").unwrap();
        assert_eq!(email.domain(), "example.com");
    }

    #[test]
    fn test_github_noreply_detection() {
        let private = Email::parse("583231+octocat@users.noreply.github.com").unwrap();
        let public = Email::parse("octocat@github.com").unwrap();
        assert!(private.is_github_noreply());
        assert!(!public.is_github_noreply());
    }

    #[test]
    fn test_serializes_as_plain_string() {
        let email = Email::parse("octocat@github.com").unwrap();
        assert_eq!(
            serde_json::to_string(&email).unwrap(),
            "\"octocat@github.com\""
        );
    }
}
