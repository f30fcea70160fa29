//! User domain types.

use chrono::{DateTime, Utc};

use techblog_core::{Email, UserId};

/// A local user. Created on first GitHub sign-in.
#[derive(Debug, Clone)]
pub struct User {
    pub id: UserId,
    pub name: Option<String>,
    pub email: Option<Email>,
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// What we learn about a user from GitHub at sign-in.
#[derive(Debug, Clone)]
pub struct GithubIdentity {
    /// Stable numeric GitHub account ID, as a string.
    pub account_id: String,
    pub login: String,
    pub name: Option<String>,
    pub email: Option<Email>,
    pub avatar_url: Option<String>,
}
