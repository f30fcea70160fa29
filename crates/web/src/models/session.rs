//! Session-related types.
//!
//! Types stored in the session for authentication state.

use serde::{Deserialize, Serialize};

use techblog_core::{Email, UserId};

/// Session-stored user identity.
///
/// Written once at sign-in. Whether this user is the admin is *not* stored
/// here; it is re-evaluated on every privileged request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentUser {
    /// Local user ID.
    pub id: UserId,
    /// Email from GitHub, if the user exposes one.
    pub email: Option<Email>,
    /// Display name (falls back to the GitHub login).
    pub name: Option<String>,
    /// GitHub avatar URL.
    pub avatar_url: Option<String>,
}

impl CurrentUser {
    /// Name shown in the header and admin nav.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .or_else(|| self.email.as_ref().map(Email::as_str))
            .unwrap_or("관리자")
    }
}

/// Session keys for authentication data.
pub mod keys {
    /// Key for storing the current logged-in user.
    pub const CURRENT_USER: &str = "current_user";

    /// Key for GitHub OAuth state (CSRF protection).
    pub const GITHUB_OAUTH_STATE: &str = "github_oauth_state";

    /// Where to send the user after a successful sign-in.
    pub const RETURN_TO: &str = "return_to";
}
