//! Reasons the admin check says no.

use thiserror::Error;

/// Why a caller was not recognised as the admin.
///
/// None of these are surfaced to the caller beyond "access denied".
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AdminDenied {
    /// No signed-in user, or the session carries no email.
    #[error("no active session")]
    NoSession,

    /// `ADMIN_GITHUB_USERNAME` is not set.
    #[error("admin username not configured")]
    NotConfigured,

    /// The user has no linked GitHub account.
    #[error("no linked GitHub account")]
    NoLinkedAccount,

    /// GitHub lookup failed and nothing was cached for the account.
    #[error("GitHub login lookup failed")]
    ProviderLookupFailure,

    /// The account resolved to a different login.
    #[error("login {login:?} is not the admin")]
    NotAdmin { login: String },
}
