//! The admin check.
//!
//! There is exactly one admin: the GitHub user whose login equals
//! `ADMIN_GITHUB_USERNAME`. Sessions only record *who* signed in, so every
//! privileged request asks [`AdminGate`] whether that user is the admin.
//!
//! # Resolution
//!
//! The linked GitHub account ID is stable but the login can be renamed, so
//! the login is looked up by ID and cached for an hour:
//!
//! 1. A fresh cache entry answers directly.
//! 2. Otherwise GitHub is asked. Success refreshes the entry.
//! 3. If GitHub fails, an expired entry is still used (stale-if-error).
//!    With no entry at all the answer is no.
//!
//! Lookup failures never escape; at worst the caller is denied.

mod cache;
mod error;

use std::future::Future;
use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Utc};
use tracing::{debug, error, instrument, warn};

use techblog_core::UserId;

pub use cache::{CachedLogin, LoginCache};
pub use error::AdminDenied;

use crate::db::{AccountRepository, RepositoryError};
use crate::github::{GithubClient, GithubError};
use crate::models::CurrentUser;

/// How long a resolved login is trusted without asking GitHub again.
pub const LOGIN_TTL_SECS: i64 = 60 * 60;

/// Resolves a GitHub account ID to its current login.
pub trait LoginLookup: Send + Sync {
    fn login_for_account(
        &self,
        account_id: &str,
    ) -> impl Future<Output = Result<String, GithubError>> + Send;
}

impl LoginLookup for GithubClient {
    async fn login_for_account(&self, account_id: &str) -> Result<String, GithubError> {
        self.fetch_login(account_id).await
    }
}

/// Finds the GitHub account linked to a local user.
pub trait LinkedAccounts: Sync {
    fn github_account_id(
        &self,
        user_id: UserId,
    ) -> impl Future<Output = Result<Option<String>, RepositoryError>> + Send;
}

impl LinkedAccounts for AccountRepository<'_> {
    async fn github_account_id(&self, user_id: UserId) -> Result<Option<String>, RepositoryError> {
        self.find_github_account_id(user_id).await
    }
}

/// Source of "now". Swapped for a manual clock in tests.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Answers "is this caller the admin?".
///
/// Owns the login cache. One instance lives in `AppState` for the life of
/// the process; tests build their own with fakes.
pub struct AdminGate<L> {
    admin_username: Option<String>,
    lookup: L,
    cache: LoginCache,
    clock: Arc<dyn Clock>,
}

impl<L: LoginLookup> AdminGate<L> {
    /// Gate with an empty cache and the system clock.
    ///
    /// A blank username counts as not configured.
    #[must_use]
    pub fn new(admin_username: Option<String>, lookup: L) -> Self {
        Self::with_parts(admin_username, lookup, LoginCache::new(), Arc::new(SystemClock))
    }

    #[must_use]
    pub fn with_parts(
        admin_username: Option<String>,
        lookup: L,
        cache: LoginCache,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            admin_username: admin_username.filter(|name| !name.trim().is_empty()),
            lookup,
            cache,
            clock,
        }
    }

    #[must_use]
    pub fn admin_username(&self) -> Option<&str> {
        self.admin_username.as_deref()
    }

    #[must_use]
    pub const fn cache(&self) -> &LoginCache {
        &self.cache
    }

    #[must_use]
    pub const fn lookup(&self) -> &L {
        &self.lookup
    }

    /// `true` if `user` is the admin. Denial reasons are logged at debug.
    pub async fn is_admin(
        &self,
        user: Option<&CurrentUser>,
        accounts: &impl LinkedAccounts,
    ) -> bool {
        match self.evaluate(user, accounts).await {
            Ok(()) => true,
            Err(reason) => {
                debug!(%reason, "admin check denied");
                false
            }
        }
    }

    /// Full admin check for a session user.
    ///
    /// # Errors
    ///
    /// Returns the [`AdminDenied`] reason when the user is not the admin.
    #[instrument(skip_all, fields(user_id = user.map(|u| u.id.as_i32())))]
    pub async fn evaluate(
        &self,
        user: Option<&CurrentUser>,
        accounts: &impl LinkedAccounts,
    ) -> Result<(), AdminDenied> {
        let user = user
            .filter(|u| u.email.is_some())
            .ok_or(AdminDenied::NoSession)?;

        if self.admin_username.is_none() {
            return Err(AdminDenied::NotConfigured);
        }

        let account_id = match accounts.github_account_id(user.id).await {
            Ok(Some(id)) => id,
            Ok(None) => return Err(AdminDenied::NoLinkedAccount),
            Err(e) => {
                error!(error = %e, "failed to load linked account");
                return Err(AdminDenied::NoLinkedAccount);
            }
        };

        self.check_account(&account_id).await
    }

    /// Admin check for a GitHub account ID, skipping the session steps.
    ///
    /// # Errors
    ///
    /// Returns the [`AdminDenied`] reason when the account is not the admin.
    pub async fn check_account(&self, account_id: &str) -> Result<(), AdminDenied> {
        let admin = self
            .admin_username
            .as_deref()
            .ok_or(AdminDenied::NotConfigured)?;

        let login = self.resolve_login(account_id).await?;
        if login == admin {
            Ok(())
        } else {
            Err(AdminDenied::NotAdmin { login })
        }
    }

    /// Current login for an account, from cache or GitHub.
    ///
    /// # Errors
    ///
    /// Returns `AdminDenied::ProviderLookupFailure` if GitHub fails and
    /// nothing is cached for the account.
    #[instrument(skip(self))]
    pub async fn resolve_login(&self, account_id: &str) -> Result<String, AdminDenied> {
        let cached = self.cache.get(account_id).await;

        if let Some(entry) = &cached
            && entry.is_fresh(self.clock.now())
        {
            debug!("login cache hit");
            return Ok(entry.login.clone());
        }

        match self.lookup.login_for_account(account_id).await {
            Ok(login) => {
                let expires_at = self.clock.now() + TimeDelta::seconds(LOGIN_TTL_SECS);
                self.cache
                    .set(
                        account_id,
                        CachedLogin {
                            login: login.clone(),
                            expires_at,
                        },
                    )
                    .await;
                Ok(login)
            }
            Err(e) => match cached {
                Some(entry) => {
                    warn!(
                        error = %e,
                        expired_at = %entry.expires_at,
                        "GitHub lookup failed, using stale cached login"
                    );
                    Ok(entry.login)
                }
                None => {
                    warn!(error = %e, "GitHub lookup failed with nothing cached");
                    Err(AdminDenied::ProviderLookupFailure)
                }
            },
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use chrono::TimeZone;
    use reqwest::StatusCode;

    use techblog_core::Email;

    use super::*;

    /// Replays queued responses; `None` means GitHub answered 503.
    struct FakeLookup {
        responses: Mutex<VecDeque<Option<String>>>,
        calls: AtomicUsize,
    }

    impl FakeLookup {
        fn new(responses: impl IntoIterator<Item = Option<&'static str>>) -> Self {
            Self {
                responses: Mutex::new(
                    responses
                        .into_iter()
                        .map(|r| r.map(str::to_owned))
                        .collect(),
                ),
                calls: AtomicUsize::new(0),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl LoginLookup for FakeLookup {
        async fn login_for_account(&self, _account_id: &str) -> Result<String, GithubError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let next = self.responses.lock().unwrap().pop_front().flatten();
            next.ok_or(GithubError::Status(StatusCode::SERVICE_UNAVAILABLE))
        }
    }

    struct FakeAccounts(Option<&'static str>);

    impl LinkedAccounts for FakeAccounts {
        async fn github_account_id(
            &self,
            _user_id: UserId,
        ) -> Result<Option<String>, RepositoryError> {
            Ok(self.0.map(str::to_owned))
        }
    }

    struct FailingAccounts;

    impl LinkedAccounts for FailingAccounts {
        async fn github_account_id(
            &self,
            _user_id: UserId,
        ) -> Result<Option<String>, RepositoryError> {
            Err(RepositoryError::DataCorruption("boom".into()))
        }
    }

    struct ManualClock(Mutex<DateTime<Utc>>);

    impl ManualClock {
        fn start() -> Arc<Self> {
            Arc::new(Self(Mutex::new(
                Utc.with_ymd_and_hms(2025, 1, 1, 9, 0, 0).unwrap(),
            )))
        }

        fn advance_minutes(&self, minutes: i64) {
            *self.0.lock().unwrap() += TimeDelta::minutes(minutes);
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> DateTime<Utc> {
            *self.0.lock().unwrap()
        }
    }

    fn session_user() -> CurrentUser {
        CurrentUser {
            id: UserId::new(7),
            email: Some(Email::parse("octocat@github.com").unwrap()),
            name: Some("The Octocat".into()),
            avatar_url: None,
        }
    }

    fn gate(
        admin: Option<&str>,
        lookup: FakeLookup,
        clock: &Arc<ManualClock>,
    ) -> AdminGate<FakeLookup> {
        let clock: Arc<dyn Clock> = clock.clone();
        AdminGate::with_parts(admin.map(str::to_owned), lookup, LoginCache::new(), clock)
    }

    const ACCOUNT: FakeAccounts = FakeAccounts(Some("12345"));

    #[tokio::test]
    async fn test_no_session_is_denied() {
        let clock = ManualClock::start();
        let gate = gate(Some("octocat"), FakeLookup::new([Some("octocat")]), &clock);

        assert_eq!(gate.evaluate(None, &ACCOUNT).await, Err(AdminDenied::NoSession));
        assert_eq!(gate.lookup().calls(), 0);
    }

    #[tokio::test]
    async fn test_session_without_email_is_denied() {
        let clock = ManualClock::start();
        let gate = gate(Some("octocat"), FakeLookup::new([Some("octocat")]), &clock);
        let mut user = session_user();
        user.email = None;

        assert_eq!(
            gate.evaluate(Some(&user), &ACCOUNT).await,
            Err(AdminDenied::NoSession)
        );
    }

    #[tokio::test]
    async fn test_unconfigured_admin_is_denied() {
        let clock = ManualClock::start();
        for admin in [None, Some(""), Some("   ")] {
            let gate = gate(admin, FakeLookup::new([Some("octocat")]), &clock);
            assert_eq!(
                gate.evaluate(Some(&session_user()), &ACCOUNT).await,
                Err(AdminDenied::NotConfigured)
            );
            assert_eq!(gate.lookup().calls(), 0);
        }
    }

    #[tokio::test]
    async fn test_no_linked_account_is_denied() {
        let clock = ManualClock::start();
        let gate = gate(Some("octocat"), FakeLookup::new([Some("octocat")]), &clock);

        assert!(!gate.is_admin(Some(&session_user()), &FakeAccounts(None)).await);
        assert_eq!(
            gate.evaluate(Some(&session_user()), &FakeAccounts(None)).await,
            Err(AdminDenied::NoLinkedAccount)
        );
        assert_eq!(gate.lookup().calls(), 0);
    }

    #[tokio::test]
    async fn test_account_lookup_error_is_denied() {
        let clock = ManualClock::start();
        let gate = gate(Some("octocat"), FakeLookup::new([Some("octocat")]), &clock);

        assert!(!gate.is_admin(Some(&session_user()), &FailingAccounts).await);
        assert_eq!(gate.lookup().calls(), 0);
    }

    #[tokio::test]
    async fn test_cache_lifecycle_scenario() {
        let clock = ManualClock::start();
        let start = clock.now();
        let gate = gate(
            Some("octocat"),
            FakeLookup::new([Some("octocat"), Some("octocat")]),
            &clock,
        );
        let user = session_user();

        // Miss: one call, entry expires an hour later.
        assert!(gate.is_admin(Some(&user), &ACCOUNT).await);
        assert_eq!(gate.lookup().calls(), 1);
        let entry = gate.cache().get("12345").await.unwrap();
        assert_eq!(entry.login, "octocat");
        assert_eq!(
            (entry.expires_at - start).num_milliseconds(),
            3_600_000
        );

        // Ten minutes later: hit.
        clock.advance_minutes(10);
        assert!(gate.is_admin(Some(&user), &ACCOUNT).await);
        assert_eq!(gate.lookup().calls(), 1);

        // Sixty-one minutes after the first call: expired, second call.
        clock.advance_minutes(51);
        assert!(gate.is_admin(Some(&user), &ACCOUNT).await);
        assert_eq!(gate.lookup().calls(), 2);
        let refreshed = gate.cache().get("12345").await.unwrap();
        assert_eq!(refreshed.expires_at, clock.now() + TimeDelta::hours(1));
    }

    #[tokio::test]
    async fn test_other_login_is_not_admin() {
        let clock = ManualClock::start();
        let gate = gate(Some("octocat"), FakeLookup::new([Some("someoneelse")]), &clock);

        assert_eq!(
            gate.evaluate(Some(&session_user()), &ACCOUNT).await,
            Err(AdminDenied::NotAdmin {
                login: "someoneelse".into()
            })
        );
    }

    #[tokio::test]
    async fn test_login_comparison_is_case_sensitive() {
        let clock = ManualClock::start();
        let gate = gate(Some("octocat"), FakeLookup::new([Some("OctoCat")]), &clock);

        assert!(!gate.is_admin(Some(&session_user()), &ACCOUNT).await);
    }

    #[tokio::test]
    async fn test_lookup_failure_without_cache_is_denied() {
        let clock = ManualClock::start();
        let gate = gate(Some("octocat"), FakeLookup::new([None]), &clock);

        assert_eq!(
            gate.evaluate(Some(&session_user()), &ACCOUNT).await,
            Err(AdminDenied::ProviderLookupFailure)
        );
        assert_eq!(gate.lookup().calls(), 1);
        assert!(gate.cache().get("12345").await.is_none());
    }

    #[tokio::test]
    async fn test_lookup_failure_falls_back_to_stale_entry() {
        let clock = ManualClock::start();
        let gate = gate(Some("octocat"), FakeLookup::new([Some("octocat"), None]), &clock);
        let user = session_user();

        assert!(gate.is_admin(Some(&user), &ACCOUNT).await);
        let before = gate.cache().get("12345").await.unwrap();

        // Way past expiry, GitHub is down: the stale login still answers.
        clock.advance_minutes(60 * 24);
        assert!(gate.is_admin(Some(&user), &ACCOUNT).await);
        assert_eq!(gate.lookup().calls(), 2);

        // A failed refresh leaves the entry untouched.
        assert_eq!(gate.cache().get("12345").await.unwrap(), before);
    }

    #[tokio::test]
    async fn test_stale_fallback_uses_stale_login() {
        let clock = ManualClock::start();
        let gate = gate(Some("octocat"), FakeLookup::new([Some("someoneelse"), None]), &clock);
        let user = session_user();

        assert!(!gate.is_admin(Some(&user), &ACCOUNT).await);
        clock.advance_minutes(61);
        assert_eq!(
            gate.evaluate(Some(&user), &ACCOUNT).await,
            Err(AdminDenied::NotAdmin {
                login: "someoneelse".into()
            })
        );
    }

    #[tokio::test]
    async fn test_repeated_checks_are_idempotent() {
        let clock = ManualClock::start();
        let gate = gate(Some("octocat"), FakeLookup::new([Some("octocat")]), &clock);
        let user = session_user();

        let first = gate.is_admin(Some(&user), &ACCOUNT).await;
        let second = gate.is_admin(Some(&user), &ACCOUNT).await;
        assert_eq!(first, second);
        assert!(gate.lookup().calls() <= 1);
    }

    #[tokio::test]
    async fn test_refresh_overwrites_renamed_login() {
        let clock = ManualClock::start();
        let gate = gate(Some("octocat"), FakeLookup::new([Some("octocat"), Some("renamed")]), &clock);
        let user = session_user();

        assert!(gate.is_admin(Some(&user), &ACCOUNT).await);
        clock.advance_minutes(60);
        assert!(!gate.is_admin(Some(&user), &ACCOUNT).await);
        assert_eq!(gate.cache().get("12345").await.unwrap().login, "renamed");
    }

    #[tokio::test]
    async fn test_check_account_skips_session() {
        let clock = ManualClock::start();
        let gate = gate(Some("octocat"), FakeLookup::new([Some("octocat")]), &clock);

        assert_eq!(gate.check_account("12345").await, Ok(()));
    }
}
