//! In-memory cache of GitHub account ID to login.

use chrono::{DateTime, Utc};
use moka::future::Cache;

/// A login resolved from GitHub, and when it stops being trusted on its own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedLogin {
    pub login: String,
    pub expires_at: DateTime<Utc>,
}

impl CachedLogin {
    /// Fresh entries answer without calling GitHub.
    #[must_use]
    pub fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}

/// Account-ID-keyed login cache.
///
/// The cache is unbounded and has no TTL of its own, so nothing is evicted
/// behind the caller's back. Expired entries are kept so they can be served
/// when GitHub is unreachable; freshness is judged by the caller through
/// [`CachedLogin::is_fresh`]. Cloning shares the same storage.
#[derive(Clone)]
pub struct LoginCache {
    entries: Cache<String, CachedLogin>,
}

impl LoginCache {
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Cache::builder().build(),
        }
    }

    /// Entry for an account, fresh or not.
    pub async fn get(&self, account_id: &str) -> Option<CachedLogin> {
        self.entries.get(account_id).await
    }

    /// Store an entry, replacing any previous one for the account.
    pub async fn set(&self, account_id: &str, entry: CachedLogin) {
        self.entries.insert(account_id.to_owned(), entry).await;
    }

    /// Drop every entry.
    pub async fn clear(&self) {
        self.entries.invalidate_all();
        self.entries.run_pending_tasks().await;
    }
}

impl Default for LoginCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::{TimeDelta, TimeZone};

    use super::*;

    fn at(minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 1, 0, minute, 0).unwrap()
    }

    #[test]
    fn test_freshness_boundary() {
        let entry = CachedLogin {
            login: "octocat".into(),
            expires_at: at(30),
        };
        assert!(entry.is_fresh(at(29)));
        assert!(!entry.is_fresh(at(30)));
        assert!(!entry.is_fresh(at(30) + TimeDelta::seconds(1)));
    }

    #[tokio::test]
    async fn test_set_overwrites_and_clones_share_storage() {
        let cache = LoginCache::new();
        let shared = cache.clone();

        cache
            .set("1", CachedLogin { login: "a".into(), expires_at: at(1) })
            .await;
        shared
            .set("1", CachedLogin { login: "b".into(), expires_at: at(2) })
            .await;

        let entry = cache.get("1").await.unwrap();
        assert_eq!(entry.login, "b");
        assert_eq!(entry.expires_at, at(2));
        assert!(cache.get("2").await.is_none());
    }

    #[tokio::test]
    async fn test_clear() {
        let cache = LoginCache::new();
        cache
            .set("1", CachedLogin { login: "a".into(), expires_at: at(1) })
            .await;
        cache.clear().await;
        assert!(cache.get("1").await.is_none());
    }

    #[tokio::test]
    async fn test_expired_entries_survive_many_accounts() {
        let cache = LoginCache::new();
        for id in 0..20_000 {
            cache
                .set(&id.to_string(), CachedLogin { login: format!("u{id}"), expires_at: at(0) })
                .await;
        }
        cache.entries.run_pending_tasks().await;

        assert_eq!(cache.entries.entry_count(), 20_000);
        let first = cache.get("0").await.unwrap();
        assert_eq!(first.login, "u0");
        assert!(!first.is_fresh(at(1)));
    }
}
