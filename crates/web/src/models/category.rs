//! Category domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use techblog_core::CategoryId;

/// A post category.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub slug: String,
    pub created_at: DateTime<Utc>,
}

/// A category together with how many posts it holds.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryWithCount {
    #[serde(flatten)]
    pub category: Category,
    pub post_count: i64,
}

impl CategoryWithCount {
    /// Categories that still hold posts cannot be deleted from the admin UI.
    #[must_use]
    pub const fn is_deletable(&self) -> bool {
        self.post_count == 0
    }
}
