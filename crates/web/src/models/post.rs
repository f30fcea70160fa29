//! Post domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use techblog_core::{CategoryId, PostId, PostStatus, TagId};

/// Name and slug of the category a post belongs to.
#[derive(Debug, Clone, Serialize)]
pub struct CategorySummary {
    pub id: CategoryId,
    pub name: String,
    pub slug: String,
}

/// A tag attached to a post.
#[derive(Debug, Clone, Serialize)]
pub struct Tag {
    pub id: TagId,
    pub name: String,
}

/// A blog post with its category and tags.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: PostId,
    pub title: String,
    pub slug: String,
    pub content: String,
    pub excerpt: Option<String>,
    pub thumbnail: Option<String>,
    pub published: bool,
    pub category_id: Option<CategoryId>,
    pub category: Option<CategorySummary>,
    pub tags: Vec<Tag>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Post {
    #[must_use]
    pub const fn status(&self) -> PostStatus {
        PostStatus::from_published(self.published)
    }

    /// Tag names in display order.
    pub fn tag_names(&self) -> impl Iterator<Item = &str> {
        self.tags.iter().map(|t| t.name.as_str())
    }
}

/// Filters for post listings.
///
/// All filters combine with AND. An empty filter matches every post.
#[derive(Debug, Clone, Default)]
pub struct PostFilter {
    /// Restrict to published (`Some(true)`) or draft (`Some(false)`) posts.
    pub published: Option<bool>,
    /// Case-sensitive substring of title or content.
    pub query: Option<String>,
    pub category_slug: Option<String>,
    /// Post must carry every one of these tags.
    pub tags: Vec<String>,
}

impl PostFilter {
    /// Only published posts.
    #[must_use]
    pub fn published() -> Self {
        Self {
            published: Some(true),
            ..Self::default()
        }
    }

    /// Set the search query, ignoring blank input.
    #[must_use]
    pub fn with_query(mut self, query: Option<&str>) -> Self {
        self.query = query
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .map(str::to_owned);
        self
    }

    #[must_use]
    pub fn with_category(mut self, slug: Option<&str>) -> Self {
        self.category_slug = slug.filter(|s| !s.is_empty()).map(str::to_owned);
        self
    }

    /// Set the tag filter from a comma-separated list.
    #[must_use]
    pub fn with_tags(mut self, raw: Option<&str>) -> Self {
        self.tags = raw.map(parse_tag_list).unwrap_or_default();
        self
    }
}

/// A new post, already validated.
#[derive(Debug, Clone)]
pub struct PostInput {
    pub title: String,
    pub slug: String,
    pub content: String,
    pub excerpt: Option<String>,
    pub thumbnail: Option<String>,
    pub published: bool,
    pub category_id: Option<CategoryId>,
    pub tags: Vec<String>,
}

/// A partial update. `None` leaves the column untouched; for nullable
/// columns `Some(None)` clears it.
#[derive(Debug, Clone, Default)]
pub struct PostChanges {
    pub title: Option<String>,
    pub slug: Option<String>,
    pub content: Option<String>,
    pub excerpt: Option<Option<String>>,
    pub thumbnail: Option<Option<String>>,
    pub published: Option<bool>,
    pub category_id: Option<Option<CategoryId>>,
    /// Replaces the whole tag set when present.
    pub tags: Option<Vec<String>>,
}

/// Split a comma-separated tag list into trimmed, non-empty, unique names.
///
/// Order of first appearance is kept.
#[must_use]
pub fn parse_tag_list(raw: &str) -> Vec<String> {
    normalize_tags(raw.split(','))
}

/// Trim, drop blanks and deduplicate tag names.
#[must_use]
pub fn normalize_tags<'a>(names: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    let mut tags: Vec<String> = Vec::new();
    for name in names {
        let name = name.trim();
        if !name.is_empty() && !tags.iter().any(|t| t == name) {
            tags.push(name.to_owned());
        }
    }
    tags
}
