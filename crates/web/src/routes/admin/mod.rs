//! Admin panel route handlers.
//!
//! Every handler takes [`RequireAdmin`](crate::middleware::RequireAdmin).
//! Forms post back to the server; the only JavaScript is the markdown editor
//! and delete confirmations.

pub mod categories;
pub mod dashboard;
pub mod posts;

use techblog_core::CategoryId;
use techblog_core::format::{format_date, truncate};

use crate::models::{CategoryWithCount, CurrentUser, Post};

/// Title length in the admin tables; the full title is in the tooltip.
const TABLE_TITLE_CHARS: usize = 60;

/// Signed-in admin as shown in the admin nav.
#[derive(Debug, Clone)]
pub struct AdminNavView {
    pub name: String,
    pub avatar_url: Option<String>,
    /// Path of the current section, for the active nav link.
    pub current_path: &'static str,
}

impl AdminNavView {
    #[must_use]
    pub fn new(user: &CurrentUser, current_path: &'static str) -> Self {
        Self {
            name: user.display_name().to_owned(),
            avatar_url: user.avatar_url.clone(),
            current_path,
        }
    }

    #[must_use]
    pub fn is_active(&self, path: &str) -> bool {
        self.current_path == path
    }
}

/// One row of an admin post table.
#[derive(Debug, Clone)]
pub struct AdminPostRow {
    pub id: i32,
    pub title: String,
    pub short_title: String,
    pub category_name: Option<String>,
    pub date_display: String,
    pub published: bool,
    pub status_label: &'static str,
    pub edit_href: String,
    pub delete_action: String,
}

impl From<&Post> for AdminPostRow {
    fn from(post: &Post) -> Self {
        let id = post.id.as_i32();
        Self {
            id,
            title: post.title.clone(),
            short_title: truncate(&post.title, TABLE_TITLE_CHARS),
            category_name: post.category.as_ref().map(|c| c.name.clone()),
            date_display: format_date(post.created_at),
            published: post.published,
            status_label: post.status().label(),
            edit_href: format!("/admin/posts/{id}/edit"),
            delete_action: format!("/admin/posts/{id}/delete"),
        }
    }
}

/// An `<option>` of a category select.
#[derive(Debug, Clone)]
pub struct CategoryOption {
    pub id: i32,
    pub name: String,
    pub selected: bool,
}

/// Options for a category select with `selected` preselected.
#[must_use]
pub fn category_options(
    categories: &[CategoryWithCount],
    selected: Option<CategoryId>,
) -> Vec<CategoryOption> {
    categories
        .iter()
        .map(|c| CategoryOption {
            id: c.category.id.as_i32(),
            name: c.category.name.clone(),
            selected: Some(c.category.id) == selected,
        })
        .collect()
}

/// Parse a category id from a form or query value; blank or `0` means none.
#[must_use]
pub fn parse_category_id(raw: Option<&str>) -> Option<CategoryId> {
    raw.map(str::trim)
        .filter(|s| !s.is_empty())
        .and_then(|s| s.parse::<CategoryId>().ok())
        .filter(|id| id.as_i32() > 0)
}
