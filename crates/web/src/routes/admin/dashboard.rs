//! Admin dashboard.

use askama::Template;
use askama_web::WebTemplate;
use axum::{extract::State, response::IntoResponse};
use tracing::instrument;

use super::{AdminNavView, AdminPostRow};
use crate::db::{PostRepository, PostStats};
use crate::error::Result;
use crate::filters;
use crate::middleware::RequireAdmin;
use crate::state::AppState;

/// Rows under "최근 글".
const RECENT_POSTS: i64 = 5;

#[derive(Template, WebTemplate)]
#[template(path = "admin/dashboard.html")]
pub struct DashboardTemplate {
    pub nav: AdminNavView,
    pub stats: PostStats,
    pub recent: Vec<AdminPostRow>,
}

/// `GET /admin`: counters and the most recently updated posts.
///
/// # Errors
///
/// Returns an error page if the database is unavailable.
#[instrument(skip_all)]
pub async fn index(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
) -> Result<impl IntoResponse> {
    let repo = PostRepository::new(state.pool());
    let stats = repo.stats().await?;
    let recent = repo.recently_updated(RECENT_POSTS).await?;

    Ok(DashboardTemplate {
        nav: AdminNavView::new(&admin, "/admin"),
        stats,
        recent: recent.iter().map(AdminPostRow::from).collect(),
    })
}
