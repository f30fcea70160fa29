//! Home page route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::{extract::State, response::IntoResponse};
use tracing::instrument;

use techblog_core::pagination::PageRequest;

use crate::db::{CategoryRepository, PostRepository};
use crate::error::Result;
use crate::filters;
use crate::middleware::OptionalUser;
use crate::models::{CategoryWithCount, CurrentUser, PostFilter};
use crate::state::AppState;
use crate::views::{PostListView, category_href};

/// Posts shown under "최신 글".
const LATEST_POSTS: u32 = 10;

/// Category chip on the home page.
pub struct CategoryChipView {
    pub name: String,
    pub href: String,
    pub count: i64,
}

impl From<&CategoryWithCount> for CategoryChipView {
    fn from(c: &CategoryWithCount) -> Self {
        Self {
            name: c.category.name.clone(),
            href: category_href(&c.category.slug),
            count: c.post_count,
        }
    }
}

/// Home page template.
#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub user: Option<CurrentUser>,
    pub categories: Vec<CategoryChipView>,
    pub list: PostListView,
}

/// Display the home page.
///
/// # Errors
///
/// Returns an error page if the database is unavailable.
#[instrument(skip(state, user))]
pub async fn home(
    State(state): State<AppState>,
    OptionalUser(user): OptionalUser,
) -> Result<impl IntoResponse> {
    let posts = PostRepository::new(state.pool())
        .list(&PostFilter::published(), PageRequest::new(1, LATEST_POSTS))
        .await?;
    let categories = CategoryRepository::new(state.pool())
        .list_with_counts(true)
        .await?;

    Ok(HomeTemplate {
        user,
        categories: categories.iter().map(CategoryChipView::from).collect(),
        list: PostListView::unpaged(&posts),
    })
}
