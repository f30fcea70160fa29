//! Category page route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
};
use serde::Deserialize;
use tracing::instrument;

use techblog_core::pagination::{POSTS_PER_PAGE, PageRequest, parse_page, total_pages};

use crate::db::{CategoryRepository, PostRepository};
use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::OptionalUser;
use crate::models::{CurrentUser, PostFilter};
use crate::state::AppState;
use crate::views::{ListParams, PostListView, category_href};

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub page: Option<String>,
}

/// Category page template.
#[derive(Template, WebTemplate)]
#[template(path = "categories/show.html")]
pub struct CategoryShowTemplate {
    pub user: Option<CurrentUser>,
    pub name: String,
    pub total_count: u64,
    pub list: PostListView,
}

/// `GET /categories/{slug}`: published posts in one category.
///
/// The path extractor has already percent-decoded `slug`.
///
/// # Errors
///
/// Returns 404 for an unknown category.
#[instrument(skip(state, user))]
pub async fn show(
    State(state): State<AppState>,
    OptionalUser(user): OptionalUser,
    Path(slug): Path<String>,
    Query(query): Query<PageQuery>,
) -> Result<impl IntoResponse> {
    let category = CategoryRepository::new(state.pool())
        .get_by_slug(&slug)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("category {slug}")))?;

    let filter = PostFilter::published().with_category(Some(&category.slug));
    let page = parse_page(query.page.as_deref());

    let posts_repo = PostRepository::new(state.pool());
    let total_count = posts_repo.count(&filter).await?;
    let posts = posts_repo
        .list(&filter, PageRequest::new(page, POSTS_PER_PAGE))
        .await?;

    Ok(CategoryShowTemplate {
        user,
        name: category.name,
        total_count,
        list: PostListView::new(
            &posts,
            page,
            total_pages(total_count, POSTS_PER_PAGE),
            &category_href(&category.slug),
            &ListParams::default(),
        ),
    })
}
