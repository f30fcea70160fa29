//! Public post list and post detail.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
};
use serde::Deserialize;
use tracing::instrument;

use techblog_core::format::{format_date, iso8601};
use techblog_core::pagination::{POSTS_PER_PAGE, PageRequest, parse_page, total_pages};
use techblog_core::toc::TocItem;

use crate::db::{CategoryRepository, PostRepository};
use crate::error::{AppError, Result};
use crate::filters;
use crate::markdown::render_post;
use crate::middleware::OptionalUser;
use crate::models::post::parse_tag_list;
use crate::models::{CurrentUser, Post, PostFilter};
use crate::state::AppState;
use crate::views::{
    ListParams, POSTS_PATH, PostListView, SearchBarView, TagLinkView, category_href, post_href,
};

/// Query string of `/posts`.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub page: Option<String>,
    pub q: Option<String>,
    pub category: Option<String>,
    /// Comma-separated tag names.
    pub tags: Option<String>,
}

impl ListQuery {
    /// Normalised filter parameters; blanks are dropped.
    #[must_use]
    pub fn params(&self) -> ListParams {
        ListParams {
            q: self
                .q
                .as_deref()
                .map(str::trim)
                .filter(|q| !q.is_empty())
                .map(str::to_owned),
            category: self.category.clone().filter(|c| !c.is_empty()),
            tags: self.tags.as_deref().map(parse_tag_list).unwrap_or_default(),
        }
    }
}

/// Published posts matching `params`.
pub(crate) fn published_filter(params: &ListParams) -> PostFilter {
    PostFilter {
        published: Some(true),
        query: params.q.clone(),
        category_slug: params.category.clone(),
        tags: params.tags.clone(),
    }
}

/// Post list page template.
#[derive(Template, WebTemplate)]
#[template(path = "posts/index.html")]
pub struct PostsIndexTemplate {
    pub user: Option<CurrentUser>,
    pub search: SearchBarView,
    pub list: PostListView,
}

/// `GET /posts`: search, filter and paginate published posts.
///
/// # Errors
///
/// Returns an error page if the database is unavailable.
#[instrument(skip(state, user))]
pub async fn index(
    State(state): State<AppState>,
    OptionalUser(user): OptionalUser,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse> {
    let params = query.params();
    let filter = published_filter(&params);
    let page = parse_page(query.page.as_deref());

    let posts_repo = PostRepository::new(state.pool());
    let total_count = posts_repo.count(&filter).await?;
    let posts = posts_repo
        .list(&filter, PageRequest::new(page, POSTS_PER_PAGE))
        .await?;
    let categories = CategoryRepository::new(state.pool())
        .list_with_counts(true)
        .await?;

    Ok(PostsIndexTemplate {
        user,
        search: SearchBarView::new(&params, &categories, total_count),
        list: PostListView::new(
            &posts,
            page,
            total_pages(total_count, POSTS_PER_PAGE),
            POSTS_PATH,
            &params,
        ),
    })
}

/// Everything the post page shows.
pub struct PostDetailView {
    pub title: String,
    /// Excerpt, or the title when there is none.
    pub description: String,
    pub url: String,
    pub thumbnail: Option<String>,
    pub published_time: String,
    pub date_display: String,
    pub category_name: Option<String>,
    pub category_href: Option<String>,
    pub tags: Vec<TagLinkView>,
    pub body_html: String,
    pub toc: Vec<TocItem>,
}

impl PostDetailView {
    #[must_use]
    pub fn new(post: &Post, base_url: &str) -> Self {
        let rendered = render_post(&post.content);
        let params = ListParams::default();

        Self {
            title: post.title.clone(),
            description: post
                .excerpt
                .clone()
                .filter(|e| !e.trim().is_empty())
                .unwrap_or_else(|| post.title.clone()),
            url: format!("{base_url}{}", post_href(&post.slug)),
            thumbnail: post.thumbnail.clone(),
            published_time: iso8601(post.created_at),
            date_display: format_date(post.created_at),
            category_name: post.category.as_ref().map(|c| c.name.clone()),
            category_href: post.category.as_ref().map(|c| category_href(&c.slug)),
            tags: post
                .tag_names()
                .map(|name| TagLinkView {
                    name: name.to_owned(),
                    href: params.tag_href(name),
                })
                .collect(),
            body_html: rendered.html,
            toc: rendered.toc,
        }
    }
}

/// Post detail template.
#[derive(Template, WebTemplate)]
#[template(path = "posts/show.html")]
pub struct PostShowTemplate {
    pub user: Option<CurrentUser>,
    pub post: PostDetailView,
}

/// `GET /posts/{slug}`.
///
/// # Errors
///
/// Returns 404 if the post doesn't exist or is a draft.
#[instrument(skip(state, user))]
pub async fn show(
    State(state): State<AppState>,
    OptionalUser(user): OptionalUser,
    Path(slug): Path<String>,
) -> Result<impl IntoResponse> {
    let post = PostRepository::new(state.pool())
        .get_by_slug(&slug)
        .await?
        .filter(|p| p.published)
        .ok_or_else(|| AppError::NotFound(format!("post {slug}")))?;

    Ok(PostShowTemplate {
        user,
        post: PostDetailView::new(&post, &state.config().base_url),
    })
}
