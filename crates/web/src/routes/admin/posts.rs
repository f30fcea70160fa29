//! Admin post table and editor forms.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tracing::instrument;

use techblog_core::{PostId, PostStatus};

use super::{AdminNavView, AdminPostRow, CategoryOption, category_options, parse_category_id};
use crate::db::{
    AdminPostQuery, AdminSort, CategoryRepository, PostRepository, RepositoryError, SortDirection,
};
use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::RequireAdmin;
use crate::models::{CurrentUser, Post};
use crate::models::post::parse_tag_list;
use crate::services::posts::{PostDraft, PostEdit, PostService, PostServiceError};
use crate::state::AppState;

const POSTS_PATH: &str = "/admin/posts";

const MISSING_FIELDS: &str = "제목과 내용을 입력해주세요.";
const SAVE_FAILED: &str = "저장 실패";

/// Query string of the admin post table.
#[derive(Debug, Default, Deserialize)]
pub struct AdminPostsQuery {
    pub q: Option<String>,
    pub category: Option<String>,
    pub status: Option<String>,
    pub sort: Option<String>,
    pub dir: Option<String>,
}

impl AdminPostsQuery {
    fn to_query(&self) -> AdminPostQuery {
        AdminPostQuery {
            title: self
                .q
                .as_deref()
                .map(str::trim)
                .filter(|q| !q.is_empty())
                .map(str::to_owned),
            category_id: parse_category_id(self.category.as_deref()),
            status: self.status.as_deref().and_then(|s| s.parse::<PostStatus>().ok()),
            sort: AdminSort::parse(self.sort.as_deref()),
            direction: SortDirection::parse(self.dir.as_deref()),
        }
    }
}

/// A sortable column header.
#[derive(Debug, Clone)]
pub struct SortHeader {
    pub href: String,
    /// `↑`, `↓` or empty when another column is sorted.
    pub indicator: &'static str,
}

/// Header link for `column` given the current ordering.
///
/// Clicking the sorted column flips the direction. Switching columns starts
/// titles ascending and dates descending.
fn sort_header(query: &AdminPostQuery, column: AdminSort) -> SortHeader {
    let active = query.sort == column;
    let direction = if active {
        query.direction.flipped()
    } else {
        match column {
            AdminSort::Title => SortDirection::Asc,
            AdminSort::CreatedAt => SortDirection::Desc,
        }
    };

    let mut params = url::form_urlencoded::Serializer::new(String::new());
    if let Some(q) = &query.title {
        params.append_pair("q", q);
    }
    if let Some(id) = query.category_id {
        params.append_pair("category", &id.to_string());
    }
    if let Some(status) = query.status {
        params.append_pair("status", &status.to_string());
    }
    params.append_pair("sort", column.as_str());
    params.append_pair("dir", direction.as_str());

    let indicator = match (active, query.direction) {
        (false, _) => "",
        (true, SortDirection::Asc) => "↑",
        (true, SortDirection::Desc) => "↓",
    };

    SortHeader {
        href: format!("{POSTS_PATH}?{}", params.finish()),
        indicator,
    }
}

#[derive(Template, WebTemplate)]
#[template(path = "admin/posts/index.html")]
pub struct AdminPostsTemplate {
    pub nav: AdminNavView,
    pub q: String,
    pub status: String,
    pub categories: Vec<CategoryOption>,
    pub rows: Vec<AdminPostRow>,
    pub title_sort: SortHeader,
    pub date_sort: SortHeader,
    pub sort: &'static str,
    pub dir: &'static str,
    /// Any filter narrows the table, so an empty result reads differently.
    pub filtering: bool,
}

/// `GET /admin/posts`.
///
/// # Errors
///
/// Returns an error page if the database is unavailable.
#[instrument(skip(admin, state))]
pub async fn index(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Query(raw): Query<AdminPostsQuery>,
) -> Result<impl IntoResponse> {
    let query = raw.to_query();
    let posts = PostRepository::new(state.pool())
        .list_for_admin(&query)
        .await?;
    let categories = CategoryRepository::new(state.pool())
        .list_with_counts(false)
        .await?;

    Ok(AdminPostsTemplate {
        nav: AdminNavView::new(&admin, POSTS_PATH),
        q: query.title.clone().unwrap_or_default(),
        status: query.status.map(|s| s.to_string()).unwrap_or_default(),
        categories: category_options(&categories, query.category_id),
        rows: posts.iter().map(AdminPostRow::from).collect(),
        title_sort: sort_header(&query, AdminSort::Title),
        date_sort: sort_header(&query, AdminSort::CreatedAt),
        sort: query.sort.as_str(),
        dir: query.direction.as_str(),
        filtering: query.title.is_some() || query.category_id.is_some() || query.status.is_some(),
    })
}

/// Fields of the post editor form.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PostForm {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub excerpt: String,
    /// Comma-separated.
    #[serde(default)]
    pub tags: String,
    #[serde(default)]
    pub category_id: String,
    /// Checkbox; present only when checked.
    pub published: Option<String>,
}

impl PostForm {
    fn from_post(post: &Post) -> Self {
        Self {
            title: post.title.clone(),
            content: post.content.clone(),
            excerpt: post.excerpt.clone().unwrap_or_default(),
            tags: post.tag_names().collect::<Vec<_>>().join(", "),
            category_id: post
                .category_id
                .map(|id| id.to_string())
                .unwrap_or_default(),
            published: post.published.then(|| "on".to_owned()),
        }
    }

    fn is_published(&self) -> bool {
        self.published.is_some()
    }

    fn is_complete(&self) -> bool {
        !self.title.trim().is_empty() && !self.content.trim().is_empty()
    }

    fn into_draft(self) -> PostDraft {
        PostDraft {
            published: self.is_published(),
            category_id: parse_category_id(Some(&self.category_id)),
            tags: parse_tag_list(&self.tags),
            excerpt: Some(self.excerpt),
            thumbnail: None,
            title: self.title,
            content: self.content,
        }
    }

    fn into_edit(self) -> PostEdit {
        PostEdit {
            published: Some(self.is_published()),
            category_id: Some(parse_category_id(Some(&self.category_id))),
            tags: Some(parse_tag_list(&self.tags)),
            excerpt: Some(Some(self.excerpt)),
            thumbnail: None,
            title: Some(self.title),
            content: Some(self.content),
        }
    }
}

#[derive(Template, WebTemplate)]
#[template(path = "admin/posts/form.html")]
pub struct PostFormTemplate {
    pub nav: AdminNavView,
    /// `새 글 작성` or `글 수정`.
    pub heading: &'static str,
    pub action: String,
    /// Set when editing an existing post.
    pub delete_action: Option<String>,
    pub form: PostForm,
    pub categories: Vec<CategoryOption>,
    pub error: Option<&'static str>,
}

/// Render the editor, re-reading categories for the select.
async fn form_page(
    state: &AppState,
    admin: &CurrentUser,
    existing: Option<PostId>,
    form: PostForm,
    error: Option<&'static str>,
) -> Result<PostFormTemplate> {
    let categories = CategoryRepository::new(state.pool())
        .list_with_counts(false)
        .await?;
    let selected = parse_category_id(Some(&form.category_id));

    let (heading, action, delete_action) = match existing {
        Some(id) => (
            "글 수정",
            format!("{POSTS_PATH}/{id}"),
            Some(format!("{POSTS_PATH}/{id}/delete")),
        ),
        None => ("새 글 작성", POSTS_PATH.to_owned(), None),
    };

    Ok(PostFormTemplate {
        nav: AdminNavView::new(admin, POSTS_PATH),
        heading,
        action,
        delete_action,
        categories: category_options(&categories, selected),
        form,
        error,
    })
}

/// Re-show the form after a failed save.
async fn rejected(
    state: &AppState,
    admin: &CurrentUser,
    existing: Option<PostId>,
    form: PostForm,
    error: &PostServiceError,
) -> Result<Response> {
    let (status, message) = match error {
        PostServiceError::MissingFields => (StatusCode::UNPROCESSABLE_ENTITY, MISSING_FIELDS),
        PostServiceError::Repository(e) => {
            tracing::error!(error = %e, "failed to save post");
            (StatusCode::INTERNAL_SERVER_ERROR, SAVE_FAILED)
        }
    };
    let page = form_page(state, admin, existing, form, Some(message)).await?;
    Ok((status, page).into_response())
}

/// `GET /admin/posts/new`.
///
/// # Errors
///
/// Returns an error page if the database is unavailable.
#[instrument(skip_all)]
pub async fn new(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
) -> Result<impl IntoResponse> {
    form_page(&state, &admin, None, PostForm::default(), None).await
}

/// `POST /admin/posts`.
///
/// # Errors
///
/// Returns an error page if the database is unavailable.
#[instrument(skip_all)]
pub async fn create(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Form(form): Form<PostForm>,
) -> Result<Response> {
    if !form.is_complete() {
        return rejected(&state, &admin, None, form, &PostServiceError::MissingFields).await;
    }

    let snapshot = form.clone();
    match PostService::new(state.pool()).create(form.into_draft()).await {
        Ok(_) => Ok(Redirect::to(POSTS_PATH).into_response()),
        Err(e) => rejected(&state, &admin, None, snapshot, &e).await,
    }
}

/// `GET /admin/posts/{id}/edit`.
///
/// # Errors
///
/// Returns 404 if the post does not exist.
#[instrument(skip(admin, state))]
pub async fn edit(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<PostId>,
) -> Result<impl IntoResponse> {
    let post = PostRepository::new(state.pool())
        .get_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("post {id}")))?;

    form_page(&state, &admin, Some(id), PostForm::from_post(&post), None).await
}

/// `POST /admin/posts/{id}`.
///
/// # Errors
///
/// Returns 404 if the post does not exist.
#[instrument(skip(admin, state, form))]
pub async fn update(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<PostId>,
    Form(form): Form<PostForm>,
) -> Result<Response> {
    if !form.is_complete() {
        return rejected(&state, &admin, Some(id), form, &PostServiceError::MissingFields).await;
    }

    let snapshot = form.clone();
    match PostService::new(state.pool()).update(id, form.into_edit()).await {
        Ok(_) => Ok(Redirect::to(POSTS_PATH).into_response()),
        Err(PostServiceError::Repository(RepositoryError::NotFound)) => {
            Err(AppError::NotFound(format!("post {id}")))
        }
        Err(e) => rejected(&state, &admin, Some(id), snapshot, &e).await,
    }
}

/// `POST /admin/posts/{id}/delete`.
///
/// # Errors
///
/// Returns 404 if the post does not exist.
#[instrument(skip(_admin, state))]
pub async fn delete(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<PostId>,
) -> Result<Redirect> {
    PostRepository::new(state.pool()).delete(id).await?;
    tracing::info!(post_id = %id, "post deleted");
    Ok(Redirect::to(POSTS_PATH))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use techblog_core::CategoryId;

    use super::*;

    fn query(sort: AdminSort, direction: SortDirection) -> AdminPostQuery {
        AdminPostQuery {
            sort,
            direction,
            ..AdminPostQuery::default()
        }
    }

    #[test]
    fn test_query_parsing() {
        let raw = AdminPostsQuery {
            q: Some("  axum ".to_owned()),
            category: Some("2".to_owned()),
            status: Some("draft".to_owned()),
            sort: Some("title".to_owned()),
            dir: Some("asc".to_owned()),
        };
        let query = raw.to_query();
        assert_eq!(query.title.as_deref(), Some("axum"));
        assert_eq!(query.category_id, Some(CategoryId::new(2)));
        assert_eq!(query.status, Some(PostStatus::Draft));
        assert_eq!(query.sort, AdminSort::Title);
        assert_eq!(query.direction, SortDirection::Asc);

        let query = AdminPostsQuery::default().to_query();
        assert_eq!(query.sort, AdminSort::CreatedAt);
        assert_eq!(query.direction, SortDirection::Desc);
        assert!(query.status.is_none());
    }

    #[test]
    fn test_sort_header_flips_active_column() {
        let header = sort_header(&query(AdminSort::CreatedAt, SortDirection::Desc), AdminSort::CreatedAt);
        assert_eq!(header.href, "/admin/posts?sort=createdAt&dir=asc");
        assert_eq!(header.indicator, "↓");
    }

    #[test]
    fn test_sort_header_switching_columns_uses_defaults() {
        let current = query(AdminSort::CreatedAt, SortDirection::Asc);
        let title = sort_header(&current, AdminSort::Title);
        assert_eq!(title.href, "/admin/posts?sort=title&dir=asc");
        assert_eq!(title.indicator, "");

        let current = query(AdminSort::Title, SortDirection::Asc);
        let date = sort_header(&current, AdminSort::CreatedAt);
        assert_eq!(date.href, "/admin/posts?sort=createdAt&dir=desc");
    }

    #[test]
    fn test_sort_header_keeps_filters() {
        let current = AdminPostQuery {
            title: Some("a b".to_owned()),
            status: Some(PostStatus::Published),
            ..AdminPostQuery::default()
        };
        let header = sort_header(&current, AdminSort::Title);
        assert_eq!(header.href, "/admin/posts?q=a+b&status=published&sort=title&dir=asc");
    }

    #[test]
    fn test_form_into_draft() {
        let form = PostForm {
            title: "Title".to_owned(),
            content: "Body".to_owned(),
            excerpt: String::new(),
            tags: "rust, axum, rust".to_owned(),
            category_id: String::new(),
            published: Some("on".to_owned()),
        };
        assert!(form.is_complete());
        let draft = form.into_draft();
        assert!(draft.published);
        assert_eq!(draft.tags, vec!["rust", "axum"]);
        assert_eq!(draft.category_id, None);
    }

    #[test]
    fn test_form_requires_title_and_content() {
        let form = PostForm {
            title: "  ".to_owned(),
            content: "Body".to_owned(),
            ..PostForm::default()
        };
        assert!(!form.is_complete());
    }

    #[test]
    fn test_form_into_edit_clears_category() {
        let form = PostForm {
            title: "T".to_owned(),
            content: "C".to_owned(),
            ..PostForm::default()
        };
        let edit = form.into_edit();
        assert_eq!(edit.category_id, Some(None));
        assert_eq!(edit.published, Some(false));
        assert_eq!(edit.tags, Some(vec![]));
        assert_eq!(edit.thumbnail, None);
    }
}
